// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 领域层仓库接口的进程内实现。生产部署可替换为任何满足
/// 条件写入契约的文档存储适配器。
pub mod memory_state_store;
pub mod memory_target_repo;
