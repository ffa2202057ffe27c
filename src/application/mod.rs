// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层模块
///
/// 管理面命令服务与数据传输对象
pub mod commands;
pub mod dto;
