// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 后台任务处理核心：检查工作器走完抓取到提交的整条
/// 流水线，管理器负责工作器池的启动与关闭
pub mod check_worker;
pub mod manager;
pub mod worker;
