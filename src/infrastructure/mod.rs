// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 提供领域接口的具体实现与可观测性集成：
/// - 仓库实现（repositories）：状态存储与目标仓库的进程内适配器
/// - 指标（metrics）：Prometheus导出器初始化
pub mod metrics;
pub mod repositories;
