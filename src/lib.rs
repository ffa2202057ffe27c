// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含管理面命令服务和数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和声明式目标引导
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 实现直连HTTP与浏览器渲染两种抓取策略
pub mod engines;

/// 基础设施模块
///
/// 提供内存态适配器与指标导出等外部集成
pub mod infrastructure;

/// 通知模块
///
/// 将变更摘要扇出到配置的通知渠道
pub mod notify;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和错误映射
pub mod presentation;

/// 队列模块
///
/// 实现工作队列和周期调度功能
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现后台检查流水线和工作器管理
pub mod workers;
