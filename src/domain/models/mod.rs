// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 监控目标（target）：被监控的页面或接口及其提取规则
/// - 快照（snapshot）：目标最近一次观测到并指纹化的字段状态
/// - 检查任务（check_task）：队列中的临时工作单元
/// - 运行记录（run_record）：逐次检查尝试的审计记录
/// - 变更（change）：变更检测结果与通知摘要
///
/// 这些模型构成了系统的数据基础，定义了业务概念的
/// 结构和行为，是领域驱动设计的核心组成部分。
pub mod change;
pub mod channel;
pub mod check_task;
pub mod field_value;
pub mod run_record;
pub mod snapshot;
pub mod target;
