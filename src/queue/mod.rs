// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 定义工作队列契约（至少一次投递、可见性超时、死信）及其
/// 进程内实现，以及按目标节奏入队检查任务的调度器。
pub mod memory_queue;
pub mod scheduler;
pub mod work_queue;
