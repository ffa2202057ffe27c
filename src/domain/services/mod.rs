// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了复杂的
/// 业务规则和领域逻辑，协调多个领域对象来完成业务操作。
///
/// 包含的服务：
/// - 提取服务（extraction_service）：按规则集从原始内容提取结构化字段
/// - 指纹（fingerprint）：规范化字段映射的稳定哈希
/// - 变更检测器（change_detector）：新字段映射与当前快照的指纹比对
pub mod change_detector;
pub mod extraction_service;
pub mod fingerprint;
