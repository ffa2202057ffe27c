// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 表现层模块
///
/// 薄HTTP外壳：路由、处理器与统一错误映射，
/// 全部业务语义都在命令服务之后
pub mod errors;
pub mod handlers;
pub mod routes;
