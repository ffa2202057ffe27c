// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取引擎模块
///
/// 两条可互换的抓取路径实现统一的`FetchStrategy`接口：
/// - 直连HTTP（http_strategy）：快速、低开销，支持请求身份轮换
/// - 浏览器渲染（browser_strategy）：完整渲染与隐身对抗
///
/// 路由器按目标的规避档位做纯函数式选择。
pub mod browser_strategy;
pub mod http_strategy;
pub mod router;
pub mod traits;
