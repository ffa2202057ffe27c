// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、队列、抓取、调度与指标等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 队列配置
    pub queue: QueueSettings,
    /// 抓取配置
    pub fetch: FetchSettings,
    /// 调度配置
    pub scheduler: SchedulerSettings,
    /// 工作器配置
    pub workers: WorkerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 目标引导文件配置
    #[serde(default)]
    pub targets: TargetsSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 队列配置设置
#[derive(Debug, Deserialize)]
pub struct QueueSettings {
    /// 可见性超时（秒）
    pub visibility_timeout_secs: u64,
    /// 最大尝试次数
    pub max_attempts: u32,
}

/// 抓取配置设置
#[derive(Debug, Deserialize)]
pub struct FetchSettings {
    /// 单次抓取超时（秒）
    pub timeout_secs: u64,
    /// 浏览器会话池上限
    pub browser_max_sessions: usize,
}

/// 调度配置设置
#[derive(Debug, Deserialize)]
pub struct SchedulerSettings {
    /// 调度节拍间隔（秒）
    pub tick_secs: u64,
}

/// 工作器配置设置
#[derive(Debug, Deserialize)]
pub struct WorkerSettings {
    /// 检查工作器数量
    pub count: usize,
}

/// 指标配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus指标端点
    pub enabled: bool,
    /// 指标端点监听地址
    pub listen_addr: String,
}

/// 目标引导文件配置设置
#[derive(Debug, Deserialize, Default)]
pub struct TargetsSettings {
    /// 启动时注册目标的YAML文件路径
    pub file: Option<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("queue.visibility_timeout_secs", 120)?
            .set_default("queue.max_attempts", 5)?
            .set_default("fetch.timeout_secs", 30)?
            .set_default("fetch.browser_max_sessions", 4)?
            .set_default("scheduler.tick_secs", 10)?
            .set_default("workers.count", 4)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9090")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("MONITRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
