// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::ChannelConfig;
use crate::domain::models::field_value::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// 监控目标实体
///
/// 表示一个被监控的页面或接口：来源地址、提取规则、
/// 轮询周期与反爬规避档位。目标只由管理命令创建和修改，
/// Worker 执行过程中只会通过仓库接口更新调度元数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// 目标唯一标识符
    pub id: Uuid,
    /// 目标名称，用于日志与通知摘要
    pub name: String,
    /// 来源地址
    pub url: String,
    /// 提取规则集，按声明顺序求值
    pub rules: Vec<FieldRule>,
    /// 规则集修订号，规则变更时递增以强制重新建立快照基线
    pub rules_revision: u32,
    /// 反爬规避档位
    pub evasion: EvasionProfile,
    /// 轮询间隔
    #[serde(with = "poll_interval_secs")]
    pub poll_interval: Duration,
    /// 是否启用
    pub active: bool,
    /// 通知渠道配置
    pub channels: Vec<ChannelConfig>,
    /// 下次检查时间，每次运行后由调度器重算
    pub next_check_at: DateTime<Utc>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Target {
    /// 创建新目标，下次检查时间立即到期以便首次基线尽快建立
    pub fn new(
        name: String,
        url: String,
        rules: Vec<FieldRule>,
        evasion: EvasionProfile,
        poll_interval: Duration,
        channels: Vec<ChannelConfig>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            url,
            rules,
            rules_revision: 0,
            evasion,
            poll_interval,
            active: true,
            channels,
            next_check_at: now,
            created_at: now,
        }
    }
}

/// 字段提取规则
///
/// 规则之间相互独立、无副作用，后序规则不能引用前序规则的
/// 提取结果。这保证了求值顺序确定且可并行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// 字段名
    pub name: String,
    /// 选择器
    pub selector: SelectorKind,
    /// 类型提示，决定提取后的类型转换
    #[serde(default)]
    pub value_type: FieldType,
    /// 是否必需字段，必需字段未命中且无默认值时整次提取失败
    #[serde(default)]
    pub required: bool,
    /// 未命中时的默认值
    #[serde(default)]
    pub default: Option<FieldValue>,
}

/// 选择器类型
///
/// 封闭的标签变体：每种路径语言一个分支，统一通过提取服务
/// 多态求值，不做运行时字符串分发。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorKind {
    /// CSS选择器，作用于HTML文档
    Css {
        selector: String,
        /// 为None时提取元素文本，否则提取指定属性
        #[serde(default)]
        attr: Option<String>,
    },
    /// JSON Pointer路径（RFC 6901），作用于JSON响应体
    JsonPath { pointer: String },
}

/// 字段类型提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 文本，不做转换
    #[default]
    Text,
    /// 数值，剥离货币符号与千分位后解析
    Number,
    /// 日期，RFC3339优先，回退常见日期格式
    Date,
    /// 布尔值
    Boolean,
}

/// 反爬规避档位
///
/// 抓取策略选择是该档位的纯函数，与运行时启发无关，
/// 保证同一目标的抓取路径可复现。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvasionProfile {
    /// 直连HTTP抓取
    #[default]
    None,
    /// HTTP抓取 + 请求身份轮换
    RotateIdentity,
    /// 完整浏览器渲染 + 隐身对抗
    BrowserRender,
}

impl EvasionProfile {
    /// 升级到下一档位，用于Blocked重试时的规避升级
    ///
    /// 已是最高档位时保持不变。
    pub fn escalate(self) -> Self {
        match self {
            EvasionProfile::None => EvasionProfile::RotateIdentity,
            EvasionProfile::RotateIdentity => EvasionProfile::BrowserRender,
            EvasionProfile::BrowserRender => EvasionProfile::BrowserRender,
        }
    }
}

impl fmt::Display for EvasionProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvasionProfile::None => write!(f, "none"),
            EvasionProfile::RotateIdentity => write!(f, "rotate_identity"),
            EvasionProfile::BrowserRender => write!(f, "browser_render"),
        }
    }
}

impl FromStr for EvasionProfile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(EvasionProfile::None),
            "rotate_identity" => Ok(EvasionProfile::RotateIdentity),
            "browser_render" => Ok(EvasionProfile::BrowserRender),
            _ => Err(()),
        }
    }
}

mod poll_interval_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_is_monotonic_and_capped() {
        assert_eq!(
            EvasionProfile::None.escalate(),
            EvasionProfile::RotateIdentity
        );
        assert_eq!(
            EvasionProfile::RotateIdentity.escalate(),
            EvasionProfile::BrowserRender
        );
        assert_eq!(
            EvasionProfile::BrowserRender.escalate(),
            EvasionProfile::BrowserRender
        );
    }

    #[test]
    fn test_new_target_is_immediately_due() {
        let target = Target::new(
            "example".into(),
            "https://example.com".into(),
            vec![],
            EvasionProfile::None,
            Duration::from_secs(300),
            vec![],
        );
        assert!(target.active);
        assert!(target.next_check_at <= Utc::now());
        assert_eq!(target.rules_revision, 0);
    }

    #[test]
    fn test_selector_kind_round_trips_as_tagged_variant() {
        let rule = FieldRule {
            name: "price".into(),
            selector: SelectorKind::Css {
                selector: ".price".into(),
                attr: None,
            },
            value_type: FieldType::Number,
            required: true,
            default: None,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["selector"]["kind"], "css");
        let back: FieldRule = serde_json::from_value(json).unwrap();
        assert!(matches!(back.selector, SelectorKind::Css { .. }));
    }
}
