use crate::domain::models::field_value::FieldValue;
use crate::domain::models::snapshot::FieldMapping;
use crate::domain::models::target::{FieldRule, FieldType, SelectorKind};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

/// 提取错误类型
///
/// 提取失败立即上抛且不自动重试：失效的选择器不会自愈，
/// 需要管理员修正规则或确认源站布局变更。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// 必需字段未命中且未配置默认值
    #[error("required field '{rule}' matched nothing: {reason}")]
    MissingRequiredField { rule: String, reason: String },

    /// 类型转换失败，与"未命中"严格区分
    #[error("field '{rule}' could not be coerced from '{raw}'")]
    TypeMismatch { rule: String, raw: String },
}

// 首个数值片段，容忍千分位与欧式小数（"1.234,56 €"、"19.99"）
static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|-?\d+(?:[.,]\d+)?").unwrap());

/// 提取服务
///
/// 对原始响应内容按声明顺序求值规则集，产出规范化字段映射。
/// 规则相互独立、无副作用：可选规则未命中解析为Null，
/// 必需规则未命中使整次提取失败。
pub struct ExtractionService;

impl ExtractionService {
    /// 提取数据
    ///
    /// 内容按类型嗅探一次性解析：JSON指针规则作用于解析后的
    /// JSON文档，CSS规则作用于HTML文档。CSS规则遇到非HTML
    /// 内容按未命中处理，不会失败。
    pub fn extract(
        content: &str,
        content_type: &str,
        rules: &[FieldRule],
    ) -> Result<FieldMapping, ExtractionError> {
        let json_doc = Self::sniff_json(content, content_type);
        // scraper 对任意文本都能容错解析，JSON 内容则跳过 HTML 解析
        let html_doc = if json_doc.is_none() {
            Some(Html::parse_document(content))
        } else {
            None
        };

        let mut fields = FieldMapping::new();
        for rule in rules {
            let raw = match &rule.selector {
                SelectorKind::Css { selector, attr } => {
                    Self::select_css(html_doc.as_ref(), rule, selector, attr.as_deref())?
                }
                SelectorKind::JsonPath { pointer } => {
                    Self::select_pointer(json_doc.as_ref(), pointer)
                }
            };

            let value = match raw {
                Some(raw) => Self::coerce(&rule.name, &raw, rule.value_type)?,
                None => match &rule.default {
                    Some(default) => default.clone(),
                    None if rule.required => {
                        return Err(ExtractionError::MissingRequiredField {
                            rule: rule.name.clone(),
                            reason: "selector matched no content".to_string(),
                        })
                    }
                    None => FieldValue::Null,
                },
            };
            fields.insert(rule.name.clone(), value);
        }
        Ok(fields)
    }

    fn sniff_json(content: &str, content_type: &str) -> Option<serde_json::Value> {
        let trimmed = content.trim_start();
        if content_type.contains("json") || trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(content).ok()
        } else {
            None
        }
    }

    fn select_css(
        doc: Option<&Html>,
        rule: &FieldRule,
        selector: &str,
        attr: Option<&str>,
    ) -> Result<Option<String>, ExtractionError> {
        let parsed = Selector::parse(selector).map_err(|e| {
            // 无法解析的选择器等同于永远未命中，必需字段据此直接失败
            ExtractionError::MissingRequiredField {
                rule: rule.name.clone(),
                reason: format!("invalid css selector: {}", e),
            }
        });
        let parsed = match parsed {
            Ok(p) => p,
            Err(e) if rule.required && rule.default.is_none() => return Err(e),
            Err(_) => return Ok(None),
        };

        let doc = match doc {
            Some(d) => d,
            None => return Ok(None),
        };

        let value = doc.select(&parsed).next().and_then(|element| match attr {
            Some(attr) => element.value().attr(attr).map(|s| s.to_string()),
            None => {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let cleaned = Self::clean(&text);
                (!cleaned.is_empty()).then_some(cleaned)
            }
        });
        Ok(value)
    }

    fn select_pointer(doc: Option<&serde_json::Value>, pointer: &str) -> Option<String> {
        match doc?.pointer(pointer)? {
            serde_json::Value::String(s) => {
                let cleaned = Self::clean(s);
                (!cleaned.is_empty()).then_some(cleaned)
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            // JSON null 等同于未命中，由默认值/可选性决定后续
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// 按类型提示转换原始字符串
    fn coerce(rule: &str, raw: &str, value_type: FieldType) -> Result<FieldValue, ExtractionError> {
        let mismatch = || ExtractionError::TypeMismatch {
            rule: rule.to_string(),
            raw: raw.to_string(),
        };

        match value_type {
            FieldType::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldType::Number => Self::parse_number(raw)
                .map(FieldValue::Number)
                .ok_or_else(mismatch),
            FieldType::Date => Self::parse_date(raw)
                .map(FieldValue::Date)
                .ok_or_else(mismatch),
            FieldType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(FieldValue::Bool(true)),
                "false" | "no" | "0" => Ok(FieldValue::Bool(false)),
                _ => Err(mismatch()),
            },
        }
    }

    /// 解析属性串中的数值
    ///
    /// 源站属性值形如"860 €"、"78 m²"、"1.234,56"，需要剥离
    /// 单位与千分位后再判定小数分隔符。
    fn parse_number(raw: &str) -> Option<f64> {
        let token = NUMBER_TOKEN.find(raw)?.as_str();

        let last_dot = token.rfind('.');
        let last_comma = token.rfind(',');
        let normalized = match (last_dot, last_comma) {
            (Some(d), Some(c)) => {
                // 同时出现时，后出现者是小数分隔符
                if d > c {
                    token.replace(',', "")
                } else {
                    token.replace('.', "").replace(',', ".")
                }
            }
            (None, Some(c)) => {
                // 仅逗号：后随三位视为千分位（"1,234"），否则为小数
                if token.len() - c == 4 && token[..c].len() <= 3 {
                    token.replace(',', "")
                } else {
                    token.replace(',', ".")
                }
            }
            (Some(d), None) => {
                // 仅句点：德式千分位（"1.234 €"）后随恰好三位
                if token.matches('.').count() > 1
                    || (token.len() - d == 4 && token[..d].len() <= 3)
                {
                    token.replace('.', "")
                } else {
                    token.to_string()
                }
            }
            _ => token.to_string(),
        };
        normalized.parse().ok()
    }

    fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
            }
        }
        None
    }

    fn clean(s: &str) -> String {
        s.replace('\u{a0}', " ").trim().to_string()
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
