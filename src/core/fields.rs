//! Typed accessors over a free-form [`ModuleConfig`].
//!
//! Values come from the CLI as JSON or plain strings, so numeric fields accept
//! both `5` and `"5"`.

use crate::domain::model::ModuleConfig;
use serde_json::Value;

/// 非空白字串欄位
pub fn text<'a>(config: &'a ModuleConfig, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub fn text_or<'a>(config: &'a ModuleConfig, key: &str, default: &'a str) -> &'a str {
    text(config, key).unwrap_or(default)
}

pub fn number(config: &ModuleConfig, key: &str) -> Option<f64> {
    match config.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 缺少、為零或無法解析時使用預設值
pub fn positive_or(config: &ModuleConfig, key: &str, default: f64) -> f64 {
    number(config, key)
        .filter(|n| *n != 0.0 && n.is_finite())
        .unwrap_or(default)
}

pub fn flag(config: &ModuleConfig, key: &str) -> Option<bool> {
    match config.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 預設為 true 的開關，只有明確設為 false 才關閉
pub fn enabled_unless_false(config: &ModuleConfig, key: &str) -> bool {
    flag(config, key) != Some(false)
}

pub fn is_set(config: &ModuleConfig, key: &str) -> bool {
    match config.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

pub fn string_list(config: &ModuleConfig, key: &str) -> Vec<String> {
    match config.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
