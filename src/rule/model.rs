//! 规则数据模型定义
//! 仅存储原始规则数据，无任何业务逻辑，支持序列化/反序列化

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FuzzyError;

/// 替代查询的匹配类型（对应 CDX 查询参数 matchType）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Prefix,
    Host,
    Domain,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Prefix => "prefix",
            MatchType::Host => "host",
            MatchType::Domain => "domain",
        }
    }
}

impl FromStr for MatchType {
    type Err = FuzzyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchType::Exact),
            "prefix" => Ok(MatchType::Prefix),
            "host" => Ok(MatchType::Host),
            "domain" => Ok(MatchType::Domain),
            other => Err(FuzzyError::RuleParseError(format!("不支持的匹配类型：{}", other))),
        }
    }
}

// ======== 为 MatchType 实现 Display trait（用于日志 / CLI 输出） ========
impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 原始规则描述（从 JSON 规则文件解析）
/// `url_prefix` 可为字符串或字符串列表；`fuzzy_lookup` 可为字符串、参数名列表或映射
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRuleDescriptor {
    #[serde(default)]
    pub url_prefix: Option<Value>,
    #[serde(default)]
    pub fuzzy_lookup: Option<Value>,
}

/// 完整规则文件
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FuzzyRuleConfig {
    #[serde(default)]
    pub rules: Option<Vec<RawRuleDescriptor>>,
}

/// 判断配置值是否为"假值"（null / false / 0 / 空串 / 空列表 / 空映射）
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
