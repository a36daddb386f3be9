//! 规则编译器核心
//! 仅负责将原始规则描述编译为可执行的模糊匹配规则

use std::time::Instant;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::pattern::{FilterTemplate, FuzzyRule, MatchFilter};
use crate::config::GlobalConfig;
use crate::error::{FuzzyError, FuzzyResult};
use crate::rule::{FuzzyRuleConfig, RawRuleDescriptor, is_falsy};

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译完整规则文件，按配置顺序输出规则
    /// 缺少 fuzzy_lookup 的规则被静默跳过；正则/模板错误立即返回
    pub fn compile(rule_config: &FuzzyRuleConfig, config: &GlobalConfig) -> FuzzyResult<Vec<FuzzyRule>> {
        let start = Instant::now();
        let raw_rules = rule_config
            .rules
            .as_ref()
            .ok_or_else(|| FuzzyError::RuleLoadError("规则文件缺少 rules 列表".to_string()))?;

        let default_filter = Self::compile_templates(&config.default_filter)?;

        let mut stats = CompileStats::default();
        let mut rules = Vec::with_capacity(raw_rules.len());
        for (index, raw) in raw_rules.iter().enumerate() {
            match Self::compile_rule(raw, config, &default_filter) {
                Ok(Some(rule)) => {
                    stats.compiled += 1;
                    rules.push(rule);
                }
                Ok(None) => stats.skipped += 1,
                Err(e) => {
                    return Err(match e {
                        FuzzyError::RuleParseError(msg) => {
                            FuzzyError::RuleParseError(format!("第{}条规则：{}", index, msg))
                        }
                        other => other,
                    });
                }
            }
        }

        debug!("✅ 模糊规则编译完成，总耗时{:?}", start.elapsed());
        debug!("📊 编译统计：有效规则{}条、跳过{}条", stats.compiled, stats.skipped);

        Ok(rules)
    }

    /// 编译单条规则，未配置 fuzzy_lookup 时返回 None
    pub fn compile_rule(
        raw: &RawRuleDescriptor,
        config: &GlobalConfig,
        default_filter: &[FilterTemplate],
    ) -> FuzzyResult<Option<FuzzyRule>> {
        let Some(lookup) = raw.fuzzy_lookup.as_ref().filter(|v| !is_falsy(v)) else {
            return Ok(None);
        };

        let url_prefixes = Self::parse_url_prefixes(raw.url_prefix.as_ref())?;

        let rule = match lookup {
            Value::Object(map) => FuzzyRule {
                url_prefixes,
                pattern: Self::make_regex(map.get("match").unwrap_or(&Value::Null))?,
                replace_after: match map.get("replace") {
                    Some(v) => Self::expect_str(v, "replace")?.to_string(),
                    None => config.default_replace_after.clone(),
                },
                filter_templates: match map.get("filter") {
                    Some(v) => Self::compile_templates(&Self::string_list(v, "filter")?)?,
                    None => default_filter.to_vec(),
                },
                match_type: match map.get("type") {
                    Some(v) => Self::expect_str(v, "type")?.parse()?,
                    None => config.default_match_type,
                },
                match_filters: Self::init_match_filters(map.get("match_filters"))?,
            },
            other => FuzzyRule {
                url_prefixes,
                pattern: Self::make_regex(other)?,
                replace_after: config.default_replace_after.clone(),
                filter_templates: default_filter.to_vec(),
                match_type: config.default_match_type,
                match_filters: Vec::new(),
            },
        };

        Ok(Some(rule))
    }

    /// 将匹配描述编译为正则
    /// - 列表：查询参数名列表
    /// - 映射：`regex` 字符串 + `args` 参数名列表
    /// - 其他：按字面字符串编译
    pub fn make_regex(spec: &Value) -> FuzzyResult<Regex> {
        let pattern = match spec {
            Value::Array(_) => Self::make_query_match_regex(&Self::string_list(spec, "match")?),
            Value::Object(map) => Self::make_mapping_regex(map)?,
            other => Self::literal(other),
        };
        Ok(Regex::new(&pattern)?)
    }

    /// 参数名排序后逐个生成 `[?&](name=[^&]+)`，以 `.*` 连接
    pub fn make_query_match_regex(params: &[String]) -> String {
        let mut sorted: Vec<&String> = params.iter().collect();
        sorted.sort();
        sorted
            .into_iter()
            .map(|param| format!("[?&]({}=[^&]+)", regex::escape(param)))
            .collect::<Vec<_>>()
            .join(".*")
    }

    fn make_mapping_regex(map: &Map<String, Value>) -> FuzzyResult<String> {
        let mut pattern = match map.get("regex") {
            Some(v) => Self::literal(v),
            None => String::new(),
        };
        if let Some(args) = map.get("args") {
            pattern.push_str(&Self::make_query_match_regex(&Self::string_list(args, "args")?));
        }
        Ok(pattern)
    }

    /// url_prefix 可为单个字符串或字符串列表
    fn parse_url_prefixes(value: Option<&Value>) -> FuzzyResult<Vec<String>> {
        match value {
            Some(v) => Self::string_list(v, "url_prefix"),
            None => Err(FuzzyError::RuleParseError("缺少 url_prefix".to_string())),
        }
    }

    /// 编译结果过滤条件，每项的 match 预编译为正则
    fn init_match_filters(value: Option<&Value>) -> FuzzyResult<Vec<MatchFilter>> {
        let Some(value) = value.filter(|v| !is_falsy(v)) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(FuzzyError::RuleParseError("match_filters 必须是列表".to_string()));
        };

        let mut filters = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(map) = item else {
                return Err(FuzzyError::RuleParseError("match_filters 条目必须是映射".to_string()));
            };
            let pattern = map
                .get("match")
                .ok_or_else(|| FuzzyError::RuleParseError("match_filters 条目缺少 match".to_string()))?;
            let mime = match map.get("mime") {
                Some(v) if !v.is_null() => Some(Self::expect_str(v, "mime")?.to_string()),
                _ => None,
            };
            let not_ext = match map.get("not_ext") {
                Some(v) if !is_falsy(v) => Some(Self::string_list(v, "not_ext")?),
                _ => None,
            };
            filters.push(MatchFilter {
                mime,
                not_ext,
                pattern: Regex::new(&Self::literal(pattern))?,
            });
        }
        Ok(filters)
    }

    fn compile_templates(templates: &[String]) -> FuzzyResult<Vec<FilterTemplate>> {
        templates.iter().map(|t| FilterTemplate::parse(t)).collect()
    }

    /// 字符串或字符串列表 → Vec<String>
    fn string_list(value: &Value, field: &str) -> FuzzyResult<Vec<String>> {
        match value {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(arr) => arr
                .iter()
                .map(|item| Self::expect_str(item, field).map(str::to_string))
                .collect(),
            _ => Err(FuzzyError::RuleParseError(format!("{} 必须是字符串或字符串列表", field))),
        }
    }

    fn expect_str<'a>(value: &'a Value, field: &str) -> FuzzyResult<&'a str> {
        value
            .as_str()
            .ok_or_else(|| FuzzyError::RuleParseError(format!("{} 必须是字符串，实际为 {}", field, value)))
    }

    /// 非列表/映射的匹配描述按字面字符串处理
    ///
    /// 缺省（null）写作 `None`，布尔值写作 `True`/`False`，与既有规则文件的解释保持一致：
    /// 缺少 `match` 的规则只会匹配字面 `None`，不会变成兜底规则。
    fn literal(value: &Value) -> String {
        match value {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// 编译统计
#[derive(Debug, Default)]
struct CompileStats {
    compiled: usize,
    skipped: usize,
}
