//! 规则集：按配置顺序保存模糊规则，负责规则选择与替代查询构造

use std::borrow::Cow;
use serde_json::Value;
use tracing::debug;

use super::source::{IS_FUZZY, QueryParams};
use crate::compiler::{FuzzyRule, RuleCompiler};
use crate::config::GlobalConfig;
use crate::error::{FuzzyError, FuzzyResult};
use crate::rule::{FuzzyRuleConfig, MatchType};
use crate::utils::UrlHelper;

/// 替代查询不继承的原始参数（查询机制相关，由新值替换）
pub const FUZZY_SKIP_PARAMS: [&str; 7] = [
    "alt_url", "reverse", "closest", "end_key", "url", "matchType", "filter",
];

/// 未参与匹配的捕获组代入模板时的文本
const UNMATCHED_GROUP: &str = "None";

/// 单次查询的匹配结果：命中的规则 + 新的查询参数
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub rule: &'a FuzzyRule,
    pub alt_params: QueryParams,
}

/// 模糊规则集（加载后只读，可跨线程共享）
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FuzzyRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<FuzzyRule>) -> Self {
        Self { rules }
    }

    /// 从规则文件内容编译规则集
    pub fn from_config(rule_config: &FuzzyRuleConfig, config: &GlobalConfig) -> FuzzyResult<Self> {
        Ok(Self::new(RuleCompiler::compile(rule_config, config)?))
    }

    pub fn rules(&self) -> &[FuzzyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按顺序查找第一条前缀与正则均命中的规则，返回规则与各捕获组内容
    /// 未参与匹配的捕获组以字面 `None` 表示
    pub fn find_rule<'a>(&self, urlkey: &'a str) -> Option<(&FuzzyRule, Vec<&'a str>)> {
        self.rules.iter().find_map(|rule| {
            if !rule.matches_prefix(urlkey) {
                return None;
            }
            let caps = rule.pattern.captures(urlkey)?;
            let groups = caps
                .iter()
                .skip(1)
                .map(|group| group.map_or(UNMATCHED_GROUP, |m| m.as_str()))
                .collect();
            Some((rule, groups))
        })
    }

    /// 选择规则并构造替代查询参数，无规则命中时返回 None
    pub fn find_and_build(&self, params: &QueryParams) -> FuzzyResult<Option<MatchResult<'_>>> {
        let urlkey = Self::decode_key(params)?;

        let Some((rule, groups)) = self.find_rule(&urlkey) else {
            debug!("无模糊规则命中：{}", urlkey);
            return Ok(None);
        };

        // 每个捕获组依次套用所有模板（组优先顺序）
        let templates = &rule.filter_templates;
        let filters: Vec<Value> = groups
            .iter()
            .flat_map(|group| {
                templates
                    .iter()
                    .map(move |template| Value::String(template.render(group)))
            })
            .collect();

        let url = params
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| FuzzyError::InvalidInput("查询参数缺少 url".to_string()))?;

        let url = UrlHelper::truncate_after(url, &rule.replace_after);
        let url = match rule.match_type {
            MatchType::Domain => UrlHelper::parent_domain(url)?,
            _ => url.to_string(),
        };

        debug!("模糊规则命中：key={} rule=[{}] url={}", urlkey, rule.describe(), url);

        let mut alt_params = QueryParams::new();
        alt_params.insert("url".to_string(), Value::String(url));
        alt_params.insert("matchType".to_string(), Value::String(rule.match_type.as_str().to_string()));
        alt_params.insert("filter".to_string(), Value::Array(filters));
        alt_params.insert(IS_FUZZY.to_string(), Value::Bool(true));

        for (key, value) in params {
            if !FUZZY_SKIP_PARAMS.contains(&key.as_str()) {
                alt_params.insert(key.clone(), value.clone());
            }
        }

        Ok(Some(MatchResult { rule, alt_params }))
    }

    /// 查询 key 可为字符串或 UTF-8 字节数组
    fn decode_key(params: &QueryParams) -> FuzzyResult<Cow<'_, str>> {
        match params.get("key") {
            Some(Value::String(s)) => Ok(Cow::Borrowed(s.as_str())),
            Some(Value::Array(bytes)) => {
                let bytes = bytes
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| FuzzyError::InvalidInput("查询参数 key 不是有效字节数组".to_string()))?;
                Ok(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()))
            }
            _ => Err(FuzzyError::InvalidInput("查询参数缺少 key".to_string())),
        }
    }
}
