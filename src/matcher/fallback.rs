//! 模糊回退匹配器：精确查询无结果时，按规则发起替代查询并过滤结果
use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, warn};

use super::filter::FuzzyResultFilter;
use super::rule_set::{MatchResult, RuleSet};
use super::source::{CdxEntry, IndexSource, QueryParams, SourceError};
use crate::compiler::FuzzyRule;
use crate::config::GlobalConfig;
use crate::error::FuzzyResult;
use crate::rule::RuleLoader;

/// 模糊回退匹配器
#[derive(Debug, Clone)]
pub struct FallbackMatcher {
    rules: Arc<RuleSet>,
}

impl FallbackMatcher {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// 按配置加载规则文件并创建匹配器
    pub fn from_config(config: &GlobalConfig) -> FuzzyResult<Self> {
        Ok(Self::new(Arc::new(RuleLoader::load(config)?)))
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// 核心查询接口
    ///
    /// 立即执行主查询，返回惰性结果序列与主查询错误列表。
    /// 序列先原样转发主查询结果；只有主查询一条结果都没有、且调用方继续拉取时，
    /// 才会选择规则并发起替代查询。替代查询的错误不会返回给调用方。
    pub fn query<'a, S>(&'a self, source: &'a S, params: QueryParams) -> (FuzzyIter<'a, S>, Vec<SourceError>)
    where
        S: IndexSource,
    {
        let (primary, errors) = source.lookup(&params);
        let iter = FuzzyIter {
            rules: &self.rules,
            source,
            params,
            phase: Phase::Primary { iter: primary, found: false },
        };
        (iter, errors)
    }
}

/// 惰性结果序列的阶段
enum Phase<'a, I> {
    /// 转发主查询结果
    Primary { iter: I, found: bool },
    /// 过滤并标记替代查询结果
    Fuzzy {
        iter: I,
        rule: &'a FuzzyRule,
        url: String,
        accepted: usize,
        rejected: usize,
    },
    Done,
}

/// 模糊回退结果序列
pub struct FuzzyIter<'a, S: IndexSource> {
    rules: &'a RuleSet,
    source: &'a S,
    params: QueryParams,
    phase: Phase<'a, S::Iter>,
}

impl<'a, S: IndexSource> FuzzyIter<'a, S> {
    /// 主查询为空：选择规则并发起替代查询
    fn start_fuzzy(&self) -> Phase<'a, S::Iter> {
        let rules: &'a RuleSet = self.rules;
        match rules.find_and_build(&self.params) {
            Ok(Some(MatchResult { rule, alt_params })) => {
                let url = self
                    .params
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                let alt = serde_json::Value::Object(alt_params.clone());
                debug!("主查询无结果，发起模糊查询：{}", alt);
                let (iter, errors) = self.source.lookup(&alt_params);
                if !errors.is_empty() {
                    // 替代查询的错误不向调用方返回
                    debug!("模糊查询返回{}条错误（不上报）：{:?}", errors.len(), errors);
                }

                Phase::Fuzzy {
                    iter,
                    rule,
                    url,
                    accepted: 0,
                    rejected: 0,
                }
            }
            Ok(None) => Phase::Done,
            Err(e) => {
                warn!("无法构造模糊查询：{}", e);
                Phase::Done
            }
        }
    }
}

impl<'a, S: IndexSource> Iterator for FuzzyIter<'a, S> {
    type Item = CdxEntry;

    fn next(&mut self) -> Option<CdxEntry> {
        loop {
            match &mut self.phase {
                Phase::Primary { iter, found } => {
                    if let Some(entry) = iter.next() {
                        *found = true;
                        return Some(entry);
                    }
                    if *found {
                        self.phase = Phase::Done;
                        return None;
                    }
                    self.phase = self.start_fuzzy();
                }
                Phase::Fuzzy { iter, rule, url, accepted, rejected } => match iter.next() {
                    Some(entry) => {
                        if FuzzyResultFilter::allow(rule, url, &entry) {
                            *accepted += 1;
                            return Some(entry.into_fuzzy());
                        }
                        *rejected += 1;
                    }
                    None => {
                        debug!("模糊查询结束：接受{}条，过滤{}条", accepted, rejected);
                        self.phase = Phase::Done;
                        return None;
                    }
                },
                Phase::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::FuzzyRuleConfig;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    fn matcher(doc: Value) -> FallbackMatcher {
        let rule_config: FuzzyRuleConfig = serde_json::from_value(doc).unwrap();
        let rules = RuleSet::from_config(&rule_config, &GlobalConfig::default()).unwrap();
        FallbackMatcher::new(Arc::new(rules))
    }

    fn example_matcher() -> FallbackMatcher {
        matcher(json!({"rules": [
            {"url_prefix": "com,example)/", "fuzzy_lookup": ["foo"]},
        ]}))
    }

    fn params(value: Value) -> QueryParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    fn entry(value: Value) -> CdxEntry {
        serde_json::from_value(value).unwrap()
    }

    fn example_params() -> QueryParams {
        params(json!({
            "key": "com,example)/?foo=bar&other=1",
            "url": "http://example.com/?foo=bar&other=1",
            "closest": "20200101000000",
            "limit": 5,
        }))
    }

    #[test]
    fn test_primary_results_skip_fallback() {
        let calls = Cell::new(0);
        let source = |_: &QueryParams| {
            calls.set(calls.get() + 1);
            (vec![entry(json!({"urlkey": "a"})), entry(json!({"urlkey": "b"}))], Vec::<SourceError>::new())
        };

        let fuzzy = example_matcher();
        let (iter, errors) = fuzzy.query(&source, example_params());
        let entries: Vec<CdxEntry> = iter.collect();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_fuzzy()));
        assert!(errors.is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_empty_primary_triggers_single_fuzzy_lookup() {
        let seen: RefCell<Vec<QueryParams>> = RefCell::new(Vec::new());
        let source = |p: &QueryParams| {
            seen.borrow_mut().push(p.clone());
            if p.contains_key("is_fuzzy") {
                (vec![entry(json!({"urlkey": "com,example)/?foo=bar", "mime": "text/html"}))], Vec::<SourceError>::new())
            } else {
                (Vec::<CdxEntry>::new(), Vec::<SourceError>::new())
            }
        };

        // 原查询带上全部七个不继承的参数
        let mut original = example_params();
        original.insert("alt_url".to_string(), json!("http://alt.example.com/"));
        original.insert("reverse".to_string(), json!(true));
        original.insert("end_key".to_string(), json!("com,example)/~"));
        original.insert("matchType".to_string(), json!("exact"));
        original.insert("filter".to_string(), json!(["=status:200"]));

        let fuzzy = example_matcher();
        let (iter, _) = fuzzy.query(&source, original);
        let entries: Vec<CdxEntry> = iter.collect();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_fuzzy());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["matchType"], json!("exact"));
        let alt = &seen[1];
        for skipped in ["alt_url", "reverse", "closest", "end_key"] {
            assert!(!alt.contains_key(skipped));
        }
        // matchType、filter、url 由规则重新生成，而非沿用原值
        assert_eq!(alt["is_fuzzy"], json!(true));
        assert_eq!(alt["filter"], json!(["~urlkey:foo=bar"]));
        assert_eq!(alt["matchType"], json!("prefix"));
        assert_eq!(alt["url"], json!("http://example.com/?"));
        assert_eq!(alt["limit"], json!(5));
    }

    #[test]
    fn test_no_rule_returns_empty_with_primary_errors() {
        let calls = Cell::new(0);
        let source = |_: &QueryParams| {
            calls.set(calls.get() + 1);
            (Vec::new(), vec![SourceError::new("primary", "timeout")])
        };

        let fuzzy = example_matcher();
        let query = params(json!({"key": "org,other)/?foo=1", "url": "http://other.org/?foo=1"}));
        let (iter, errors) = fuzzy.query(&source, query);

        assert_eq!(iter.count(), 0);
        assert_eq!(errors, vec![SourceError::new("primary", "timeout")]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unconsumed_iterator_never_calls_fallback() {
        let calls = Cell::new(0);
        let source = |_: &QueryParams| {
            calls.set(calls.get() + 1);
            (Vec::<CdxEntry>::new(), Vec::<SourceError>::new())
        };

        let fuzzy = example_matcher();
        let (iter, _) = fuzzy.query(&source, example_params());
        drop(iter);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_fuzzy_errors_are_not_surfaced() {
        let source = |p: &QueryParams| {
            if p.contains_key("is_fuzzy") {
                (
                    vec![entry(json!({"urlkey": "x", "mime": "text/html"}))],
                    vec![SourceError::new("fuzzy", "broken")],
                )
            } else {
                (Vec::new(), vec![SourceError::new("primary", "partial")])
            }
        };

        let fuzzy = example_matcher();
        let (iter, errors) = fuzzy.query(&source, example_params());
        assert_eq!(iter.count(), 1);
        assert_eq!(errors, vec![SourceError::new("primary", "partial")]);
    }

    #[test]
    fn test_fuzzy_results_are_filtered_by_match_filters() {
        let fuzzy = matcher(json!({"rules": [{
            "url_prefix": "com,example)/",
            "fuzzy_lookup": {
                "match": "(id=\\d+)",
                "match_filters": [{"mime": "image/*", "not_ext": ["html"], "match": ".*\\.jpg"}],
            },
        }]}));
        let source = |p: &QueryParams| {
            if p.contains_key("is_fuzzy") {
                (
                    vec![
                        entry(json!({"urlkey": "a", "mime": "image/jpeg"})),
                        entry(json!({"urlkey": "b"})),
                        entry(json!({"urlkey": "c", "mime": "text/html"})),
                    ],
                    Vec::<SourceError>::new(),
                )
            } else {
                (Vec::<CdxEntry>::new(), Vec::<SourceError>::new())
            }
        };

        // 原始 URL 扩展名为 jpg（不在黑名单），正则命中 → 有 MIME 的条目均接受
        let query = params(json!({"key": "com,example)/photo.jpg?id=1", "url": "http://example.com/photo.jpg?id=1"}));
        let (iter, _) = fuzzy.query(&source, query);
        let urlkeys: Vec<Value> = iter.map(|e| e.get("urlkey").cloned().unwrap_or(Value::Null)).collect();
        assert_eq!(urlkeys, vec![json!("a"), json!("c")]);

        // 原始 URL 扩展名为 html（在黑名单），且 MIME 条件不参与判断 → 全部拒绝
        let query = params(json!({"key": "com,example)/page.html?id=1", "url": "http://example.com/page.html?id=1"}));
        let (iter, _) = fuzzy.query(&source, query);
        assert_eq!(iter.count(), 0);
    }

    #[test]
    fn test_fuzzy_tagging_does_not_mutate_source_entries() {
        let stored = vec![entry(json!({"urlkey": "a", "mime": "text/html"}))];
        let source = |p: &QueryParams| {
            if p.contains_key("is_fuzzy") {
                (stored.clone(), Vec::<SourceError>::new())
            } else {
                (Vec::<CdxEntry>::new(), Vec::<SourceError>::new())
            }
        };

        let fuzzy = example_matcher();
        let (iter, _) = fuzzy.query(&source, example_params());
        let entries: Vec<CdxEntry> = iter.collect();
        assert!(entries[0].is_fuzzy());
        assert!(!stored[0].is_fuzzy());
    }

    #[test]
    fn test_invalid_params_end_sequence() {
        let calls = Cell::new(0);
        let source = |_: &QueryParams| {
            calls.set(calls.get() + 1);
            (Vec::<CdxEntry>::new(), Vec::<SourceError>::new())
        };

        let fuzzy = example_matcher();
        let (iter, _) = fuzzy.query(&source, params(json!({"url": "http://example.com/"})));
        assert_eq!(iter.count(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_matcher_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
        assert_send_sync::<FallbackMatcher>();
    }
}
