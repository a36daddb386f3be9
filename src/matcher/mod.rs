//! 匹配模块：规则选择、替代查询构造、惰性回退与结果过滤
pub mod source;
pub mod rule_set;
pub mod filter;
pub mod fallback;
pub mod global;

// 导出核心接口
pub use self::source::{CdxEntry, IndexSource, QueryParams, SourceError, IS_FUZZY};
pub use self::rule_set::{MatchResult, RuleSet, FUZZY_SKIP_PARAMS};
pub use self::filter::FuzzyResultFilter;
pub use self::fallback::{FallbackMatcher, FuzzyIter};
pub use self::global::{init_fuzzy_matcher, init_fuzzy_matcher_with_config, get_global_matcher};
