//! cdx-fuzzy - CDX 索引模糊回退匹配
//!
//! 精确 URL key 查询无结果时，按站点规则构造替代查询，并对替代查询结果做
//! MIME / 扩展名过滤后标记 `is_fuzzy` 返回。

// 导出全局错误类型
pub use self::error::{FuzzyError, FuzzyResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{FuzzyRuleConfig, RawRuleDescriptor, MatchType, RuleLoader};

// 导出编译模块核心接口
pub use self::compiler::{FuzzyRule, FilterTemplate, MatchFilter, RuleCompiler};

// 导出匹配模块核心接口
pub use self::matcher::{
    CdxEntry,
    IndexSource,
    QueryParams,
    SourceError,
    RuleSet,
    MatchResult,
    FallbackMatcher,
    FuzzyIter,
    FuzzyResultFilter,
    init_fuzzy_matcher,
    init_fuzzy_matcher_with_config,
    get_global_matcher,
};

// 导出工具模块核心接口
pub use self::utils::UrlHelper;

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod compiler;
pub mod matcher;
pub mod utils;
