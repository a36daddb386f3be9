//! 规则模块：负责规则文件的加载与原始数据模型定义
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{FuzzyRuleConfig, MatchType, RawRuleDescriptor, is_falsy};
pub use self::loader::RuleLoader;
