//! 编译模块：将原始规则描述编译为可执行的模糊匹配规则
pub mod pattern;
pub mod compiler;

pub use self::pattern::{FilterTemplate, FuzzyRule, MatchFilter};
pub use self::compiler::RuleCompiler;
