//! 全局模糊匹配器单例管理
use once_cell::sync::OnceCell;

use super::fallback::FallbackMatcher;
use crate::config::{ConfigManager, GlobalConfig};
use crate::error::{FuzzyError, FuzzyResult};

/// 全局匹配器实例
static GLOBAL_MATCHER: OnceCell<FallbackMatcher> = OnceCell::new();

/// 初始化全局匹配器（默认配置）
pub fn init_fuzzy_matcher() -> FuzzyResult<()> {
    init_fuzzy_matcher_with_config(&ConfigManager::get_default())
}

/// 带自定义配置初始化全局匹配器，重复初始化时保留第一次的实例
pub fn init_fuzzy_matcher_with_config(config: &GlobalConfig) -> FuzzyResult<()> {
    GLOBAL_MATCHER
        .get_or_try_init(|| FallbackMatcher::from_config(config))
        .map(|_| ())
}

/// 获取全局匹配器
pub fn get_global_matcher() -> FuzzyResult<&'static FallbackMatcher> {
    GLOBAL_MATCHER.get().ok_or(FuzzyError::MatcherNotInitialized)
}
