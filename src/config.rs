//! 全局配置管理,存储规则加载与编译的默认值

use std::path::PathBuf;

use crate::rule::MatchType;

/// 规则未声明 `filter` 时的默认过滤模板：要求新 urlkey 不等于捕获内容
pub const DEFAULT_FILTER: &str = "~urlkey:{0}";
/// 规则未声明 `replace` 时的默认截断标记
pub const DEFAULT_REPLACE_AFTER: &str = "?";

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 规则文件路径（JSON，顶层含 rules 列表）
    pub rules_path: PathBuf,
    // 默认过滤模板
    pub default_filter: Vec<String>,
    // 默认匹配类型
    pub default_match_type: MatchType,
    // 默认截断标记
    pub default_replace_after: String,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("fuzzy_rules.json"),
            default_filter: vec![DEFAULT_FILTER.to_string()],
            default_match_type: MatchType::Prefix,
            default_replace_after: DEFAULT_REPLACE_AFTER.to_string(),
            verbose: false,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl Default for CustomConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn rules_path(mut self, path: PathBuf) -> Self {
        self.config.rules_path = path;
        self
    }

    pub fn default_filter(mut self, filter: Vec<String>) -> Self {
        self.config.default_filter = filter;
        self
    }

    pub fn default_match_type(mut self, match_type: MatchType) -> Self {
        self.config.default_match_type = match_type;
        self
    }

    pub fn default_replace_after(mut self, marker: String) -> Self {
        self.config.default_replace_after = marker;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
