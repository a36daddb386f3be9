//! 规则加载管理器
//! 负责从本地 JSON 文件或内存值加载规则文件，并编译为规则集

use std::path::Path;
use serde_json::Value;
use tracing::{debug, warn};

use super::model::FuzzyRuleConfig;
use crate::config::GlobalConfig;
use crate::error::{FuzzyError, FuzzyResult};
use crate::matcher::RuleSet;

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 按配置中的路径加载规则集
    pub fn load(config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        Self::load_from_path(&config.rules_path, config)
    }

    /// 从指定文件加载规则集
    pub fn load_from_path(path: &Path, config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        debug!("开始加载模糊规则文件：{}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            warn!("读取规则文件失败：{}，错误：{}", path.display(), e);
            FuzzyError::RuleLoadError(format!("{}：{}", path.display(), e))
        })?;
        Self::from_json_str(&content, config)
    }

    /// 异步读取规则文件（仅 IO 异步，编译仍为同步）
    #[cfg(feature = "async-io")]
    pub async fn load_async(config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        let path = &config.rules_path;
        debug!("开始异步加载模糊规则文件：{}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FuzzyError::RuleLoadError(format!("{}：{}", path.display(), e)))?;
        Self::from_json_str(&content, config)
    }

    /// 从 JSON 文本加载规则集
    pub fn from_json_str(content: &str, config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        let rule_config: FuzzyRuleConfig = serde_json::from_str(content)?;
        Self::from_rule_config(&rule_config, config)
    }

    /// 从已解析的配置值加载规则集
    pub fn from_value(value: Value, config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        let rule_config: FuzzyRuleConfig = serde_json::from_value(value)?;
        Self::from_rule_config(&rule_config, config)
    }

    fn from_rule_config(rule_config: &FuzzyRuleConfig, config: &GlobalConfig) -> FuzzyResult<RuleSet> {
        let total = rule_config.rules.as_ref().map_or(0, Vec::len);
        let rule_set = RuleSet::from_config(rule_config, config)?;
        debug!("模糊规则加载完成：有效{}条 / 共{}条", rule_set.len(), total);
        if config.verbose {
            for (index, rule) in rule_set.rules().iter().enumerate() {
                debug!("  #{} {}", index, rule.describe());
            }
        }
        Ok(rule_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use serde_json::json;
    use std::path::PathBuf;

    const RULES_JSON: &str = r#"{
        "rules": [
            {"url_prefix": "com,example)/", "fuzzy_lookup": ["foo"]},
            {"url_prefix": "com,skipped)/"},
            {"url_prefix": ["com,a)/", "com,b)/"], "fuzzy_lookup": {"match": "(.*)", "type": "domain"}}
        ]
    }"#;

    fn temp_rules_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cdx_fuzzy_{}_{}.json", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_from_json_str() {
        let rules = RuleLoader::from_json_str(RULES_JSON, &GlobalConfig::default()).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[1].url_prefixes.len(), 2);
    }

    #[test]
    fn test_from_value() {
        let rules = RuleLoader::from_value(
            json!({"rules": [{"url_prefix": "com,x)/", "fuzzy_lookup": "(.*)"}]}),
            &GlobalConfig::default(),
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_load_from_configured_path() {
        let path = temp_rules_file("load", RULES_JSON);
        let config = ConfigManager::custom().rules_path(path.clone()).verbose(true).build();

        let rules = RuleLoader::load(&config).unwrap();
        assert_eq!(rules.len(), 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        let config = ConfigManager::custom()
            .rules_path(PathBuf::from("/nonexistent/cdx_fuzzy_rules.json"))
            .build();
        assert!(matches!(RuleLoader::load(&config), Err(FuzzyError::RuleLoadError(_))));

        let err = RuleLoader::from_json_str("{not json", &GlobalConfig::default()).unwrap_err();
        assert!(matches!(err, FuzzyError::JsonError(_)));
    }

    #[cfg(feature = "async-io")]
    #[tokio::test]
    async fn test_load_async() {
        let path = temp_rules_file("async", RULES_JSON);
        let config = ConfigManager::custom().rules_path(path.clone()).build();

        let rules = RuleLoader::load_async(&config).await.unwrap();
        assert_eq!(rules.len(), 2);
        std::fs::remove_file(path).unwrap();
    }
}
