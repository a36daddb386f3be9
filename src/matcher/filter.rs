//! 模糊结果过滤：按规则的 match_filters 判断替代查询结果是否可接受

use crate::compiler::FuzzyRule;
use crate::utils::UrlHelper;

use super::source::CdxEntry;

/// 模糊结果过滤器
pub struct FuzzyResultFilter;

impl FuzzyResultFilter {
    /// 判断替代查询返回的条目是否可接受
    ///
    /// # 参数
    /// - `rule`: 命中的模糊规则
    /// - `url`: 原始查询 URL（非改写后的 URL）
    /// - `entry`: 替代查询返回的条目
    ///
    /// # 判定顺序
    /// 1. 规则无过滤条件 → 接受
    /// 2. 条目缺少 MIME → 拒绝
    /// 3. 第一条适用的过滤条件，以其正则在原始 URL 上的搜索结果为最终结论
    /// 4. 无适用条件 → 拒绝
    pub fn allow(rule: &FuzzyRule, url: &str, entry: &CdxEntry) -> bool {
        if rule.match_filters.is_empty() {
            return true;
        }

        let Some(mime) = entry.mime() else {
            return false;
        };

        let ext = UrlHelper::get_ext(url);
        rule.match_filters
            .iter()
            .find(|filter| filter.applies(mime, ext))
            .is_some_and(|filter| filter.pattern.is_match(url))
    }
}
