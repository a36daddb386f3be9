//! URL 辅助工具模块
//! 负责替代查询 URL 的截断、父域名推导，以及路径扩展名提取

use url::Url;

use crate::error::{FuzzyError, FuzzyResult};

/// URL 辅助工具类
pub struct UrlHelper;

impl UrlHelper {
    /// 在首次出现 `marker` 处截断 URL（保留标记本身）
    /// 标记位于下标 0 时视为未找到，不截断
    pub fn truncate_after<'a>(url: &'a str, marker: &str) -> &'a str {
        match url.find(marker) {
            Some(index) if index > 0 => &url[..index + marker.len()],
            _ => url,
        }
    }

    /// 取 URL 原文中的网络位置（`://` 之后到首个 `/`、`?`、`#` 之前），去掉第一个 DNS 标签
    /// 例如 `http://sub.example.com/path` → `example.com`
    /// 网络位置按原文保留：不改写大小写，不省略端口（含默认端口）
    pub fn parent_domain(url: &str) -> FuzzyResult<String> {
        Url::parse(url)?;

        let netloc = Self::raw_netloc(url)
            .ok_or_else(|| FuzzyError::InvalidInput(format!("URL 缺少网络位置：{}", url)))?;

        netloc
            .split_once('.')
            .map(|(_, parent)| parent.to_string())
            .ok_or_else(|| FuzzyError::InvalidInput(format!("主机名无法去除首个标签：{}", netloc)))
    }

    /// URL 原文中的网络位置片段，为空时返回 None
    fn raw_netloc(url: &str) -> Option<&str> {
        let (_, rest) = url.split_once("://")?;
        let end = rest.find(|c: char| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
        Some(&rest[..end]).filter(|netloc| !netloc.is_empty())
    }

    /// 提取 URL 最后一段路径的扩展名（不含点）
    /// 忽略查询串；路径段开头的点不算扩展名分隔符；无扩展名时返回空串
    pub fn get_ext(url: &str) -> &str {
        let path = url.split('?').next().unwrap_or(url);
        let last_segment = path.rsplit('/').next().unwrap_or(path);

        let name = last_segment.trim_start_matches('.');
        match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_after_first_marker() {
        assert_eq!(
            UrlHelper::truncate_after("http://example.com/a?b=1&c=2", "?"),
            "http://example.com/a?"
        );
        assert_eq!(
            UrlHelper::truncate_after("http://example.com/a?b=1&c=2", "&"),
            "http://example.com/a?b=1&"
        );
        assert_eq!(UrlHelper::truncate_after("http://example.com/a", "?"), "http://example.com/a");
    }

    #[test]
    fn test_truncate_marker_at_index_zero_is_ignored() {
        // 测试场景：标记位于开头，视为未找到
        assert_eq!(UrlHelper::truncate_after("?", "?"), "?");
        assert_eq!(UrlHelper::truncate_after("?a=1?b=2", "?"), "?a=1?b=2");
        // 空标记总是位于下标 0
        assert_eq!(UrlHelper::truncate_after("http://a.com/?x", ""), "http://a.com/?x");
    }

    #[test]
    fn test_parent_domain() {
        assert_eq!(
            UrlHelper::parent_domain("http://sub.example.com/path?").unwrap(),
            "example.com"
        );
        assert_eq!(
            UrlHelper::parent_domain("https://a.b.example.org:8080/x").unwrap(),
            "b.example.org:8080"
        );
        assert_eq!(
            UrlHelper::parent_domain("http://sub.example.com?x=1").unwrap(),
            "example.com"
        );
        assert!(UrlHelper::parent_domain("http://localhost/").is_err());
        assert!(UrlHelper::parent_domain("not a url").is_err());
    }

    #[test]
    fn test_parent_domain_keeps_netloc_text() {
        // 默认端口不省略
        assert_eq!(
            UrlHelper::parent_domain("http://sub.example.com:80/path?x=1").unwrap(),
            "example.com:80"
        );
        // 大小写保持原样
        assert_eq!(
            UrlHelper::parent_domain("http://sub.Example.COM/p").unwrap(),
            "Example.COM"
        );
    }

    #[test]
    fn test_get_ext() {
        assert_eq!(UrlHelper::get_ext("http://example.com/img/photo.jpg?size=2"), "jpg");
        assert_eq!(UrlHelper::get_ext("http://example.com/archive.tar.gz"), "gz");
        assert_eq!(UrlHelper::get_ext("http://example.com/path/"), "");
        assert_eq!(UrlHelper::get_ext("http://example.com/.htaccess"), "");
        assert_eq!(UrlHelper::get_ext("http://example.com/page?file=a.png"), "");
        assert_eq!(UrlHelper::get_ext("http://example.com/name."), "");
    }
}
