//! 编译后规则模型
//! 正则与过滤模板编译后的结构，加载完成后只读

use regex::Regex;

use crate::error::{FuzzyError, FuzzyResult};
use crate::rule::MatchType;

/// 过滤模板：恰好一个占位符（`{}` 或 `{0}`），`{{` / `}}` 表示字面量花括号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTemplate {
    source: String,
    head: String,
    tail: String,
}

impl FilterTemplate {
    /// 解析模板，占位符数量不为 1 时返回错误
    pub fn parse(template: &str) -> FuzzyResult<Self> {
        let mut head = String::new();
        let mut tail = String::new();
        let mut slots = 0usize;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if slots == 0 { &mut head } else { &mut tail };
            match c {
                '{' => match chars.peek().copied() {
                    Some('{') => {
                        chars.next();
                        out.push('{');
                    }
                    Some('}') => {
                        chars.next();
                        slots += 1;
                    }
                    Some('0') => {
                        chars.next();
                        if chars.next() != Some('}') {
                            return Err(Self::invalid(template, "占位符格式错误"));
                        }
                        slots += 1;
                    }
                    _ => return Err(Self::invalid(template, "仅支持 {} 或 {0} 占位符")),
                },
                '}' => {
                    if chars.next() != Some('}') {
                        return Err(Self::invalid(template, "未配对的 }"));
                    }
                    out.push('}');
                }
                other => out.push(other),
            }
        }

        if slots != 1 {
            return Err(Self::invalid(template, &format!("需要恰好一个占位符，实际{}个", slots)));
        }

        Ok(Self {
            source: template.to_string(),
            head,
            tail,
        })
    }

    /// 用捕获内容替换占位符
    pub fn render(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.head.len() + value.len() + self.tail.len());
        out.push_str(&self.head);
        out.push_str(value);
        out.push_str(&self.tail);
        out
    }

    /// 原始模板字符串
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn invalid(template: &str, reason: &str) -> FuzzyError {
        FuzzyError::TemplateError(format!("{}（{}）", template, reason))
    }
}

/// 结果过滤条件：可选 MIME、可选扩展名黑名单、针对原始 URL 的正则
#[derive(Debug, Clone)]
pub struct MatchFilter {
    pub mime: Option<String>,
    pub not_ext: Option<Vec<String>>,
    pub pattern: Regex,
}

impl MatchFilter {
    /// 该条件是否适用于当前条目
    /// 有扩展名黑名单时只看扩展名，否则比较 MIME（`*` 为通配）
    pub fn applies(&self, mime: &str, ext: &str) -> bool {
        match &self.not_ext {
            Some(not_ext) => !ext.is_empty() && !not_ext.iter().any(|e| e == ext),
            None => matches!(self.mime.as_deref(), Some(m) if m == mime || m == "*"),
        }
    }
}

/// 编译后的模糊匹配规则
#[derive(Debug, Clone)]
pub struct FuzzyRule {
    pub url_prefixes: Vec<String>,
    pub pattern: Regex,
    pub replace_after: String,
    pub filter_templates: Vec<FilterTemplate>,
    pub match_type: MatchType,
    pub match_filters: Vec<MatchFilter>,
}

impl FuzzyRule {
    /// key 是否以任一前缀开头
    #[inline]
    pub fn matches_prefix(&self, urlkey: &str) -> bool {
        self.url_prefixes.iter().any(|prefix| urlkey.starts_with(prefix.as_str()))
    }

    /// 规则描述（用于日志/调试输出）
    pub fn describe(&self) -> String {
        let filters: Vec<&str> = self.filter_templates.iter().map(FilterTemplate::as_str).collect();
        format!(
            "prefix={:?} match={} replace={:?} filter={:?} type={} match_filters={}",
            self.url_prefixes,
            self.pattern.as_str(),
            self.replace_after,
            filters,
            self.match_type,
            self.match_filters.len()
        )
    }
}
