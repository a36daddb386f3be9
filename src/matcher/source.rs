//! 索引查询协作方接口
//! 查询参数、CDX 条目与错误描述的数据结构，以及 `IndexSource` trait

use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 查询参数映射（至少包含 `key` 与 `url`）
pub type QueryParams = Map<String, Value>;

/// 模糊结果标记字段
pub const IS_FUZZY: &str = "is_fuzzy";

/// 单条 CDX 记录（字段映射）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CdxEntry {
    fields: Map<String, Value>,
}

impl CdxEntry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// MIME 类型，缺失或为空时返回 None
    pub fn mime(&self) -> Option<&str> {
        self.fields
            .get("mime")
            .and_then(Value::as_str)
            .filter(|mime| !mime.is_empty())
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fields.get(IS_FUZZY).and_then(Value::as_bool).unwrap_or(false)
    }

    /// 返回带 `is_fuzzy = true` 标记的新条目，原条目不变
    pub fn with_fuzzy_flag(&self) -> Self {
        self.clone().into_fuzzy()
    }

    /// 消费条目，生成带 `is_fuzzy = true` 标记的新条目
    pub fn into_fuzzy(self) -> Self {
        let mut fields = self.fields;
        fields.insert(IS_FUZZY.to_string(), Value::Bool(true));
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for CdxEntry {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// 查询错误描述（来源 + 信息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

impl SourceError {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// 索引查询协作方：给定查询参数，返回条目序列与错误列表
pub trait IndexSource {
    type Iter: Iterator<Item = CdxEntry>;

    fn lookup(&self, params: &QueryParams) -> (Self::Iter, Vec<SourceError>);
}

// 闭包直接作为查询协作方
impl<F, I> IndexSource for F
where
    F: Fn(&QueryParams) -> (I, Vec<SourceError>),
    I: IntoIterator<Item = CdxEntry>,
{
    type Iter = I::IntoIter;

    fn lookup(&self, params: &QueryParams) -> (Self::Iter, Vec<SourceError>) {
        let (entries, errors) = self(params);
        (entries.into_iter(), errors)
    }
}
