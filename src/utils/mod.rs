//! 工具模块：URL 截断、父域名推导与扩展名提取
pub mod url_helper;

pub use self::url_helper::UrlHelper;
