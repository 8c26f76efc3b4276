//! 书目数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// 藏书条目
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// 条目唯一 ID (UUID)
    pub id: String,
    /// 书名
    pub title: String,
    /// 作者
    pub author: String,
    /// 出版年份
    pub year: Option<i32>,
    /// 创建时间
    pub created_at: Option<DateTime<Utc>>,
}

/// 创建条目请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// 更新条目请求（缺省字段保持不变）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    /// 外层缺省表示不改，Some(None) 清除年份
    pub year: Option<Option<i32>>,
}
