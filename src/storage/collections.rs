//! 集合与索引定义
//!
//! 每个集合对应一张 SQLite 表：`key` 主键 + `data` JSON 文档 + 若干索引列。
//! 实体通过 [`Record`] trait 声明所属集合、主键以及各索引的取值。

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::de::DeserializeOwned;
use serde::Serialize;

// ============================================================
// Collection - 命名集合
// ============================================================

/// 索引定义：对外的索引名与表中的数据列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub column: &'static str,
}

const fn index(name: &'static str, column: &'static str) -> IndexSpec {
    IndexSpec { name, column }
}

const WORD_INDEXES: &[IndexSpec] = &[
    index("word", "idx_word"),
    index("wordSet", "idx_word_set"),
    index("difficulty", "idx_difficulty"),
    index("frequency", "idx_frequency"),
];

const WORD_SET_INDEXES: &[IndexSpec] = &[
    index("difficulty", "idx_difficulty"),
    index("isDefault", "idx_is_default"),
];

const USER_PROGRESS_INDEXES: &[IndexSpec] = &[
    index("userId", "idx_user_id"),
    index("wordId", "idx_word_id"),
    index("masteryLevel", "idx_mastery_level"),
    index("nextReview", "idx_next_review"),
];

const STUDY_SESSION_INDEXES: &[IndexSpec] = &[
    index("userId", "idx_user_id"),
    index("startTime", "idx_start_time"),
    index("sessionType", "idx_session_type"),
];

/// 存储中的命名集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Words,
    WordSets,
    UserProgress,
    StudySessions,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Words,
        Collection::WordSets,
        Collection::UserProgress,
        Collection::StudySessions,
        Collection::Settings,
    ];

    /// 集合名称（与持久化布局中的名称一致）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::WordSets => "wordSets",
            Self::UserProgress => "userProgress",
            Self::StudySessions => "studySessions",
            Self::Settings => "settings",
        }
    }

    /// 对应的 SQLite 表名
    pub fn table(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::WordSets => "word_sets",
            Self::UserProgress => "user_progress",
            Self::StudySessions => "study_sessions",
            Self::Settings => "settings",
        }
    }

    /// 集合声明的二级索引
    pub fn indexes(&self) -> &'static [IndexSpec] {
        match self {
            Self::Words => WORD_INDEXES,
            Self::WordSets => WORD_SET_INDEXES,
            Self::UserProgress => USER_PROGRESS_INDEXES,
            Self::StudySessions => STUDY_SESSION_INDEXES,
            Self::Settings => &[],
        }
    }

    /// 根据索引名查找数据列
    pub fn index_column(&self, name: &str) -> Option<&'static str> {
        self.indexes()
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.column)
    }
}

// ============================================================
// IndexValue - 索引值
// ============================================================

/// 索引列的取值
///
/// 时间统一格式化为定长 UTC 字符串，保证字典序与时间顺序一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexValue {
    Null,
    Integer(i64),
    Text(String),
}

/// 索引列使用的时间格式
pub fn format_index_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for IndexValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for IndexValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u8> for IndexValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for IndexValue {
    fn from(value: bool) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<DateTime<Utc>> for IndexValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Text(format_index_datetime(value))
    }
}

impl<T: Into<IndexValue>> From<Option<T>> for IndexValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl ToSql for IndexValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

// ============================================================
// Record - 可存储实体
// ============================================================

/// 可存入集合的实体
pub trait Record: Serialize + DeserializeOwned {
    /// 实体所属集合
    const COLLECTION: Collection;

    /// 主键
    fn key(&self) -> String;

    /// 指定索引的取值，未声明的索引返回 `IndexValue::Null`
    fn index_value(&self, _index: &str) -> IndexValue {
        IndexValue::Null
    }
}
