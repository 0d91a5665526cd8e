//! SQLite 本地存储模块
//!
//! 以"集合 + 二级索引"的形式保存所有实体，提供：
//! - 通用的增删改查、批量写入与谓词搜索
//! - 按索引查询（单词→词库、进度→下次复习时间等）
//! - 基于版本号的 schema 迁移

// ============================================================
// 子模块声明
// ============================================================

pub mod collections;
pub mod migrations;
pub mod models;
pub mod object_store;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use collections::{Collection, IndexValue, Record};
pub use migrations::run_migrations;
pub use models::*;
pub use object_store::ObjectStore;

use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("存储尚未初始化")]
    NotInitialized,

    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("主键已存在: {collection}/{key}")]
    DuplicateKey { collection: &'static str, key: String },

    #[error("集合 {collection} 不存在索引 {index}")]
    UnknownIndex {
        collection: &'static str,
        index: String,
    },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("导入初始数据失败: {0}")]
    SeedImport(String),

    #[error("数据校验失败: {0}")]
    Validation(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StorageError::DuplicateKey {
            collection: "words",
            key: "word-1".to_string(),
        };
        assert_eq!(err.to_string(), "主键已存在: words/word-1");

        let err = StorageError::NotInitialized;
        assert_eq!(err.to_string(), "存储尚未初始化");
    }

    #[test]
    fn test_from_serde_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StorageError = parse_err.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
