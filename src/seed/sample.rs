//! 内置示例数据
//!
//! 初始数据资源不可用时的回退方案：6 个单词、4 个单词库。

use super::SeedPayload;
use crate::storage::{StorageError, StorageResult};

const SAMPLE_WORDS_JSON: &str = include_str!("sample_words.json");

/// 解析内置示例数据
pub fn load_sample_payload() -> StorageResult<SeedPayload> {
    serde_json::from_str(SAMPLE_WORDS_JSON)
        .map_err(|e| StorageError::SeedImport(format!("内置示例数据解析失败: {}", e)))
}
