//! 词库查询服务
//!
//! 单词库与单词的读取、搜索、随机抽取、自定义单词与热门标签。

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::{
    DifficultyLevel, NewWord, ObjectStore, PartOfSpeech, StorageError, StorageResult, Word,
    WordSet,
};
use crate::validation;

/// 热门标签数量
pub const POPULAR_TAG_LIMIT: usize = 10;

/// 搜索过滤条件
///
/// 空列表与 `None` 等价，表示不限制该维度；所有指定的维度必须同时满足。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub difficulty: Vec<DifficultyLevel>,
    pub part_of_speech: Vec<PartOfSpeech>,
    pub tags: Vec<String>,
    pub word_set: Option<String>,
}

impl SearchFilters {
    pub fn with_difficulty(mut self, levels: impl IntoIterator<Item = DifficultyLevel>) -> Self {
        self.difficulty = levels.into_iter().collect();
        self
    }

    pub fn with_part_of_speech(mut self, pos: impl IntoIterator<Item = PartOfSpeech>) -> Self {
        self.part_of_speech = pos.into_iter().collect();
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_word_set(mut self, word_set: impl Into<String>) -> Self {
        self.word_set = Some(word_set.into());
        self
    }

    fn matches_difficulty(&self, word: &Word) -> bool {
        self.difficulty.is_empty() || self.difficulty.contains(&word.difficulty)
    }

    /// 判断单词是否满足全部过滤条件
    pub fn matches(&self, word: &Word) -> bool {
        if !self.matches_difficulty(word) {
            return false;
        }

        if !self.part_of_speech.is_empty()
            && !word
                .definitions
                .iter()
                .any(|def| self.part_of_speech.contains(&def.part_of_speech))
        {
            return false;
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|tag| word.tags.contains(tag)) {
            return false;
        }

        match &self.word_set {
            Some(set) => word.word_set.as_deref() == Some(set.as_str()),
            None => true,
        }
    }
}

/// 查询词是否命中拼写或任一中文释义（不区分大小写）
fn matches_query(word: &Word, lower_query: &str) -> bool {
    word.word.to_lowercase().contains(lower_query)
        || word
            .definitions
            .iter()
            .any(|def| def.meaning.to_lowercase().contains(lower_query))
}

pub struct VocabularyService {
    store: Arc<ObjectStore>,
}

impl VocabularyService {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }

    // ============================================================
    // 单词库
    // ============================================================

    pub fn get_word_sets(&self) -> StorageResult<Vec<WordSet>> {
        self.store.get_all()
    }

    pub fn get_word_set(&self, set_id: &str) -> StorageResult<Option<WordSet>> {
        self.store.get(set_id)
    }

    /// 默认单词库，没有标记默认时取第一个
    pub fn get_default_word_set(&self) -> StorageResult<Option<WordSet>> {
        let defaults: Vec<WordSet> = self.store.get_by_index("isDefault", true)?;
        if let Some(set) = defaults.into_iter().next() {
            return Ok(Some(set));
        }
        Ok(self.get_word_sets()?.into_iter().next())
    }

    pub fn get_words_from_set(&self, set_id: &str) -> StorageResult<Vec<Word>> {
        self.store.get_by_index("wordSet", set_id)
    }

    // ============================================================
    // 单词
    // ============================================================

    pub fn get_word_details(&self, word_id: &str) -> StorageResult<Option<Word>> {
        self.store.get(word_id)
    }

    pub fn get_words_by_difficulty(&self, level: DifficultyLevel) -> StorageResult<Vec<Word>> {
        self.store.get_by_index("difficulty", level.value())
    }

    /// 按查询词与过滤条件搜索，空白查询词不做文本过滤
    pub fn search_words(&self, query: &str, filters: Option<&SearchFilters>) -> StorageResult<Vec<Word>> {
        let text_filter = !query.trim().is_empty();
        let lower_query = query.to_lowercase();

        self.store.search(|word: &Word| {
            if text_filter && !matches_query(word, &lower_query) {
                return false;
            }
            filters.map_or(true, |f| f.matches(word))
        })
    }

    /// 随机抽取最多 `count` 个单词
    ///
    /// 指定单词库时通过索引读取，否则读取全部单词；难度条件在读取后过滤。
    pub fn get_random_words(&self, count: usize, filters: Option<&SearchFilters>) -> StorageResult<Vec<Word>> {
        let mut available: Vec<Word> = match filters.and_then(|f| f.word_set.as_deref()) {
            Some(set_id) => self.get_words_from_set(set_id)?,
            None => self.store.get_all()?,
        };

        if let Some(filters) = filters {
            available.retain(|word| filters.matches_difficulty(word));
        }

        available.shuffle(&mut rand::rng());
        available.truncate(count);
        Ok(available)
    }

    /// 校验并保存自定义单词，返回带 ID 与时间戳的完整记录
    pub fn add_custom_word(&self, new_word: NewWord) -> StorageResult<Word> {
        if !validation::validate_new_word(&new_word) {
            return Err(StorageError::Validation(format!(
                "自定义单词缺少拼写、音标或有效释义: {:?}",
                new_word.word
            )));
        }

        let id = format!("word-{}", uuid::Uuid::new_v4());
        let word = new_word.into_word(id, Utc::now());
        self.store.put(&word)?;

        tracing::info!(word_id = %word.id, word = %word.word, "custom word added");
        Ok(word)
    }

    /// 出现次数最多的 10 个标签，次数相同按字母序
    pub fn get_popular_tags(&self) -> StorageResult<Vec<String>> {
        let words: Vec<Word> = self.store.get_all()?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            for tag in &word.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Ok(ranked
            .into_iter()
            .take(POPULAR_TAG_LIMIT)
            .map(|(tag, _)| tag.to_string())
            .collect())
    }
}
