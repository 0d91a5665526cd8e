//! 数据模型定义
//!
//! 定义所有持久化实体、枚举类型，以及它们在集合中的主键与索引投影。
//! JSON 字段名统一使用 camelCase，与初始数据资源的格式一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::collections::{Collection, IndexValue, Record};

/// 新学习记录的默认难易因子
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

// ============================================================
// 枚举类型
// ============================================================

/// 难度等级 (1-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DifficultyLevel {
    /// 初级
    Beginner = 1,
    /// 基础
    Elementary = 2,
    /// 中级
    Intermediate = 3,
    /// 高级
    Advanced = 4,
    /// 专家
    Expert = 5,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 5] = [
        Self::Beginner,
        Self::Elementary,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.value() == value)
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u8> for DifficultyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("无效的难度等级: {value}"))
    }
}

/// 词性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[serde(rename = "n.")]
    Noun,
    #[serde(rename = "v.")]
    Verb,
    #[serde(rename = "adj.")]
    Adjective,
    #[serde(rename = "adv.")]
    Adverb,
    #[serde(rename = "pron.")]
    Pronoun,
    #[serde(rename = "prep.")]
    Preposition,
    #[serde(rename = "conj.")]
    Conjunction,
    #[serde(rename = "int.")]
    Interjection,
    #[serde(rename = "art.")]
    Article,
    #[serde(rename = "aux.")]
    Auxiliary,
    #[serde(rename = "modal")]
    Modal,
    #[serde(rename = "phr.v.")]
    PhrasalVerb,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 12] = [
        Self::Noun,
        Self::Verb,
        Self::Adjective,
        Self::Adverb,
        Self::Pronoun,
        Self::Preposition,
        Self::Conjunction,
        Self::Interjection,
        Self::Article,
        Self::Auxiliary,
        Self::Modal,
        Self::PhrasalVerb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "n.",
            Self::Verb => "v.",
            Self::Adjective => "adj.",
            Self::Adverb => "adv.",
            Self::Pronoun => "pron.",
            Self::Preposition => "prep.",
            Self::Conjunction => "conj.",
            Self::Interjection => "int.",
            Self::Article => "art.",
            Self::Auxiliary => "aux.",
            Self::Modal => "modal",
            Self::PhrasalVerb => "phr.v.",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pos| pos.as_str() == s)
    }
}

/// 测试题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// 选择题
    MultipleChoice,
    /// 填空题
    FillInBlank,
    /// 听力
    Listening,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::FillInBlank => "fill_in_blank",
            Self::Listening => "listening",
        }
    }
}

/// 学习会话类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Study,
    Review,
    Test,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Review => "review",
            Self::Test => "test",
        }
    }
}

// ============================================================
// Word - 单词数据
// ============================================================

/// 单词释义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 词性
    pub part_of_speech: PartOfSpeech,
    /// 中文释义
    pub meaning: String,
    /// 英文释义
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_definition: Option<String>,
    /// 该释义的难度级别
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<DifficultyLevel>,
}

impl Definition {
    pub fn new(part_of_speech: PartOfSpeech, meaning: impl Into<String>) -> Self {
        Self {
            id: None,
            part_of_speech,
            meaning: meaning.into(),
            english_definition: None,
            level: None,
        }
    }
}

/// 例句
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub sentence: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Example {
    pub fn new(sentence: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            translation: translation.into(),
            audio_url: None,
        }
    }
}

/// 单词数据
///
/// 反序列化时缺失的时间戳以当前时间补齐，导入时会重新打上时间戳。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// 单词唯一标识
    pub id: String,
    /// 单词拼写
    pub word: String,
    /// 音标
    #[serde(default)]
    pub pronunciation: String,
    /// 释义列表（至少一条）
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// 例句
    #[serde(default)]
    pub examples: Vec<Example>,
    /// 难度等级
    pub difficulty: DifficultyLevel,
    /// 词频 (1-10000)
    #[serde(default)]
    pub frequency: u32,
    /// 标签
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 所属单词库
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_set: Option<String>,
    /// 词源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    /// 同义词
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    /// 反义词
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Word {
    /// 重新打上创建/更新时间
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }
}

impl Record for Word {
    const COLLECTION: Collection = Collection::Words;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn index_value(&self, index: &str) -> IndexValue {
        match index {
            "word" => IndexValue::from(&self.word),
            "wordSet" => IndexValue::from(self.word_set.as_deref()),
            "difficulty" => IndexValue::from(self.difficulty.value()),
            "frequency" => IndexValue::from(self.frequency),
            _ => IndexValue::Null,
        }
    }
}

/// 用户自定义单词（尚未分配 ID 与时间戳）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub word: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub examples: Vec<Example>,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub word_set: Option<String>,
    #[serde(default)]
    pub etymology: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
}

impl NewWord {
    pub fn into_word(self, id: String, now: DateTime<Utc>) -> Word {
        Word {
            id,
            word: self.word,
            pronunciation: self.pronunciation,
            definitions: self.definitions,
            examples: self.examples,
            difficulty: self.difficulty,
            frequency: self.frequency,
            tags: self.tags,
            audio_url: self.audio_url,
            image_url: self.image_url,
            word_set: self.word_set,
            etymology: self.etymology,
            synonyms: self.synonyms,
            antonyms: self.antonyms,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================
// WordSet - 单词库
// ============================================================

/// 单词库元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl WordSet {
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }
}

impl Record for WordSet {
    const COLLECTION: Collection = Collection::WordSets;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn index_value(&self, index: &str) -> IndexValue {
        match index {
            "difficulty" => IndexValue::from(self.difficulty.value()),
            "isDefault" => IndexValue::from(self.is_default),
            _ => IndexValue::Null,
        }
    }
}

// ============================================================
// UserProgress - 用户学习进度
// ============================================================

/// 单个单词的学习进度，主键为 (userId, wordId)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub word_id: String,
    /// 掌握等级 (0-5)
    pub mastery_level: u8,
    pub review_count: u32,
    pub correct_count: u32,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    /// 难易因子
    pub ease_factor: f64,
    /// 复习间隔（天）
    pub interval: u32,
}

impl UserProgress {
    /// 首次复习时创建的进度记录
    pub fn new(user_id: impl Into<String>, word_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            word_id: word_id.into(),
            mastery_level: 0,
            review_count: 0,
            correct_count: 0,
            last_reviewed: now,
            next_review: now,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
        }
    }

    /// 复合主键
    pub fn composite_key(user_id: &str, word_id: &str) -> String {
        format!("{user_id}\u{1f}{word_id}")
    }

    /// 正确率 (0-1)，尚未复习时为 0
    pub fn accuracy(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            f64::from(self.correct_count) / f64::from(self.review_count)
        }
    }
}

impl Record for UserProgress {
    const COLLECTION: Collection = Collection::UserProgress;

    fn key(&self) -> String {
        Self::composite_key(&self.user_id, &self.word_id)
    }

    fn index_value(&self, index: &str) -> IndexValue {
        match index {
            "userId" => IndexValue::from(&self.user_id),
            "wordId" => IndexValue::from(&self.word_id),
            "masteryLevel" => IndexValue::from(self.mastery_level),
            "nextReview" => IndexValue::from(self.next_review),
            _ => IndexValue::Null,
        }
    }
}

// ============================================================
// StudySession / Test - 学习会话与测试
// ============================================================

/// 单题作答结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub word_id: String,
    pub test_type: TestType,
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
    /// 作答耗时（毫秒）
    pub time_spent: u64,
}

/// 学习会话记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub words_studied: Vec<String>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    /// 总时长（秒）
    #[serde(default)]
    pub total_time: u64,
    pub session_type: SessionType,
}

impl StudySession {
    pub fn new(user_id: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            id: format!("session-{}", uuid::Uuid::new_v4()),
            user_id: user_id.into(),
            start_time: Utc::now(),
            end_time: None,
            words_studied: Vec::new(),
            test_results: Vec::new(),
            total_time: 0,
            session_type,
        }
    }
}

impl Record for StudySession {
    const COLLECTION: Collection = Collection::StudySessions;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn index_value(&self, index: &str) -> IndexValue {
        match index {
            "userId" => IndexValue::from(&self.user_id),
            "startTime" => IndexValue::from(self.start_time),
            "sessionType" => IndexValue::from(self.session_type.as_str()),
            _ => IndexValue::Null,
        }
    }
}

/// 测试题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestItem {
    pub id: String,
    pub word_id: String,
    pub question: String,
    /// 选择题选项
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
}

/// 测试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub questions: Vec<TestItem>,
    /// 时间限制（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Test {
    pub fn new(test_type: TestType, questions: Vec<TestItem>, time_limit: Option<u32>) -> Self {
        Self {
            id: format!("test-{}", uuid::Uuid::new_v4()),
            test_type,
            questions,
            time_limit,
            created_at: Utc::now(),
        }
    }
}

// ============================================================
// Setting - 键值设置
// ============================================================

/// 设置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

impl Record for Setting {
    const COLLECTION: Collection = Collection::Settings;

    fn key(&self) -> String {
        self.key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_difficulty_level_serde() {
        let level: DifficultyLevel = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(level, DifficultyLevel::Intermediate);
        assert_eq!(serde_json::to_value(DifficultyLevel::Expert).unwrap(), json!(5));
        assert!(serde_json::from_value::<DifficultyLevel>(json!(6)).is_err());
        assert!(serde_json::from_value::<DifficultyLevel>(json!(0)).is_err());
    }

    #[test]
    fn test_part_of_speech_serde() {
        let pos: PartOfSpeech = serde_json::from_value(json!("phr.v.")).unwrap();
        assert_eq!(pos, PartOfSpeech::PhrasalVerb);
        assert_eq!(serde_json::to_value(PartOfSpeech::Adjective).unwrap(), json!("adj."));
        assert_eq!(PartOfSpeech::from_str("int."), Some(PartOfSpeech::Interjection));
        assert_eq!(PartOfSpeech::from_str("noun"), None);
    }

    #[test]
    fn test_test_type_serde() {
        assert_eq!(
            serde_json::to_value(TestType::FillInBlank).unwrap(),
            json!("fill_in_blank")
        );
        assert_eq!(TestType::MultipleChoice.as_str(), "multiple_choice");
    }

    #[test]
    fn test_word_from_seed_json() {
        let word: Word = serde_json::from_value(json!({
            "id": "word-1",
            "word": "hello",
            "pronunciation": "/həˈloʊ/",
            "definitions": [{ "partOfSpeech": "int.", "meaning": "你好" }],
            "examples": [],
            "difficulty": 1,
            "frequency": 9500,
            "tags": ["greeting"],
            "wordSet": "basic-english"
        }))
        .unwrap();

        assert_eq!(word.word_set.as_deref(), Some("basic-english"));
        assert_eq!(word.definitions[0].part_of_speech, PartOfSpeech::Interjection);
        assert!(word.synonyms.is_empty());
        assert_eq!(word.index_value("difficulty"), IndexValue::Integer(1));
        assert_eq!(
            word.index_value("wordSet"),
            IndexValue::Text("basic-english".to_string())
        );
    }

    #[test]
    fn test_user_progress_key_and_indexes() {
        let now = Utc::now();
        let progress = UserProgress::new("user-1", "word-1", now);
        assert_eq!(progress.key(), UserProgress::composite_key("user-1", "word-1"));
        assert_ne!(
            UserProgress::composite_key("a", "bc"),
            UserProgress::composite_key("ab", "c")
        );
        assert_eq!(progress.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(progress.accuracy(), 0.0);
        assert_eq!(progress.index_value("nextReview"), IndexValue::from(now));
    }

    #[test]
    fn test_study_session_new() {
        let session = StudySession::new("default-user", SessionType::Study);
        assert!(session.id.starts_with("session-"));
        assert!(session.end_time.is_none());
        assert_eq!(
            session.index_value("sessionType"),
            IndexValue::Text("study".to_string())
        );
    }

    #[test]
    fn test_test_item_type_field() {
        let item = TestItem {
            id: "q1".to_string(),
            word_id: "word-1".to_string(),
            question: "hello".to_string(),
            options: None,
            correct_answer: "你好".to_string(),
            test_type: TestType::MultipleChoice,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], json!("multiple_choice"));
        assert_eq!(value["correctAnswer"], json!("你好"));
    }
}
