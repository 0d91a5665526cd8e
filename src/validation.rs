//! 数据校验与清理
//!
//! 词性、难度等枚举字段由类型系统保证合法，这里只检查必填文本与数值范围。

use crate::profile::StudyPreferences;
use crate::storage::{Definition, Example, NewWord, Word, WordSet};

/// 每日目标范围
pub const DAILY_GOAL_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
/// 搜索词最大长度（字符数）
pub const MAX_SEARCH_QUERY_LEN: usize = 50;

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// ============================================================
// 实体校验
// ============================================================

/// 单词需要 ID、拼写、音标，且至少一条释义并且所有释义均有效
pub fn validate_word(word: &Word) -> bool {
    !is_blank(&word.id)
        && !is_blank(&word.word)
        && !is_blank(&word.pronunciation)
        && !word.definitions.is_empty()
        && word.definitions.iter().all(validate_definition)
}

/// 自定义单词在分配 ID 之前的校验
pub fn validate_new_word(word: &NewWord) -> bool {
    !is_blank(&word.word)
        && !is_blank(&word.pronunciation)
        && !word.definitions.is_empty()
        && word.definitions.iter().all(validate_definition)
}

pub fn validate_definition(definition: &Definition) -> bool {
    !is_blank(&definition.meaning)
}

pub fn validate_example(example: &Example) -> bool {
    !is_blank(&example.sentence) && !is_blank(&example.translation)
}

pub fn validate_word_set(word_set: &WordSet) -> bool {
    !is_blank(&word_set.id) && !is_blank(&word_set.name) && !is_blank(&word_set.description)
}

pub fn validate_study_preferences(preferences: &StudyPreferences) -> bool {
    if !DAILY_GOAL_RANGE.contains(&preferences.daily_goal) {
        return false;
    }

    preferences
        .reminder_time
        .as_deref()
        .map_or(true, is_valid_time_format)
}

// ============================================================
// 文本校验
// ============================================================

/// 搜索词去除首尾空白后非空且不超过 50 个字符
pub fn validate_search_query(query: &str) -> bool {
    let trimmed = query.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_SEARCH_QUERY_LEN
}

/// 24 小时制 `H:MM` / `HH:MM`
pub fn is_valid_time_format(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hours) || !all_digits(minutes) || hours.len() > 2 || minutes.len() != 2 {
        return false;
    }

    match (hours.parse::<u8>(), minutes.parse::<u8>()) {
        (Ok(h), Ok(m)) => h < 24 && m < 60,
        _ => false,
    }
}

// ============================================================
// 清理
// ============================================================

/// 去除首尾空白并把连续空白折叠为单个空格
pub fn sanitize_string(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 小写、去首尾空白，只保留 ASCII 字母、空白、`-` 和 `'`
pub fn sanitize_word(word: &str) -> String {
    word.to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == '-' || *c == '\'')
        .collect()
}

/// 清理单词的文本字段，标签统一小写
pub fn clean_word(mut word: Word) -> Word {
    word.word = sanitize_word(&word.word);
    for definition in &mut word.definitions {
        definition.meaning = sanitize_string(&definition.meaning);
        if let Some(english) = definition.english_definition.as_mut() {
            *english = sanitize_string(english);
        }
    }
    for example in &mut word.examples {
        example.sentence = sanitize_string(&example.sentence);
        example.translation = sanitize_string(&example.translation);
    }
    word.tags = word
        .tags
        .iter()
        .map(|tag| sanitize_string(tag).to_lowercase())
        .collect();
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DifficultyLevel, PartOfSpeech};
    use chrono::Utc;

    fn sample_word() -> Word {
        let now = Utc::now();
        Word {
            id: "word-1".to_string(),
            word: "hello".to_string(),
            pronunciation: "/həˈloʊ/".to_string(),
            definitions: vec![Definition::new(PartOfSpeech::Interjection, "你好")],
            examples: vec![],
            difficulty: DifficultyLevel::Beginner,
            frequency: 9500,
            tags: vec![],
            audio_url: None,
            image_url: None,
            word_set: None,
            etymology: None,
            synonyms: vec![],
            antonyms: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_word() {
        assert!(validate_word(&sample_word()));

        let mut word = sample_word();
        word.definitions.clear();
        assert!(!validate_word(&word));

        let mut word = sample_word();
        word.pronunciation = "  ".to_string();
        assert!(!validate_word(&word));

        let mut word = sample_word();
        word.definitions.push(Definition::new(PartOfSpeech::Noun, ""));
        assert!(!validate_word(&word));
    }

    #[test]
    fn test_validate_example() {
        assert!(validate_example(&Example::new("Hi.", "嗨。")));
        assert!(!validate_example(&Example::new("Hi.", "")));
    }

    #[test]
    fn test_validate_study_preferences() {
        let mut preferences = StudyPreferences::default();
        assert!(validate_study_preferences(&preferences));

        preferences.daily_goal = 101;
        assert!(!validate_study_preferences(&preferences));

        preferences.daily_goal = 100;
        preferences.reminder_time = Some("25:00".to_string());
        assert!(!validate_study_preferences(&preferences));

        preferences.reminder_time = Some("7:05".to_string());
        assert!(validate_study_preferences(&preferences));
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("hello"));
        assert!(!validate_search_query("   "));
        assert!(validate_search_query(&"a".repeat(50)));
        assert!(!validate_search_query(&"a".repeat(51)));
    }

    #[test]
    fn test_time_format() {
        for ok in ["00:00", "9:30", "23:59", "08:05"] {
            assert!(is_valid_time_format(ok), "{ok}");
        }
        for bad in ["24:00", "12:60", "12:5", "123:00", "ab:cd", "12-30", ""] {
            assert!(!is_valid_time_format(bad), "{bad}");
        }
    }

    #[test]
    fn test_sanitizers() {
        assert_eq!(sanitize_string("  a   lot\tof \n space "), "a lot of space");
        assert_eq!(sanitize_word("  Don't-Stop123! "), "don't-stop");
        assert_eq!(sanitize_word("Ice Cream"), "ice cream");
    }

    #[test]
    fn test_clean_word() {
        let mut word = sample_word();
        word.word = " HeLLo! ".to_string();
        word.definitions[0].meaning = " 你好，  问候语 ".to_string();
        word.tags = vec![" Greeting ".to_string(), "BASIC".to_string()];

        let cleaned = clean_word(word);
        assert_eq!(cleaned.word, "hello");
        assert_eq!(cleaned.definitions[0].meaning, "你好， 问候语");
        assert_eq!(cleaned.tags, vec!["greeting", "basic"]);
    }
}
