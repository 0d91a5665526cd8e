//! 学习会话状态：单词游标、进度百分比与结束时的会话记录

use chrono::{DateTime, Utc};

use super::{SessionError, SessionResult};
use crate::storage::{StudySession, Word};

/// 当前学习会话状态
///
/// 未激活 → `start_session` → 激活 → `end_session` → 未激活。
/// 游标越界的移动是空操作。
#[derive(Debug, Clone, Default)]
pub struct StudySessionState {
    current_session: Option<StudySession>,
    words: Vec<Word>,
    current_index: usize,
    furthest_index: usize,
    progress: f64,
    active: bool,
}

impl StudySessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_session(&mut self, session: StudySession, words: Vec<Word>) -> SessionResult<()> {
        if words.is_empty() {
            return Err(SessionError::EmptyWordList);
        }

        tracing::debug!(session_id = %session.id, words = words.len(), "study session started");

        self.current_session = Some(session);
        self.words = words;
        self.current_index = 0;
        self.furthest_index = 0;
        self.progress = 0.0;
        self.active = true;
        Ok(())
    }

    pub fn next_word(&mut self) {
        if self.current_index + 1 < self.words.len() {
            self.current_index += 1;
            self.furthest_index = self.furthest_index.max(self.current_index);
            self.recompute_progress();
        }
    }

    pub fn previous_word(&mut self) {
        if self.current_index > 0 {
            self.current_index -= 1;
            self.recompute_progress();
        }
    }

    /// 结束会话，返回补全了结束时间、总时长和已学单词的会话记录
    pub fn end_session(&mut self) -> Option<StudySession> {
        self.end_session_at(Utc::now())
    }

    pub fn end_session_at(&mut self, ended_at: DateTime<Utc>) -> Option<StudySession> {
        self.active = false;
        self.progress = 100.0;

        let words = &self.words;
        let furthest = self.furthest_index;
        let session = self.current_session.as_mut()?;

        session.end_time = Some(ended_at);
        session.total_time = (ended_at - session.start_time).num_seconds().max(0) as u64;
        if session.words_studied.is_empty() {
            session.words_studied = words
                .iter()
                .take(furthest + 1)
                .map(|word| word.id.clone())
                .collect();
        }

        tracing::debug!(
            session_id = %session.id,
            total_time = session.total_time,
            words_studied = session.words_studied.len(),
            "study session ended"
        );

        Some(session.clone())
    }

    /// 直接设置进度百分比
    pub fn update_session_progress(&mut self, progress: f64) {
        self.progress = progress;
    }

    pub fn reset_session(&mut self) {
        *self = Self::default();
    }

    fn recompute_progress(&mut self) {
        self.progress = self.current_index as f64 / self.words.len() as f64 * 100.0;
    }

    // ============================================================
    // 只读访问
    // ============================================================

    pub fn current_word(&self) -> Option<&Word> {
        self.words.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_session(&self) -> Option<&StudySession> {
        self.current_session.as_ref()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// 进度百分比 (0-100)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Definition, DifficultyLevel, PartOfSpeech, SessionType};
    use chrono::Duration;

    fn word(id: &str) -> Word {
        let now = Utc::now();
        Word {
            id: id.to_string(),
            word: id.to_string(),
            pronunciation: format!("/{id}/"),
            definitions: vec![Definition::new(PartOfSpeech::Noun, id)],
            examples: vec![],
            difficulty: DifficultyLevel::Beginner,
            frequency: 1,
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

    fn started(ids: &[&str]) -> StudySessionState {
        let mut state = StudySessionState::new();
        let session = StudySession::new("default-user", SessionType::Study);
        state
            .start_session(session, ids.iter().map(|id| word(id)).collect())
            .expect("Failed to start session");
        state
    }

    #[test]
    fn test_start_requires_words() {
        let mut state = StudySessionState::new();
        let session = StudySession::new("default-user", SessionType::Study);
        assert_eq!(
            state.start_session(session, vec![]),
            Err(SessionError::EmptyWordList)
        );
        assert!(!state.is_active());
        assert!(state.current_word().is_none());
    }

    #[test]
    fn test_navigation_bounds() {
        let mut state = started(&["w1", "w2", "w3"]);
        assert_eq!(state.current_word().map(|w| w.id.as_str()), Some("w1"));
        assert_eq!(state.progress(), 0.0);

        state.previous_word();
        assert_eq!(state.current_index(), 0);

        state.next_word();
        state.next_word();
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.current_word().map(|w| w.id.as_str()), Some("w3"));
        assert!((state.progress() - 200.0 / 3.0).abs() < 1e-9);

        state.next_word();
        assert_eq!(state.current_index(), 2);

        state.previous_word();
        assert_eq!(state.current_index(), 1);
        assert!((state.progress() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_session() {
        let mut state = started(&["w1", "w2", "w3"]);
        state.next_word();

        let start = state.current_session().unwrap().start_time;
        let finished = state
            .end_session_at(start + Duration::seconds(90))
            .expect("session should be returned");

        assert!(!state.is_active());
        assert_eq!(state.progress(), 100.0);
        assert_eq!(finished.total_time, 90);
        assert_eq!(finished.end_time, Some(start + Duration::seconds(90)));
        assert_eq!(finished.words_studied, vec!["w1", "w2"]);
    }

    #[test]
    fn test_end_without_session() {
        let mut state = StudySessionState::new();
        assert!(state.end_session().is_none());
        assert_eq!(state.progress(), 100.0);
    }

    #[test]
    fn test_update_and_reset() {
        let mut state = started(&["w1", "w2"]);
        state.update_session_progress(42.0);
        assert_eq!(state.progress(), 42.0);

        state.reset_session();
        assert!(!state.is_active());
        assert!(state.words().is_empty());
        assert!(state.current_session().is_none());
        assert_eq!(state.progress(), 0.0);
    }
}
