//! 学习进度服务
//!
//! 记录复习结果、查询待复习单词与复习日程，并持久化学习会话。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::scheduler::{self, ReviewRating, Scheduler};
use crate::storage::{IndexValue, ObjectStore, StorageResult, StudySession, UserProgress};

/// 复习日程
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSchedule {
    /// 今天到期（含已到期）
    pub today: Vec<String>,
    /// 今天之前就已到期
    pub overdue: Vec<String>,
    /// 未来若干天内到期
    pub upcoming: Vec<String>,
}

pub struct ProgressService {
    store: Arc<ObjectStore>,
    scheduler: Scheduler,
}

impl ProgressService {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self::with_scheduler(store, Scheduler::default())
    }

    pub fn with_scheduler(store: Arc<ObjectStore>, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    // ============================================================
    // 复习记录
    // ============================================================

    /// 记录一次复习：首次复习时创建进度，之后按调度规则更新
    pub fn record_review(
        &self,
        user_id: &str,
        word_id: &str,
        rating: ReviewRating,
        reviewed_at: DateTime<Utc>,
    ) -> StorageResult<UserProgress> {
        let mut progress = self
            .get_progress(user_id, word_id)?
            .unwrap_or_else(|| UserProgress::new(user_id, word_id, reviewed_at));

        self.scheduler.apply(&mut progress, rating, reviewed_at);
        self.store.put(&progress)?;

        tracing::debug!(
            user_id,
            word_id,
            ?rating,
            next_review = %progress.next_review,
            "review recorded"
        );
        Ok(progress)
    }

    pub fn get_progress(&self, user_id: &str, word_id: &str) -> StorageResult<Option<UserProgress>> {
        self.store.get(&UserProgress::composite_key(user_id, word_id))
    }

    pub fn get_user_progress(&self, user_id: &str) -> StorageResult<Vec<UserProgress>> {
        self.store.get_by_index("userId", user_id)
    }

    /// 到期（next_review <= now）的进度，按到期时间排序
    pub fn get_due_progress(&self, user_id: &str, now: DateTime<Utc>) -> StorageResult<Vec<UserProgress>> {
        self.store.get_by_index_and_range(
            "userId",
            user_id,
            "nextReview",
            None,
            Some(IndexValue::from(now)),
        )
    }

    /// 按自然日（UTC）划分的复习日程
    ///
    /// `overdue` 为今天零点之前到期的单词；`today` 为截至今天结束到期的全部单词
    /// （包含 `overdue`）；`upcoming` 为之后 `days` 天内到期的单词。
    pub fn get_review_schedule(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        days: u32,
    ) -> StorageResult<ReviewSchedule> {
        let start_of_today = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        let start_of_tomorrow = start_of_today + Duration::days(1);
        let horizon = start_of_tomorrow + Duration::days(i64::from(days));

        let mut records = self.get_user_progress(user_id)?;
        records.sort_by(|a, b| a.next_review.cmp(&b.next_review).then_with(|| a.word_id.cmp(&b.word_id)));

        let mut schedule = ReviewSchedule::default();
        for progress in records {
            if progress.next_review < start_of_today {
                schedule.overdue.push(progress.word_id.clone());
            }
            if progress.next_review < start_of_tomorrow {
                schedule.today.push(progress.word_id);
            } else if progress.next_review < horizon {
                schedule.upcoming.push(progress.word_id);
            }
        }

        Ok(schedule)
    }

    /// 已完全掌握的单词数
    pub fn mastered_count(&self, user_id: &str) -> StorageResult<usize> {
        Ok(self
            .get_user_progress(user_id)?
            .iter()
            .filter(|p| scheduler::is_mastered(p))
            .count())
    }

    // ============================================================
    // 学习会话
    // ============================================================

    pub fn save_session(&self, session: &StudySession) -> StorageResult<()> {
        self.store.put(session)?;
        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id,
            words = session.words_studied.len(),
            total_time = session.total_time,
            "study session saved"
        );
        Ok(())
    }

    /// 用户的全部会话，按开始时间排序
    pub fn get_sessions(&self, user_id: &str) -> StorageResult<Vec<StudySession>> {
        let mut sessions: Vec<StudySession> = self.store.get_by_index("userId", user_id)?;
        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(sessions)
    }
}
