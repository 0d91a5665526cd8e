//! 间隔重复调度
//!
//! SM-2 风格的更新规则：根据评分调整掌握等级、难易因子与复习间隔，
//! 并计算下次复习时间。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::UserProgress;

/// 最高掌握等级
pub const MAX_MASTERY_LEVEL: u8 = 5;

/// 间隔上限（天），与配置无关
pub const INTERVAL_CEILING: u32 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewRating {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewRating {
    /// 根据正误和反应时间推断评分
    pub fn from_correct(is_correct: bool, response_time_ms: u64) -> Self {
        if !is_correct {
            return Self::Again;
        }
        if response_time_ms < 2000 {
            Self::Easy
        } else if response_time_ms < 5000 {
            Self::Good
        } else {
            Self::Hard
        }
    }

    /// SM-2 回忆质量 (0-5)
    pub fn quality(&self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Again)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 首次答对后的间隔（天）
    pub initial_interval: u32,
    /// 第二次答对后的间隔（天）
    pub graduating_interval: u32,
    pub min_ease_factor: f64,
    pub max_ease_factor: f64,
    /// 全局间隔倍率
    pub interval_multiplier: f64,
    /// Hard 评分使用的增长倍率，替代难易因子
    pub hard_multiplier: f64,
    pub max_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_interval: 1,
            graduating_interval: 6,
            min_ease_factor: 1.3,
            max_ease_factor: 2.5,
            interval_multiplier: 1.0,
            hard_multiplier: 1.2,
            max_interval: 365,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 应用一次复习结果
    ///
    /// 间隔为 0 的记录视为第一次答对，间隔不超过首个间隔（新学或遗忘后）视为第二次答对。
    pub fn apply(&self, progress: &mut UserProgress, rating: ReviewRating, reviewed_at: DateTime<Utc>) {
        let cfg = &self.config;

        progress.review_count = progress.review_count.saturating_add(1);
        progress.last_reviewed = reviewed_at;

        let interval = if rating.is_success() {
            progress.correct_count = progress.correct_count.saturating_add(1);
            progress.mastery_level = progress.mastery_level.saturating_add(1).min(MAX_MASTERY_LEVEL);

            let next = if progress.interval == 0 {
                f64::from(cfg.initial_interval)
            } else if progress.interval <= cfg.initial_interval {
                f64::from(cfg.graduating_interval)
            } else {
                let growth = match rating {
                    ReviewRating::Hard => cfg.hard_multiplier,
                    _ => progress.ease_factor,
                };
                f64::from(progress.interval) * growth * cfg.interval_multiplier
            };

            progress.ease_factor = self.clamp_ease(progress.ease_factor + ease_delta(rating.quality()));
            next
        } else {
            progress.mastery_level = progress.mastery_level.saturating_sub(1);
            progress.ease_factor = self.clamp_ease(progress.ease_factor - 0.2);
            f64::from(cfg.initial_interval)
        };

        progress.interval = self.clamp_interval(interval);
        progress.next_review = reviewed_at
            .checked_add_signed(Duration::days(i64::from(progress.interval)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        tracing::debug!(
            word_id = %progress.word_id,
            ?rating,
            interval = progress.interval,
            ease = progress.ease_factor,
            mastery = progress.mastery_level,
            "review scheduled"
        );
    }

    fn clamp_ease(&self, ease: f64) -> f64 {
        ease.clamp(self.config.min_ease_factor, self.config.max_ease_factor)
    }

    fn clamp_interval(&self, days: f64) -> u32 {
        let max = self.config.max_interval.clamp(1, INTERVAL_CEILING);
        if !days.is_finite() {
            return max;
        }
        (days.round() as i64).clamp(1, i64::from(max)) as u32
    }
}

/// SM-2 难易因子增量
fn ease_delta(quality: u8) -> f64 {
    let miss = f64::from(5u8.saturating_sub(quality));
    0.1 - miss * (0.08 + miss * 0.02)
}

/// 是否已完全掌握
pub fn is_mastered(progress: &UserProgress) -> bool {
    progress.mastery_level >= MAX_MASTERY_LEVEL
}
