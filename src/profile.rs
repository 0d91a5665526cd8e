//! 用户资料状态
//!
//! 保存学习偏好与汇总进度。所有更新都是直接合并，不做推导：
//! 例如复习记录不会自动改变 `mastered_words`，由调用方显式更新。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{DifficultyLevel, ObjectStore, Setting, StorageError, StorageResult};
use crate::validation;

/// 默认用户 ID
pub const DEFAULT_USER_ID: &str = "default-user";
/// 默认每日目标
pub const DEFAULT_DAILY_GOAL: u32 = 20;

/// 设置集合中的偏好键
pub const PREFERENCES_KEY: &str = "vocab_user_preferences";
/// 设置集合中的进度键
pub const PROGRESS_KEY: &str = "vocab_user_progress";

// ============================================================
// 偏好设置
// ============================================================

/// 复习模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// 间隔重复
    #[default]
    Spaced,
    /// 随机
    Random,
}

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// 学习偏好
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyPreferences {
    /// 每日目标单词数 (1-100)
    pub daily_goal: u32,
    pub review_mode: ReviewMode,
    pub difficulty_preference: Vec<DifficultyLevel>,
    pub enable_audio: bool,
    pub auto_play: bool,
    pub study_reminder: bool,
    /// 提醒时间 HH:MM
    pub reminder_time: Option<String>,
    pub theme: Theme,
}

impl Default for StudyPreferences {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            review_mode: ReviewMode::Spaced,
            difficulty_preference: vec![DifficultyLevel::Beginner, DifficultyLevel::Elementary],
            enable_audio: true,
            auto_play: false,
            study_reminder: false,
            reminder_time: None,
            theme: Theme::System,
        }
    }
}

/// 偏好的部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub daily_goal: Option<u32>,
    pub review_mode: Option<ReviewMode>,
    pub difficulty_preference: Option<Vec<DifficultyLevel>>,
    pub enable_audio: Option<bool>,
    pub auto_play: Option<bool>,
    pub study_reminder: Option<bool>,
    pub reminder_time: Option<String>,
    pub theme: Option<Theme>,
}

impl StudyPreferences {
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(v) = patch.daily_goal {
            self.daily_goal = v;
        }
        if let Some(v) = patch.review_mode {
            self.review_mode = v;
        }
        if let Some(v) = patch.difficulty_preference {
            self.difficulty_preference = v;
        }
        if let Some(v) = patch.enable_audio {
            self.enable_audio = v;
        }
        if let Some(v) = patch.auto_play {
            self.auto_play = v;
        }
        if let Some(v) = patch.study_reminder {
            self.study_reminder = v;
        }
        if let Some(v) = patch.reminder_time {
            self.reminder_time = Some(v);
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
    }
}

// ============================================================
// 进度统计
// ============================================================

/// 学习进度汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressStats {
    pub total_words_studied: u32,
    pub mastered_words: u32,
    /// 连续学习天数
    pub study_streak: u32,
    /// 累计学习时长（分钟）
    pub total_study_time: u32,
    /// 平均正确率 (0-1)
    pub average_accuracy: f64,
    /// 最近 7 天每天学习的单词数
    pub weekly_progress: [u32; 7],
}

/// 进度的部分更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressPatch {
    pub total_words_studied: Option<u32>,
    pub mastered_words: Option<u32>,
    pub study_streak: Option<u32>,
    pub total_study_time: Option<u32>,
    pub average_accuracy: Option<f64>,
    pub weekly_progress: Option<[u32; 7]>,
}

impl ProgressStats {
    pub fn merge(&mut self, patch: ProgressPatch) {
        if let Some(v) = patch.total_words_studied {
            self.total_words_studied = v;
        }
        if let Some(v) = patch.mastered_words {
            self.mastered_words = v;
        }
        if let Some(v) = patch.study_streak {
            self.study_streak = v;
        }
        if let Some(v) = patch.total_study_time {
            self.total_study_time = v;
        }
        if let Some(v) = patch.average_accuracy {
            self.average_accuracy = v;
        }
        if let Some(v) = patch.weekly_progress {
            self.weekly_progress = v;
        }
    }
}

// ============================================================
// UserProfile - 用户状态
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub preferences: StudyPreferences,
    pub progress: ProgressStats,
    pub is_initialized: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: DEFAULT_USER_ID.to_string(),
            preferences: StudyPreferences::default(),
            progress: ProgressStats::default(),
            is_initialized: false,
        }
    }
}

impl UserProfile {
    pub fn initialize_user(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.is_initialized = true;
    }

    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        self.preferences.merge(patch);
    }

    pub fn update_progress(&mut self, patch: ProgressPatch) {
        self.progress.merge(patch);
    }

    pub fn increment_words_studied(&mut self, count: u32) {
        self.progress.total_words_studied = self.progress.total_words_studied.saturating_add(count);
    }

    /// 增加学习时长（分钟）
    pub fn increment_study_time(&mut self, minutes: u32) {
        self.progress.total_study_time = self.progress.total_study_time.saturating_add(minutes);
    }

    pub fn update_study_streak(&mut self, streak: u32) {
        self.progress.study_streak = streak;
    }

    pub fn update_weekly_progress(&mut self, weekly: [u32; 7]) {
        self.progress.weekly_progress = weekly;
    }
}

// ============================================================
// ProfileStore - 持久化到 settings 集合
// ============================================================

pub struct ProfileStore {
    store: Arc<ObjectStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }

    /// 保存偏好，校验失败返回 Validation 错误
    pub fn save_preferences(&self, preferences: &StudyPreferences) -> StorageResult<()> {
        if !validation::validate_study_preferences(preferences) {
            return Err(StorageError::Validation(format!(
                "学习偏好无效: dailyGoal={}, reminderTime={:?}",
                preferences.daily_goal, preferences.reminder_time
            )));
        }

        self.store.put(&Setting {
            key: PREFERENCES_KEY.to_string(),
            value: serde_json::to_value(preferences)?,
        })
    }

    /// 读取偏好，不存在时返回默认值
    pub fn load_preferences(&self) -> StorageResult<StudyPreferences> {
        match self.store.get::<Setting>(PREFERENCES_KEY)? {
            Some(setting) => Ok(serde_json::from_value(setting.value)?),
            None => Ok(StudyPreferences::default()),
        }
    }

    pub fn save_progress(&self, progress: &ProgressStats) -> StorageResult<()> {
        self.store.put(&Setting {
            key: PROGRESS_KEY.to_string(),
            value: serde_json::to_value(progress)?,
        })
    }

    pub fn load_progress(&self) -> StorageResult<ProgressStats> {
        match self.store.get::<Setting>(PROGRESS_KEY)? {
            Some(setting) => Ok(serde_json::from_value(setting.value)?),
            None => Ok(ProgressStats::default()),
        }
    }

    /// 读取完整的用户状态并标记为已初始化
    pub fn load_profile(&self, user_id: &str) -> StorageResult<UserProfile> {
        let mut profile = UserProfile {
            preferences: self.load_preferences()?,
            progress: self.load_progress()?,
            ..UserProfile::default()
        };
        profile.initialize_user(user_id);
        Ok(profile)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        self.save_preferences(&profile.preferences)?;
        self.save_progress(&profile.progress)
    }
}
