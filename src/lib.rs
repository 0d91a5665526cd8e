//! Danci 单词学习核心
//!
//! 本地单词存储、词库查询、学习/测试会话状态与间隔重复进度。

pub mod config;
pub mod logging;
pub mod profile;
pub mod progress;
pub mod scheduler;
pub mod seed;
pub mod session;
pub mod storage;
pub mod validation;
pub mod vocabulary;

pub use config::Config;
pub use profile::{ProfileStore, StudyPreferences, UserProfile};
pub use progress::{ProgressService, ReviewSchedule};
pub use scheduler::{ReviewRating, Scheduler, SchedulerConfig};
pub use seed::{DatabaseInitializer, DatabaseStatus, ImportSummary, SeedSource};
pub use session::{SessionError, StudySessionState, TestSessionState};
pub use storage::{ObjectStore, StorageError, StorageResult};
pub use vocabulary::{SearchFilters, VocabularyService};
