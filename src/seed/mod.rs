//! 数据库初始化
//!
//! 负责打开存储，并在单词库为空时导入初始数据：
//! 1. 优先使用配置的初始数据资源（http(s) URL、file:// URL 或本地路径）
//! 2. 资源不可用（获取、状态码、解析或写入失败）时回退到内置示例数据
//!
//! 另外提供重置数据库与状态统计。

pub mod sample;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::storage::{Collection, ObjectStore, StorageError, StorageResult, Word, WordSet};

pub use sample::load_sample_payload;

// ============================================================
// 初始数据格式
// ============================================================

/// 初始数据资源：`{ wordSets: [...], words: [...] }`
///
/// 缺失或为 null 的数组按空数组处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub word_sets: Vec<WordSet>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub words: Vec<Word>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 初始数据资源位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    Http(String),
    File(PathBuf),
}

impl SeedSource {
    /// 解析资源位置：http(s) 前缀为远程资源，`file://` 前缀或其他值为本地路径
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Http(location.to_string())
        } else if let Some(path) = location.strip_prefix("file://") {
            Self::File(PathBuf::from(path))
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 导入数据的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOrigin {
    Resource(String),
    Sample,
}

/// 一次导入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub word_sets: usize,
    pub words: usize,
    pub origin: SeedOrigin,
}

/// 各集合记录数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub words_count: u64,
    pub word_sets_count: u64,
    pub progress_count: u64,
    pub sessions_count: u64,
}

// ============================================================
// DatabaseInitializer
// ============================================================

pub struct DatabaseInitializer {
    store: Arc<ObjectStore>,
    seed_source: Option<SeedSource>,
    http: reqwest::Client,
    initialized: AtomicBool,
}

impl DatabaseInitializer {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self {
            store,
            seed_source: None,
            http: reqwest::Client::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// 根据配置创建存储与初始化器
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(ObjectStore::new(&config.db_path));
        let initializer = Self::new(store);
        match config.seed_url.as_deref() {
            Some(location) => initializer.with_seed_source(SeedSource::parse(location)),
            None => initializer,
        }
    }

    pub fn with_seed_source(mut self, source: SeedSource) -> Self {
        self.seed_source = Some(source);
        self
    }

    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    /// 已完成初始化且存储仍处于打开状态
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst) && self.store.is_open()
    }

    /// 打开存储并在需要时导入初始数据，存储仍打开时重复调用直接返回
    pub async fn initialize(&self) -> StorageResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        if let Err(e) = self.initialize_inner().await {
            tracing::error!(error = %e, "failed to initialize database");
            return Err(e);
        }

        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(path = %self.store.db_path(), "database initialized");
        Ok(())
    }

    async fn initialize_inner(&self) -> StorageResult<()> {
        self.store.open()?;

        match self.store.count(Collection::WordSets) {
            Ok(0) => {
                tracing::info!("no existing data found, importing initial data");
                self.import_initial_data().await?;
            }
            Ok(count) => {
                tracing::info!(word_sets = count, "existing data found, skipping import");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to check existing data, importing initial data");
                self.import_initial_data().await?;
            }
        }

        Ok(())
    }

    /// 导入初始数据：资源优先，失败回退到示例数据
    pub async fn import_initial_data(&self) -> StorageResult<ImportSummary> {
        if let Some(source) = &self.seed_source {
            match self.import_from_source(source).await {
                Ok(summary) => return Ok(summary),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "seed resource unavailable, falling back to sample data");
                }
            }
        }

        self.import_sample_data()
    }

    async fn import_from_source(&self, source: &SeedSource) -> StorageResult<ImportSummary> {
        let payload = self.fetch_payload(source).await?;
        self.import_payload(payload, SeedOrigin::Resource(source.to_string()))
    }

    async fn fetch_payload(&self, source: &SeedSource) -> StorageResult<SeedPayload> {
        let bytes = match source {
            SeedSource::Http(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| StorageError::Network(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(StorageError::Network(format!("HTTP {status}: {url}")));
                }

                response
                    .bytes()
                    .await
                    .map_err(|e| StorageError::Network(e.to_string()))?
                    .to_vec()
            }
            SeedSource::File(path) => tokio::fs::read(path).await?,
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn import_sample_data(&self) -> StorageResult<ImportSummary> {
        let payload = load_sample_payload()?;
        self.import_payload(payload, SeedOrigin::Sample)
            .map_err(|e| StorageError::SeedImport(e.to_string()))
    }

    /// 逐条 upsert，时间戳统一重新生成
    pub fn import_payload(&self, payload: SeedPayload, origin: SeedOrigin) -> StorageResult<ImportSummary> {
        let now = Utc::now();
        let summary = ImportSummary {
            word_sets: payload.word_sets.len(),
            words: payload.words.len(),
            origin,
        };

        for mut word_set in payload.word_sets {
            word_set.stamp(now);
            self.store.put(&word_set)?;
        }

        for mut word in payload.words {
            word.stamp(now);
            self.store.put(&word)?;
        }

        tracing::info!(
            word_sets = summary.word_sets,
            words = summary.words,
            origin = ?summary.origin,
            "initial data imported"
        );
        Ok(summary)
    }

    /// 清空单词、单词库、进度与会话（保留设置），然后重新导入
    pub async fn reset_database(&self) -> StorageResult<ImportSummary> {
        for collection in [
            Collection::Words,
            Collection::WordSets,
            Collection::UserProgress,
            Collection::StudySessions,
        ] {
            self.store.clear(collection)?;
        }

        let summary = self.import_initial_data().await?;
        tracing::info!("database reset");
        Ok(summary)
    }

    /// 各集合记录数，出错时记录日志并返回全 0
    pub fn get_database_status(&self) -> DatabaseStatus {
        match self.collect_status() {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "failed to get database status");
                DatabaseStatus::default()
            }
        }
    }

    fn collect_status(&self) -> StorageResult<DatabaseStatus> {
        let count = |collection: Collection| -> StorageResult<u64> {
            Ok(self.store.count(collection)?.max(0) as u64)
        };

        Ok(DatabaseStatus {
            words_count: count(Collection::Words)?,
            word_sets_count: count(Collection::WordSets)?,
            progress_count: count(Collection::UserProgress)?,
            sessions_count: count(Collection::StudySessions)?,
        })
    }
}
