//! 环境变量配置

use std::path::PathBuf;

/// 默认数据库文件位置
pub const DEFAULT_DB_PATH: &str = "./data/danci-vocab.db";

/// 开启文件日志时的默认目录
pub const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 文件路径，`:memory:` 表示内存数据库
    pub db_path: PathBuf,
    /// 初始数据资源（http(s) URL、file:// URL 或本地路径）
    pub seed_url: Option<String>,
    pub log_level: String,
    /// 文件日志目录，`None` 表示只输出到标准输出
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// 从环境变量读取配置，会先加载 `.env`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = std::env::var("DANCI_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let seed_url = std::env::var("DANCI_SEED_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let log_dir = file_logs.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
        });

        Self {
            db_path: PathBuf::from(db_path),
            seed_url,
            log_level,
            log_dir,
        }
    }

    /// 内存数据库配置（测试用）
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(crate::storage::object_store::MEMORY_PATH),
            seed_url: None,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }

    pub fn with_seed_url(mut self, seed_url: impl Into<String>) -> Self {
        self.seed_url = Some(seed_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config() {
        let config = Config::in_memory().with_seed_url("file:///tmp/words.json");
        assert_eq!(config.db_path, PathBuf::from(":memory:"));
        assert_eq!(config.seed_url.as_deref(), Some("file:///tmp/words.json"));
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
    }
}
