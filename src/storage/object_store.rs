//! 通用集合存储
//!
//! 以 JSON 文档形式保存实体，索引值投影到独立列，提供：
//! - add / put / get / get_all / delete / clear / count
//! - 按索引精确查询与范围查询
//! - 批量写入（非原子）与谓词搜索

use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::storage::collections::{Collection, IndexValue, Record};
use crate::storage::migrations;
use crate::storage::{StorageError, StorageResult};

/// 内存数据库路径标记
pub const MEMORY_PATH: &str = ":memory:";

/// 本地集合存储
///
/// 必须先调用 [`ObjectStore::open`]，之前或 [`ObjectStore::close`] 之后的任何操作
/// 都返回 [`StorageError::NotInitialized`]。所有操作共用一个连接，按加锁顺序串行执行。
pub struct ObjectStore {
    connection: Mutex<Option<Connection>>,
    db_path: String,
}

impl ObjectStore {
    /// 创建未打开的存储
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            connection: Mutex::new(None),
            db_path: db_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// 创建内存存储（用于测试）
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// 打开数据库并运行迁移，重复调用无副作用
    pub fn open(&self) -> StorageResult<()> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            return Ok(());
        }

        let connection = if self.db_path == MEMORY_PATH {
            let connection = Connection::open_in_memory()?;
            connection.execute_batch("PRAGMA cache_size=-64000;")?;
            connection
        } else {
            if let Some(parent) = Path::new(&self.db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let connection = Connection::open(&self.db_path)?;
            connection.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA cache_size=-64000;",
            )?;
            connection
        };

        let version = migrations::run_migrations(&connection)?;
        tracing::info!(path = %self.db_path, schema_version = version, "object store opened");

        *guard = Some(connection);
        Ok(())
    }

    /// 关闭连接，之后的操作返回 NotInitialized
    pub fn close(&self) -> StorageResult<()> {
        let mut guard = self.lock()?;
        if let Some(connection) = guard.take() {
            connection.close().map_err(|(_, e)| StorageError::Database(e))?;
            tracing::info!(path = %self.db_path, "object store closed");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Option<Connection>>> {
        self.connection
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::NotInitialized)?;
        f(conn)
    }

    // ============================================================
    // 写操作
    // ============================================================

    /// 新增记录，主键已存在时返回 DuplicateKey
    pub fn add<T: Record>(&self, item: &T) -> StorageResult<()> {
        self.with_conn(|conn| Self::add_internal(conn, item))
    }

    /// 插入或更新记录
    pub fn put<T: Record>(&self, item: &T) -> StorageResult<()> {
        self.with_conn(|conn| Self::write_internal(conn, item, true))
    }

    /// 逐条新增
    ///
    /// 不在事务中执行：中途失败时，之前写入的记录会保留。
    pub fn bulk_add<T: Record>(&self, items: &[T]) -> StorageResult<()> {
        self.with_conn(|conn| {
            for item in items {
                Self::add_internal(conn, item)?;
            }
            Ok(())
        })
    }

    /// 删除记录，返回是否确实删除了数据
    pub fn delete(&self, collection: Collection, key: &str) -> StorageResult<bool> {
        self.with_conn(|conn| {
            let sql = format!("DELETE FROM {} WHERE key = ?1", collection.table());
            let affected = conn.execute(&sql, params![key])?;
            Ok(affected > 0)
        })
    }

    /// 清空集合
    pub fn clear(&self, collection: Collection) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(&format!("DELETE FROM {}", collection.table()), [])?;
            tracing::debug!(collection = collection.name(), "collection cleared");
            Ok(())
        })
    }

    // ============================================================
    // 读操作
    // ============================================================

    /// 根据主键获取记录
    pub fn get<T: Record>(&self, key: &str) -> StorageResult<Option<T>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT data FROM {} WHERE key = ?1", T::COLLECTION.table());
            let result = conn.query_row(&sql, params![key], |row| row.get::<_, String>(0));

            match result {
                Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// 获取集合中全部记录，按主键排序
    pub fn get_all<T: Record>(&self) -> StorageResult<Vec<T>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT data FROM {} ORDER BY key", T::COLLECTION.table());
            Self::query_records(conn, &sql, Vec::new())
        })
    }

    /// 按索引精确查询
    pub fn get_by_index<T: Record>(
        &self,
        index: &str,
        value: impl Into<IndexValue>,
    ) -> StorageResult<Vec<T>> {
        let column = Self::index_column::<T>(index)?;
        let value = value.into();

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT data FROM {} WHERE {} = ?1 ORDER BY key",
                T::COLLECTION.table(),
                column
            );
            Self::query_records(conn, &sql, vec![value])
        })
    }

    /// 按索引范围查询（闭区间，边界可省略），按索引值再按主键排序
    pub fn get_by_index_range<T: Record>(
        &self,
        index: &str,
        lower: Option<IndexValue>,
        upper: Option<IndexValue>,
    ) -> StorageResult<Vec<T>> {
        let column = Self::index_column::<T>(index)?;

        let mut conditions = vec![format!("{column} IS NOT NULL")];
        let mut values = Vec::new();
        if let Some(lower) = lower {
            values.push(lower);
            conditions.push(format!("{column} >= ?{}", values.len()));
        }
        if let Some(upper) = upper {
            values.push(upper);
            conditions.push(format!("{column} <= ?{}", values.len()));
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT data FROM {} WHERE {} ORDER BY {}, key",
                T::COLLECTION.table(),
                conditions.join(" AND "),
                column
            );
            Self::query_records(conn, &sql, values)
        })
    }

    /// 一个索引等值、另一个索引范围查询，结果按范围索引排序
    ///
    /// 对应 `(等值列, 范围列)` 组合索引，例如按用户查询到期进度。
    pub fn get_by_index_and_range<T: Record>(
        &self,
        eq_index: &str,
        eq_value: impl Into<IndexValue>,
        range_index: &str,
        lower: Option<IndexValue>,
        upper: Option<IndexValue>,
    ) -> StorageResult<Vec<T>> {
        let eq_column = Self::index_column::<T>(eq_index)?;
        let column = Self::index_column::<T>(range_index)?;

        let mut values = vec![eq_value.into()];
        let mut conditions = vec![format!("{eq_column} = ?1"), format!("{column} IS NOT NULL")];
        if let Some(lower) = lower {
            values.push(lower);
            conditions.push(format!("{column} >= ?{}", values.len()));
        }
        if let Some(upper) = upper {
            values.push(upper);
            conditions.push(format!("{column} <= ?{}", values.len()));
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT data FROM {} WHERE {} ORDER BY {}, key",
                T::COLLECTION.table(),
                conditions.join(" AND "),
                column
            );
            Self::query_records(conn, &sql, values)
        })
    }

    /// 过滤全部记录
    pub fn search<T, F>(&self, predicate: F) -> StorageResult<Vec<T>>
    where
        T: Record,
        F: Fn(&T) -> bool,
    {
        let all = self.get_all::<T>()?;
        Ok(all.into_iter().filter(|item| predicate(item)).collect())
    }

    /// 集合记录数
    pub fn count(&self, collection: Collection) -> StorageResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", collection.table()),
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // ============================================================
    // 内部实现
    // ============================================================

    fn index_column<T: Record>(index: &str) -> StorageResult<&'static str> {
        T::COLLECTION
            .index_column(index)
            .ok_or_else(|| StorageError::UnknownIndex {
                collection: T::COLLECTION.name(),
                index: index.to_string(),
            })
    }

    fn add_internal<T: Record>(conn: &Connection, item: &T) -> StorageResult<()> {
        let key = item.key();
        let exists: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE key = ?1)",
                T::COLLECTION.table()
            ),
            params![key],
            |row| row.get(0),
        )?;

        if exists {
            return Err(StorageError::DuplicateKey {
                collection: T::COLLECTION.name(),
                key,
            });
        }

        Self::write_internal(conn, item, false)
    }

    fn write_internal<T: Record>(conn: &Connection, item: &T, upsert: bool) -> StorageResult<()> {
        let collection = T::COLLECTION;
        let specs = collection.indexes();

        let mut columns = vec!["key", "data"];
        columns.extend(specs.iter().map(|spec| spec.column));

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            collection.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        if upsert {
            let updates: Vec<String> = columns[1..]
                .iter()
                .map(|column| format!("{column} = excluded.{column}"))
                .collect();
            sql.push_str(&format!(
                " ON CONFLICT(key) DO UPDATE SET {}",
                updates.join(", ")
            ));
        }

        let mut values = vec![
            IndexValue::Text(item.key()),
            IndexValue::Text(serde_json::to_string(item)?),
        ];
        values.extend(specs.iter().map(|spec| item.index_value(spec.name)));

        conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    fn query_records<T: Record>(
        conn: &Connection,
        sql: &str,
        values: Vec<IndexValue>,
    ) -> StorageResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(StorageError::from))
            .collect()
    }
}
