//! 数据库迁移模块
//!
//! 管理 SQLite schema 的版本迁移。
//!
//! ## 迁移策略
//! - 每个迁移与其版本记录在同一个 `IMMEDIATE` 事务中提交，失败时整体回滚
//! - 已应用的版本记录在 schema_migrations 表中，重复运行是幂等的

use std::collections::HashSet;

use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use crate::storage::{StorageError, StorageResult};

/// 当前数据库 schema 版本
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// 迁移定义
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// 全部迁移，按版本号排序
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "初始集合与索引",
        sql: include_str!("schema.sql"),
    },
    Migration {
        version: 2,
        name: "复习与会话查询索引",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_user_progress_user_next_review
                ON user_progress(idx_user_id, idx_next_review);

            CREATE INDEX IF NOT EXISTS idx_study_sessions_user_start
                ON study_sessions(idx_user_id, idx_start_time);
        "#,
    },
];

/// 已应用的迁移记录
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i32,
    pub name: String,
    pub applied_at: i64,
}

fn ensure_migrations_table(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );
        "#,
    )
    .map_err(|e| StorageError::Migration(format!("创建迁移表失败: {}", e)))
}

/// 当前数据库版本，没有迁移记录时为 0
pub fn get_current_version(conn: &Connection) -> StorageResult<i32> {
    ensure_migrations_table(conn)?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn applied_versions(conn: &Connection) -> StorageResult<HashSet<i32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<HashSet<i32>, _>>()?;
    Ok(versions)
}

/// 运行尚未应用的迁移，返回迁移后的版本号
pub fn run_migrations(conn: &Connection) -> StorageResult<i32> {
    ensure_migrations_table(conn)?;
    let applied = applied_versions(conn)?;

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| !applied.contains(&migration.version))
        .collect();

    if pending.is_empty() {
        tracing::debug!(version = CURRENT_SCHEMA_VERSION, "schema up to date");
    }

    for migration in pending {
        tracing::info!(version = migration.version, name = migration.name, "applying migration");
        if let Err(e) = apply_migration(conn, migration) {
            tracing::error!(version = migration.version, error = %e, "migration failed");
            return Err(e);
        }
    }

    get_current_version(conn)
}

/// 在事务中执行迁移并写入版本记录；事务未提交即被丢弃时自动回滚
fn apply_migration(conn: &Connection, migration: &Migration) -> StorageResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    tx.execute_batch(migration.sql).map_err(|e| {
        StorageError::Migration(format!("迁移 v{} 执行失败: {}", migration.version, e))
    })?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, chrono::Utc::now().timestamp()],
    )?;

    tx.commit()?;
    Ok(())
}

/// 获取迁移历史
pub fn get_migration_history(conn: &Connection) -> StorageResult<Vec<MigrationRecord>> {
    ensure_migrations_table(conn)?;

    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM schema_migrations ORDER BY version")?;

    let records = stmt
        .query_map([], |row| {
            Ok(MigrationRecord {
                version: row.get(0)?,
                name: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Collection;

    fn setup_test_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_migrations_are_ordered() {
        assert_eq!(MIGRATIONS.len(), 2);
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
        assert_eq!(
            MIGRATIONS.last().map(|m| m.version),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_initial_migration_creates_all_collections() {
        let conn = setup_test_db();

        let version = run_migrations(&conn).expect("Migration should succeed");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        for collection in Collection::ALL {
            assert!(
                table_exists(&conn, collection.table()),
                "missing table {}",
                collection.table()
            );
        }
    }

    #[test]
    fn test_index_columns_exist() {
        let conn = setup_test_db();
        run_migrations(&conn).unwrap();

        for collection in Collection::ALL {
            for spec in collection.indexes() {
                let sql = format!("SELECT {} FROM {} LIMIT 0", spec.column, collection.table());
                assert!(conn.prepare(&sql).is_ok(), "missing column {}", spec.column);
            }
        }
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = setup_test_db();

        run_migrations(&conn).expect("First migration should succeed");
        run_migrations(&conn).expect("Second migration should succeed");

        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(get_migration_history(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_migration_history() {
        let conn = setup_test_db();
        run_migrations(&conn).unwrap();

        let history = get_migration_history(&conn).unwrap();
        assert_eq!(history[0].version, 1);
        assert_eq!(history[0].name, "初始集合与索引");
        assert!(history[0].applied_at > 0);
    }

    #[test]
    fn test_failed_migration_is_rolled_back() {
        let conn = setup_test_db();
        ensure_migrations_table(&conn).unwrap();
        let broken = Migration {
            version: 99,
            name: "broken",
            sql: "CREATE TABLE t (id INTEGER); SELECT * FROM missing_table;",
        };

        let result = apply_migration(&conn, &broken);
        assert!(matches!(result, Err(StorageError::Migration(_))));
        assert!(!table_exists(&conn, "t"));
        assert_eq!(get_current_version(&conn).unwrap(), 0);
    }
}
