use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Result};
use tracing::warn;

use crate::cache::SessionCache;
use crate::error::CacheError;

fn init_db(conn: &Connection) -> Result<()> {
    conn.execute(
        "create table if not exists session_cache (
            key text primary key,
            value text not null
        )",
        [],
    )?;
    Ok(())
}

/// Session cache kept in a SQLite table.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// A store that disappears with the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(SqliteCache { conn: Mutex::new(conn) })
    }

    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        init_db(&conn)?;
        Ok(SqliteCache { conn: Mutex::new(conn) })
    }

    fn lookup(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT value FROM session_cache WHERE key = (?1)")?;
        stmt.query_row(params![key], |row| row.get(0)).optional()
    }
}

impl SessionCache for SqliteCache {
    fn get(&self, key: &str) -> Option<String> {
        match self.lookup(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "session cache read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), CacheError> {
        self.conn.lock().execute(
            "INSERT INTO session_cache (key, value) values (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_value() {
        let cache = SqliteCache::in_memory().unwrap();
        assert_eq!(cache.get("openlib:x"), None);

        cache.set("openlib:x", "{\"books\":[],\"total\":1}").unwrap();
        cache.set("openlib:x", "{\"books\":[],\"total\":2}").unwrap();

        assert_eq!(
            cache.get("openlib:x").as_deref(),
            Some("{\"books\":[],\"total\":2}")
        );
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        SqliteCache::open(&path).unwrap().set("k", "v").unwrap();
        let reopened = SqliteCache::open(&path).unwrap();

        assert_eq!(reopened.get("k").as_deref(), Some("v"));
    }
}
