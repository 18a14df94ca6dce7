use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use tokio::sync::Mutex;

use super::{NativeValue, PlainStore, StoreError};

/// Plain store persisted in a SQLite database file.
///
/// Every value lives in a single `preferences` table, tagged with the native type it was
/// written with.
#[derive(Clone)]
pub struct SqlitePlainStore(Arc<Mutex<rusqlite::Connection>>);

impl std::fmt::Debug for SqlitePlainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePlainStore").finish()
    }
}

impl SqlitePlainStore {
    /// Opens (creating if needed) `<folder_path>/<db_name>.sqlite`.
    pub async fn open(folder_path: PathBuf, db_name: &str) -> Result<Self, StoreError> {
        let path = folder_path.join(format!("{db_name}.sqlite"));

        let db = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || open_connection(&path))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))??
        };

        tracing::debug!(path = %path.display(), "Opened SQLite preference store");
        Ok(SqlitePlainStore(Arc::new(Mutex::new(db))))
    }

    async fn get_raw(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.0.lock().await;
        let mut stmt = conn.prepare("SELECT kind, value FROM preferences WHERE key = ?1")?;
        let mut rows = stmt.query(rusqlite::params![key])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let kind: String = row.get(0)?;
        if kind != expected {
            return Err(StoreError::TypeMismatch {
                key: key.to_owned(),
                expected,
            });
        }
        Ok(Some(row.get(1)?))
    }

    async fn get_parsed<T: FromStr>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, StoreError> {
        match self.get_raw(key, expected).await? {
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                StoreError::Backend(format!("Corrupt {expected} value stored for key '{key}'"))
            }),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: NativeValue) -> Result<bool, StoreError> {
        let kind = value.type_name();
        let raw = match value {
            NativeValue::String(v) => v,
            NativeValue::Bool(v) => v.to_string(),
            NativeValue::Int(v) => v.to_string(),
            NativeValue::Double(v) => v.to_string(),
        };

        let mut conn = self.0.lock().await;
        let transaction = conn.transaction()?;

        let changed = transaction.execute(
            "INSERT OR REPLACE INTO preferences (key, kind, value) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, kind, raw],
        )?;

        transaction.commit()?;
        Ok(changed > 0)
    }
}

fn open_connection(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    let db = rusqlite::Connection::open(path)?;

    // Set WAL mode for better concurrency
    db.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

    db.execute(
        "CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(db)
}

#[async_trait::async_trait]
impl PlainStore for SqlitePlainStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_raw(key, "string").await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.get_parsed(key, "bool").await
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.get_parsed(key, "int").await
    }

    async fn get_double(&self, key: &str) -> Result<Option<f64>, StoreError> {
        self.get_parsed(key, "double").await
    }

    async fn set_string(&self, key: &str, value: String) -> Result<bool, StoreError> {
        self.set(key, NativeValue::String(value)).await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<bool, StoreError> {
        self.set(key, NativeValue::Bool(value)).await
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<bool, StoreError> {
        self.set(key, NativeValue::Int(value)).await
    }

    async fn set_double(&self, key: &str, value: f64) -> Result<bool, StoreError> {
        self.set(key, NativeValue::Double(value)).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.0.lock().await;
        let transaction = conn.transaction()?;

        transaction.execute(
            "DELETE FROM preferences WHERE key = ?1",
            rusqlite::params![key],
        )?;

        transaction.commit()?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let conn = self.0.lock().await;
        conn.execute("DELETE FROM preferences", [])?;
        Ok(())
    }
}
