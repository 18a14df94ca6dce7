//! Storage backend interfaces.
//!
//! A [`Preference`](crate::Preference) never talks to a concrete storage mechanism directly. It
//! goes through one of the two traits below, which are implemented either by the crate itself
//! (in-memory, SQLite) or by the embedding application (client-managed backends such as a
//! platform keychain).

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod sqlite;

pub use memory::{MemoryPlainStore, MemorySecureStore};
#[cfg(not(target_arch = "wasm32"))]
pub use sqlite::SqlitePlainStore;

/// Errors reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not complete the operation (I/O failure, unavailable service, etc.)
    #[error("Storage backend operation failed: {0}")]
    Backend(String),

    /// The key exists but holds a value of a different native type than the one requested.
    #[error("Stored value for key '{key}' is not of type {expected}")]
    TypeMismatch {
        /// Key that was read
        key: String,
        /// Native type the caller asked for
        expected: &'static str,
    },

    /// An internal database error.
    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Native value kinds understood by a [`PlainStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// UTF-8 text
    String(String),
    /// Boolean flag
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Double(f64),
}

impl NativeValue {
    /// Name of the native type, used for type-mismatch reporting and as the SQLite type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::String(_) => "string",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "int",
            NativeValue::Double(_) => "double",
        }
    }
}

/// Key-value store for non-sensitive values.
///
/// Primitive values are stored natively through the typed setters; everything else is stored
/// as a string. Setters return `Ok(false)` when the backend declined the write without an
/// underlying error.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait PlainStore: Send + Sync {
    /// Reads a string value.
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Reads a boolean value.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError>;
    /// Reads an integer value.
    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError>;
    /// Reads a floating-point value.
    async fn get_double(&self, key: &str) -> Result<Option<f64>, StoreError>;

    /// Stores a string value.
    async fn set_string(&self, key: &str, value: String) -> Result<bool, StoreError>;
    /// Stores a boolean value.
    async fn set_bool(&self, key: &str, value: bool) -> Result<bool, StoreError>;
    /// Stores an integer value.
    async fn set_int(&self, key: &str, value: i64) -> Result<bool, StoreError>;
    /// Stores a floating-point value.
    async fn set_double(&self, key: &str, value: f64) -> Result<bool, StoreError>;

    /// Removes a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Writes a native value through the matching typed setter.
pub(crate) async fn set_native(
    store: &dyn PlainStore,
    key: &str,
    value: NativeValue,
) -> Result<bool, StoreError> {
    match value {
        NativeValue::String(v) => store.set_string(key, v).await,
        NativeValue::Bool(v) => store.set_bool(key, v).await,
        NativeValue::Int(v) => store.set_int(key, v).await,
        NativeValue::Double(v) => store.set_double(key, v).await,
    }
}

/// Key-value store for sensitive values. Only strings are stored.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait SecureStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: String) -> Result<(), StoreError>;
    /// Deletes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Deletes every key.
    async fn delete_all(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = StoreError::Backend("disk full".to_string());
        assert_eq!(err.to_string(), "Storage backend operation failed: disk full");

        let err = StoreError::TypeMismatch {
            key: "darkMode".to_string(),
            expected: "bool",
        };
        assert_eq!(
            err.to_string(),
            "Stored value for key 'darkMode' is not of type bool"
        );
    }

    #[tokio::test]
    async fn test_set_native_dispatches_to_typed_setter() {
        let store = MemoryPlainStore::new();

        set_native(&store, "flag", NativeValue::Bool(true)).await.unwrap();
        set_native(&store, "count", NativeValue::Int(7)).await.unwrap();
        set_native(&store, "ratio", NativeValue::Double(0.5)).await.unwrap();
        set_native(&store, "name", NativeValue::String("bob".into()))
            .await
            .unwrap();

        assert_eq!(store.get_bool("flag").await.unwrap(), Some(true));
        assert_eq!(store.get_int("count").await.unwrap(), Some(7));
        assert_eq!(store.get_double("ratio").await.unwrap(), Some(0.5));
        assert_eq!(store.get_string("name").await.unwrap(), Some("bob".into()));
    }
}
