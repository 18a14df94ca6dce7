use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use super::{NativeValue, PlainStore, SecureStore, StoreError};

/// In-memory plain store using a HashMap behind a RwLock.
///
/// Values keep the native type they were written with, so reading a key through the getter of
/// another type fails with [`StoreError::TypeMismatch`], the same way platform preference stores
/// behave. Suitable for tests and for applications that do not need persistence.
#[derive(Clone, Default)]
pub struct MemoryPlainStore {
    values: Arc<RwLock<HashMap<String, NativeValue>>>,
}

impl MemoryPlainStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists the stored keys, in no particular order.
    pub async fn keys(&self) -> Vec<String> {
        self.values.read().await.keys().cloned().collect()
    }

    async fn get_native(&self, key: &str) -> Option<NativeValue> {
        self.values.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: NativeValue) -> Result<bool, StoreError> {
        self.values.write().await.insert(key.to_owned(), value);
        Ok(true)
    }
}

fn mismatch(key: &str, expected: &'static str) -> StoreError {
    StoreError::TypeMismatch {
        key: key.to_owned(),
        expected,
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl PlainStore for MemoryPlainStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get_native(key).await {
            None => Ok(None),
            Some(NativeValue::String(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key, "string")),
        }
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        match self.get_native(key).await {
            None => Ok(None),
            Some(NativeValue::Bool(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key, "bool")),
        }
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self.get_native(key).await {
            None => Ok(None),
            Some(NativeValue::Int(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key, "int")),
        }
    }

    async fn get_double(&self, key: &str) -> Result<Option<f64>, StoreError> {
        match self.get_native(key).await {
            None => Ok(None),
            Some(NativeValue::Double(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key, "double")),
        }
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
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.values.write().await.clear();
        Ok(())
    }
}

/// In-memory secure store.
///
/// Offers no protection at rest. Intended for tests and as the default secure handle until a
/// client-managed implementation (keychain, keystore, credential manager) is supplied.
#[derive(Clone, Default)]
pub struct MemorySecureStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySecureStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists the stored keys, in no particular order.
    pub async fn keys(&self) -> Vec<String> {
        self.values.read().await.keys().cloned().collect()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl SecureStore for MemorySecureStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.values.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_typed_round_trip() {
        let store = MemoryPlainStore::new();

        assert!(store.set_bool("darkMode", true).await.unwrap());
        assert!(store.set_int("launches", -3).await.unwrap());
        assert!(store.set_double("scale", 1.25).await.unwrap());
        assert!(store.set_string("name", "ada".into()).await.unwrap());

        assert_eq!(store.get_bool("darkMode").await.unwrap(), Some(true));
        assert_eq!(store.get_int("launches").await.unwrap(), Some(-3));
        assert_eq!(store.get_double("scale").await.unwrap(), Some(1.25));
        assert_eq!(store.get_string("name").await.unwrap(), Some("ada".into()));
    }

    #[tokio::test]
    async fn test_plain_missing_key_is_none() {
        let store = MemoryPlainStore::new();
        assert_eq!(store.get_bool("missing").await.unwrap(), None);
        assert_eq!(store.get_string("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_plain_cross_type_read_is_mismatch() {
        let store = MemoryPlainStore::new();
        store.set_int("launches", 3).await.unwrap();

        let err = store.get_bool("launches").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::TypeMismatch { expected: "bool", .. }
        ));
    }

    #[tokio::test]
    async fn test_plain_remove_and_clear() {
        let store = MemoryPlainStore::new();
        store.set_bool("a", true).await.unwrap();
        store.set_bool("b", false).await.unwrap();

        store.remove("a").await.unwrap();
        store.remove("never-written").await.unwrap();
        assert_eq!(store.keys().await, vec!["b".to_string()]);

        store.clear().await.unwrap();
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_secure_round_trip_and_delete_all() {
        let store = MemorySecureStore::new();
        store.write("authToken", "abc123".into()).await.unwrap();
        store.write("refreshToken", "def456".into()).await.unwrap();

        assert_eq!(store.read("authToken").await.unwrap(), Some("abc123".into()));

        store.delete("authToken").await.unwrap();
        assert_eq!(store.read("authToken").await.unwrap(), None);

        store.delete_all().await.unwrap();
        assert!(store.keys().await.is_empty());
    }
}
