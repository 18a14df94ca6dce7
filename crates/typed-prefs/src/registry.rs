use std::sync::Arc;

use crate::{
    codec::PreferenceValue,
    preference::Preference,
    settings::{PlainStoreConfiguration, StoreSettings},
    store::{MemoryPlainStore, MemorySecureStore, PlainStore, SecureStore, StoreError},
};

/// Errors that can occur while initializing a [`PreferenceStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreInitError {
    /// The configured plain backend is not available on this platform
    #[error("Plain store not supported on this platform: {0:?}")]
    UnsupportedConfiguration(PlainStoreConfiguration),

    /// Opening the plain backend failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the plain and secure backends and hands out [`Preference`] handles bound to them.
///
/// Create one per application (or per user) at startup and share it; clones refer to the same
/// backends.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    plain: Arc<dyn PlainStore>,
    secure: Arc<dyn SecureStore>,
    settings: StoreSettings,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl PreferenceStore {
    /// Opens the plain backend described by the settings and creates an in-memory secure store.
    ///
    /// Secure values do not outlive the process. Use [`PreferenceStore::init_with_secure_store`]
    /// to keep them in a platform keychain.
    ///
    /// Every call opens a new set of backends. Call it once at startup and share the result.
    pub async fn init(settings: Option<StoreSettings>) -> Result<Self, StoreInitError> {
        let settings = settings.unwrap_or_default();
        if !matches!(settings.plain, PlainStoreConfiguration::Memory) {
            tracing::warn!(
                plain = ?settings.plain,
                "Plain preferences are persisted but secure preferences are kept in memory"
            );
        }

        Self::init_with_secure_store(Some(settings), Arc::new(MemorySecureStore::new())).await
    }

    /// Opens the plain backend described by the settings and uses a client-managed secure store,
    /// such as the platform keychain.
    pub async fn init_with_secure_store(
        settings: Option<StoreSettings>,
        secure: Arc<dyn SecureStore>,
    ) -> Result<Self, StoreInitError> {
        let settings = settings.unwrap_or_default();
        let plain = open_plain_store(&settings.plain).await?;

        tracing::info!(plain = ?settings.plain, "Initialized preference store");
        Ok(Self::from_backends(plain, secure, settings))
    }

    /// Creates a store over client-managed backends.
    pub fn from_backends(
        plain: Arc<dyn PlainStore>,
        secure: Arc<dyn SecureStore>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                plain,
                secure,
                settings,
            }),
        }
    }

    /// Creates a handle to a preference kept in the plain backend.
    pub fn preference<T: PreferenceValue>(
        &self,
        key: impl Into<String>,
        default_value: T,
    ) -> Preference<T> {
        Preference::new(self.clone(), key.into(), default_value, false)
    }

    /// Creates a handle to a preference kept in the secure backend.
    pub fn secure_preference<T: PreferenceValue>(
        &self,
        key: impl Into<String>,
        default_value: T,
    ) -> Preference<T> {
        Preference::new(self.clone(), key.into(), default_value, true)
    }

    /// Removes every value from both backends.
    ///
    /// This is a bulk, backend-level operation: subscribers of live preferences are not
    /// notified. If the plain store fails to clear, the secure store is left untouched.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.inner.plain.clear().await?;
        self.inner.secure.delete_all().await?;

        tracing::info!("Cleared all preferences");
        Ok(())
    }

    /// The plain backend.
    pub fn plain(&self) -> &dyn PlainStore {
        self.inner.plain.as_ref()
    }

    /// The secure backend.
    pub fn secure(&self) -> &dyn SecureStore {
        self.inner.secure.as_ref()
    }

    /// The settings the store was created with.
    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }
}

async fn open_plain_store(
    configuration: &PlainStoreConfiguration,
) -> Result<Arc<dyn PlainStore>, StoreInitError> {
    match configuration {
        PlainStoreConfiguration::Memory => Ok(Arc::new(MemoryPlainStore::new())),
        #[cfg(not(target_arch = "wasm32"))]
        PlainStoreConfiguration::Sqlite {
            folder_path,
            db_name,
        } => {
            let store = crate::store::SqlitePlainStore::open(folder_path.clone(), db_name).await?;
            Ok(Arc::new(store))
        }
        #[cfg(target_arch = "wasm32")]
        other => Err(StoreInitError::UnsupportedConfiguration(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_defaults_to_memory_backends() {
        let store = PreferenceStore::init(None).await.unwrap();
        assert_eq!(store.settings(), &StoreSettings::default());

        store.plain().set_bool("darkMode", true).await.unwrap();
        assert_eq!(store.plain().get_bool("darkMode").await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_init_uses_client_managed_secure_store() {
        let secure = MemorySecureStore::new();
        let store = PreferenceStore::init_with_secure_store(None, Arc::new(secure.clone()))
            .await
            .unwrap();

        store
            .secure_preference("authToken", String::new())
            .update("abc123".to_string())
            .await
            .unwrap();

        assert_eq!(secure.read("authToken").await.unwrap(), Some("abc123".into()));
    }

    #[tokio::test]
    async fn test_clones_share_backends() {
        let store = PreferenceStore::init(None).await.unwrap();
        let clone = store.clone();

        store.preference("launches", 0i64).update(4).await.unwrap();

        assert_eq!(clone.preference("launches", 0i64).read().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_backends() {
        let plain = MemoryPlainStore::new();
        let secure = MemorySecureStore::new();
        let store = PreferenceStore::from_backends(
            Arc::new(plain.clone()),
            Arc::new(secure.clone()),
            StoreSettings::default(),
        );

        let dark_mode = store.preference("darkMode", false);
        let token = store.secure_preference("authToken", String::new());
        dark_mode.update(true).await.unwrap();
        token.update("abc123".to_string()).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(plain.keys().await.is_empty());
        assert!(secure.keys().await.is_empty());
        assert!(!dark_mode.read().await.unwrap());
        assert_eq!(token.read().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_clear_all_does_not_notify() {
        let store = PreferenceStore::init(None).await.unwrap();
        let dark_mode = store.preference("darkMode", false);
        dark_mode.update(true).await.unwrap();

        let mut changes = dark_mode.subscribe();
        store.clear_all().await.unwrap();

        assert_eq!(changes.try_recv(), Ok(None));
    }
}
