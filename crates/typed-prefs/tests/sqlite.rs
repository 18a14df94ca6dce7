//! Preferences backed by the bundled SQLite plain store.
#![cfg(not(target_arch = "wasm32"))]

use typed_prefs::{PlainStoreConfiguration, PreferenceStore, StoreSettings};

fn settings(dir: &tempfile::TempDir) -> StoreSettings {
    StoreSettings {
        plain: PlainStoreConfiguration::Sqlite {
            folder_path: dir.path().to_path_buf(),
            db_name: "preferences".to_string(),
        },
        ..StoreSettings::default()
    }
}

#[tokio::test]
async fn values_survive_reinitialization() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();
        store.preference("darkMode", false).update(true).await.unwrap();
        store.preference("launches", 0i64).update(3).await.unwrap();
        store
            .preference("favorites", Vec::<String>::new())
            .update(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
    }

    let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();
    assert!(store.preference("darkMode", false).read().await.unwrap());
    assert_eq!(store.preference("launches", 0i64).read().await.unwrap(), 3);
    assert_eq!(
        store
            .preference("favorites", Vec::<String>::new())
            .read()
            .await
            .unwrap(),
        ["a", "b"]
    );
}

#[tokio::test]
async fn secure_values_are_not_written_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();

    let token = store.secure_preference("authToken", String::new());
    token.update("abc123".to_string()).await.unwrap();

    assert_eq!(token.read().await.unwrap(), "abc123");
    assert_eq!(store.plain().get_string("authToken").await.unwrap(), None);
}

#[tokio::test]
async fn clear_all_empties_database() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();
    let scale = store.preference("scale", 1.0f64);
    scale.update(2.5).await.unwrap();

    store.clear_all().await.unwrap();

    assert_eq!(scale.read().await.unwrap(), 1.0);
    assert_eq!(store.plain().get_double("scale").await.unwrap(), None);
}

#[tokio::test]
async fn default_secure_store_does_not_persist() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();
        store.preference("darkMode", false).update(true).await.unwrap();
        store
            .secure_preference("authToken", String::new())
            .update("abc123".to_string())
            .await
            .unwrap();
    }

    let store = PreferenceStore::init(Some(settings(&dir))).await.unwrap();
    assert!(store.preference("darkMode", false).read().await.unwrap());
    assert_eq!(
        store
            .secure_preference("authToken", String::new())
            .read()
            .await
            .unwrap(),
        ""
    );
}
