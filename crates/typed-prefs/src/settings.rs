use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Buffer size of each preference's change channel when not configured otherwise.
pub const DEFAULT_NOTIFIER_CAPACITY: usize = 16;

/// Settings for a [`PreferenceStore`](crate::PreferenceStore). They are fixed once the store is
/// initialized.
///
/// Defaults to
///
/// ```
/// # use typed_prefs::{DecodeFailurePolicy, PlainStoreConfiguration, StoreSettings};
/// let settings = StoreSettings {
///     plain: PlainStoreConfiguration::Memory,
///     notifier_capacity: 16,
///     decode_failure: DecodeFailurePolicy::Strict,
/// };
/// let default = StoreSettings::default();
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct StoreSettings {
    /// Backend used for non-sensitive values. Defaults to an in-memory store.
    pub plain: PlainStoreConfiguration,
    /// How many unread values a subscriber may fall behind before it starts missing values.
    pub notifier_capacity: usize,
    /// What `read` does with stored data that fails to decode.
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            plain: PlainStoreConfiguration::Memory,
            notifier_capacity: DEFAULT_NOTIFIER_CAPACITY,
            decode_failure: DecodeFailurePolicy::Strict,
        }
    }
}

/// Configuration of the plain backend opened by
/// [`PreferenceStore::init`](crate::PreferenceStore::init).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PlainStoreConfiguration {
    /// Values live in memory and are lost when the store is dropped.
    #[default]
    Memory,

    /// SQLite database, available on native platforms.
    #[serde(rename_all = "camelCase")]
    Sqlite {
        /// Folder holding the database file. Different users should use different folders or
        /// database names.
        folder_path: PathBuf,
        /// Name of the database file, without extension.
        db_name: String,
    },
}

/// Handling of stored data that cannot be decoded into the preference's type.
///
/// Absent values always resolve to the default; this only concerns values that are present but
/// malformed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DecodeFailurePolicy {
    /// Surface the decode error to the caller of `read`.
    #[default]
    Strict,
    /// Log a warning and return the default value.
    Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let settings: StoreSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let settings: StoreSettings = serde_json::from_str(
            r#"{
                "plain": { "type": "sqlite", "folderPath": "/tmp/app", "dbName": "prefs" },
                "notifierCapacity": 4,
                "decodeFailure": "fallback"
            }"#,
        )
        .unwrap();

        assert_eq!(
            settings.plain,
            PlainStoreConfiguration::Sqlite {
                folder_path: PathBuf::from("/tmp/app"),
                db_name: "prefs".to_string(),
            }
        );
        assert_eq!(settings.notifier_capacity, 4);
        assert_eq!(settings.decode_failure, DecodeFailurePolicy::Fallback);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_json::from_str::<StoreSettings>(r#"{ "plainStore": "memory" }"#);
        assert!(result.is_err());
    }
}
