//! Typed handles to individual preference values.

use crate::{
    codec::{Codec, CodecError, PreferenceKind, PreferenceValue},
    notifier::{Notifier, Subscription},
    registry::PreferenceStore,
    settings::DecodeFailurePolicy,
    store::{self, NativeValue, StoreError},
};

/// Errors that can occur when reading or writing a preference.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Backend operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Encoding or decoding the value failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The plain backend declined the write
    #[error("Storage backend rejected the write for key '{key}'")]
    WriteRejected {
        /// Key that was being written
        key: String,
    },
}

/// A handle to a single named, typed preference.
///
/// Obtained via [`PreferenceStore::preference`] or [`PreferenceStore::secure_preference`]. The
/// secure flag is fixed at construction and decides which backend every operation goes to.
///
/// # Example
/// ```rust
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use typed_prefs::PreferenceStore;
///
/// let store = PreferenceStore::init(None).await?;
/// let dark_mode = store.preference("darkMode", false);
///
/// let mut changes = dark_mode.subscribe();
/// dark_mode.update(true).await?;
///
/// assert!(dark_mode.read().await?);
/// assert!(changes.recv().await?);
/// # Ok(())
/// # }
/// ```
pub struct Preference<T: PreferenceValue> {
    store: PreferenceStore,
    key: String,
    default_value: T,
    secure: bool,
    codec: Box<dyn Codec<T>>,
    notifier: Notifier<T>,
}

/// A boolean preference.
pub type BoolPreference = Preference<bool>;
/// An integer preference.
pub type IntPreference = Preference<i64>;
/// A floating-point preference.
pub type DoublePreference = Preference<f64>;
/// A text preference.
pub type StringPreference = Preference<String>;
/// An ordered list of strings, always stored as JSON.
pub type StringListPreference = Preference<Vec<String>>;
/// A string-keyed mapping, always stored as JSON.
pub type MapPreference = Preference<crate::codec::Mapping>;

impl<T: PreferenceValue> Preference<T> {
    pub(crate) fn new(
        store: PreferenceStore,
        key: String,
        default_value: T,
        secure: bool,
    ) -> Self {
        let notifier = Notifier::new(store.settings().notifier_capacity);
        Self {
            store,
            key,
            default_value,
            secure,
            codec: Box::new(T::Codec::default()),
            notifier,
        }
    }

    /// Replaces the codec used for this preference.
    ///
    /// The codec is used for every value stored as a string: all values of a secure
    /// preference, and structured kinds in the plain store. Primitive kinds in the plain store
    /// are stored natively and never go through it.
    pub fn with_codec(mut self, codec: impl Codec<T> + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// The storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value returned when nothing is stored.
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Whether this preference lives in the secure backend.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// The value kind of this preference.
    pub fn kind(&self) -> PreferenceKind {
        T::KIND
    }

    /// Reads the current value, or the default value if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails, or if the stored value cannot be decoded and the
    /// store uses [`DecodeFailurePolicy::Strict`].
    pub async fn read(&self) -> Result<T, PreferenceError> {
        if self.secure {
            let raw = self.store.secure().read(&self.key).await?;
            return self.decode(raw.as_deref());
        }

        let plain = self.store.plain();
        let native = match T::KIND {
            PreferenceKind::Boolean => plain.get_bool(&self.key).await?.map(NativeValue::Bool),
            PreferenceKind::Integer => plain.get_int(&self.key).await?.map(NativeValue::Int),
            PreferenceKind::Float => plain.get_double(&self.key).await?.map(NativeValue::Double),
            PreferenceKind::Text => plain.get_string(&self.key).await?.map(NativeValue::String),
            PreferenceKind::TextList | PreferenceKind::Mapping => {
                let raw = plain.get_string(&self.key).await?;
                return self.decode(raw.as_deref());
            }
        };

        Ok(native
            .and_then(T::from_native)
            .unwrap_or_else(|| self.default_value.clone()))
    }

    /// Writes `value`, or removes the stored value when given `None`.
    ///
    /// Subscribers receive `value` (or the default value, on removal) once the backend has
    /// accepted the change.
    pub async fn update_value(&self, value: Option<T>) -> Result<(), PreferenceError> {
        match value {
            Some(value) => self.update(value).await,
            None => self.remove().await,
        }
    }

    /// Writes `value` and notifies subscribers with it.
    pub async fn update(&self, value: T) -> Result<(), PreferenceError> {
        let native = if self.secure { None } else { value.to_native() };

        let accepted = match native {
            Some(native) => store::set_native(self.store.plain(), &self.key, native).await?,
            None => {
                let raw = self.codec.encode(&value)?;
                if self.secure {
                    self.store.secure().write(&self.key, raw).await?;
                    true
                } else {
                    self.store.plain().set_string(&self.key, raw).await?
                }
            }
        };

        if !accepted {
            tracing::warn!(key = %self.key, "Storage backend rejected preference write");
            return Err(PreferenceError::WriteRejected {
                key: self.key.clone(),
            });
        }

        tracing::debug!(key = %self.key, secure = self.secure, "Updated preference");
        self.notifier.notify(value);
        Ok(())
    }

    /// Removes the stored value and notifies subscribers with the default value.
    pub async fn remove(&self) -> Result<(), PreferenceError> {
        if self.secure {
            self.store.secure().delete(&self.key).await?;
        } else {
            self.store.plain().remove(&self.key).await?;
        }

        tracing::debug!(key = %self.key, secure = self.secure, "Removed preference");
        self.notifier.notify(self.default_value.clone());
        Ok(())
    }

    /// Subscribes to changes made through this handle.
    ///
    /// Changes made through other handles to the same key, or by
    /// [`PreferenceStore::clear_all`], are not observed. A subscriber that falls more than
    /// [`StoreSettings::notifier_capacity`](crate::StoreSettings::notifier_capacity) values
    /// behind skips the oldest ones and gets [`ReceiveError::Lagged`](crate::ReceiveError::Lagged).
    pub fn subscribe(&self) -> Subscription<T> {
        self.notifier.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Closes every open subscription. Stored data is not touched, and [`Preference::subscribe`]
    /// can be used again afterwards.
    pub fn dispose(&self) {
        self.notifier.close();
    }

    fn decode(&self, raw: Option<&str>) -> Result<T, PreferenceError> {
        let Some(raw) = raw else {
            return Ok(self.default_value.clone());
        };

        match self.codec.decode(raw, &self.default_value) {
            Ok(value) => Ok(value),
            Err(e) => match self.store.settings().decode_failure {
                DecodeFailurePolicy::Strict => Err(e.into()),
                DecodeFailurePolicy::Fallback => {
                    tracing::warn!(
                        key = %self.key,
                        error = %e,
                        "Using default for undecodable preference"
                    );
                    Ok(self.default_value.clone())
                }
            },
        }
    }
}

impl<T: PreferenceValue> std::fmt::Debug for Preference<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preference")
            .field("key", &self.key)
            .field("kind", &T::KIND)
            .field("secure", &self.secure)
            .finish()
    }
}
