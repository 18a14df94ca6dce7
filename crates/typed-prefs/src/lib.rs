#![doc = include_str!("../README.md")]

/// Conversion between typed values and their stored string form.
pub mod codec;

/// Change notification for individual preferences.
pub mod notifier;

/// Typed preference handles.
pub mod preference;

/// The store owning both backends.
pub mod registry;

mod settings;

/// Storage backend interfaces and the bundled implementations.
pub mod store;

pub use codec::{
    Codec, CodecError, JsonCodec, Mapping, PreferenceKind, PreferenceValue, PrimitiveCodec,
};
pub use notifier::{ReceiveError, Subscription};
pub use preference::{
    BoolPreference, DoublePreference, IntPreference, MapPreference, Preference, PreferenceError,
    StringListPreference, StringPreference,
};
pub use registry::{PreferenceStore, StoreInitError};
pub use settings::{
    DecodeFailurePolicy, PlainStoreConfiguration, StoreSettings, DEFAULT_NOTIFIER_CAPACITY,
};
pub use store::{MemoryPlainStore, MemorySecureStore, PlainStore, SecureStore, StoreError};
#[cfg(not(target_arch = "wasm32"))]
pub use store::SqlitePlainStore;
