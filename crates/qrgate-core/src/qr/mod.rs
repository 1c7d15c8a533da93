//! QR code configuration: the value object and its observable store.

pub mod options;
pub mod store;

pub use options::{
    ConfigUpdate, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, DEFAULT_SIZE, EcLevel, MAX_SIZE, MIN_SIZE,
    ParseLevelError, QrConfig, clamp_size,
};
pub use store::ConfigStore;
