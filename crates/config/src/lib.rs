// Configuration loading

pub mod settings;

pub use settings::{ConfigError, EmptyInboxPolicy, Layout, Settings, SETTINGS_FILE};
