pub mod settings;

pub use settings::{AssetConfig, BehaviorConfig, Config, ConfigError, DiffConfig, GitConfig};
