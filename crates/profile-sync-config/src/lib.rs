pub mod config;
pub mod paths;

pub use config::{
    Config, InstanceConfig, IntakeConfig, ReconcilerSettings, ScheduleConfig, SearchSettings,
    WebhookConfig,
};
pub use paths::{container_base_path, PathManager};
