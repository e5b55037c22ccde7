mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{
    ApiSettings, CollaboratorSettings, ConfigError, CorsSettings, DatabaseSettings, Environment,
    RuntimeSettings, SecuritySettings, Settings, TelemetrySettings,
};
