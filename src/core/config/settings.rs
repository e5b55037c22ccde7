use super::parsing::{
    env_optional, env_or_default, parse_base_url, parse_bool, parse_cors_origins,
    parse_environment, parse_u16, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    ApiSettings, CollaboratorSettings, ConfigError, CorsSettings, DatabaseSettings,
    RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QUIZDESK_HOST", "0.0.0.0");
        let port = env_or_default("QUIZDESK_PORT", "8000");

        let environment =
            parse_environment(env_optional("QUIZDESK_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("QUIZDESK_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Quizdesk API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let (secret_key, secret_key_from_env) = match env_optional("SECRET_KEY") {
            Some(value) => (value, true),
            None => (load_or_create_secret_key(), false),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "quizdesk");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "quizdesk");
        let database_url = env_optional("DATABASE_URL");

        let ai_base_url = parse_base_url(env_optional("AI_BASE_URL"), "http://127.0.0.1:8001");
        let ai_request_timeout =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "300"))?;
        let sim_base_url = parse_base_url(env_optional("SIM_BASE_URL"), "http://127.0.0.1:8002");
        let sim_request_timeout =
            parse_u64("SIM_REQUEST_TIMEOUT", env_or_default("SIM_REQUEST_TIMEOUT", "60"))?;

        let log_level = env_or_default("QUIZDESK_LOG_LEVEL", "info");
        let json = env_optional("QUIZDESK_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings {
                secret_key,
                secret_key_from_env,
                access_token_expire_minutes,
                algorithm,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            collaborators: CollaboratorSettings {
                ai_base_url,
                ai_request_timeout,
                sim_base_url,
                sim_request_timeout,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn collaborators(&self) -> &CollaboratorSettings {
        &self.collaborators
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.algorithm != "HS256" {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if self.collaborators.ai_request_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AI_REQUEST_TIMEOUT",
                value: "0".to_string(),
            });
        }

        if self.collaborators.sim_request_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SIM_REQUEST_TIMEOUT",
                value: "0".to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if !self.security.secret_key_from_env {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }
        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}
