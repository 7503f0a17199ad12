use config::{Config, ConfigError, File};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    ConnectOptions,
};
use std::time;

const BUSY_TIMEOUT: time::Duration = time::Duration::from_secs(5);

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub json_port: u16,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub rpc_port: u16,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub path: String,
    pub create_if_missing: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
}

impl Settings {
    pub fn get_json_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_json_port()
        )
    }

    pub fn get_rpc_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_rpc_port()
        )
    }

    pub fn get_db_path(&self) -> String {
        self.database.get_path()
    }

    pub fn set_db_path(&mut self, path: String) {
        self.database.set_path(path)
    }

    pub fn set_json_port(&mut self, port: u16) {
        self.application.json_port = port;
    }

    pub fn set_rpc_port(&mut self, port: u16) {
        self.application.rpc_port = port;
    }
}

impl DatabaseSettings {
    pub fn get_db_options(&self) -> SqliteConnectOptions {
        let mut db_options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            // WAL lets readers proceed while SQLite serializes the writers
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        db_options
    }

    pub fn get_path(&self) -> String {
        self.path.clone()
    }

    pub fn get_max_connections(&self) -> u32 {
        self.max_connections.max(1)
    }

    pub fn set_path(&mut self, new_path: String) {
        self.path = new_path
    }
}

impl ApplicationSettings {
    pub fn get_host(&self) -> String {
        self.host.clone()
    }

    pub fn get_json_port(&self) -> u16 {
        self.json_port
    }

    pub fn get_rpc_port(&self) -> u16 {
        self.rpc_port
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir()
        .map_err(|err| ConfigError::Message(format!("Failed to read current directory: {}", err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment = Environment::try_from(
        std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into()),
    )
    .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let mut builder = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_APPLICATION__JSON_PORT would set Settings.application.json_port
        .add_source(config::Environment::with_prefix("app").separator("__"));

    // Older deployments are configured through MAILINGLST_* variables, which win over everything else
    for (key, value) in legacy_overrides(|name| std::env::var(name).ok())? {
        builder = builder.set_override(key, value)?;
    }

    let settings = builder.build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}

/// Maps `MAILINGLST_DB`, `MAILINGLST_BIND_JSON` and `MAILINGLST_BIND_GRPC` onto setting keys.
/// Both binds must agree on the host when they name one.
fn legacy_overrides<F>(lookup: F) -> Result<Vec<(&'static str, String)>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();
    let mut bind_host: Option<String> = None;

    if let Some(db_path) = lookup("MAILINGLST_DB") {
        overrides.push(("database.path", db_path));
    }

    for (variable, port_key) in [
        ("MAILINGLST_BIND_JSON", "application.json_port"),
        ("MAILINGLST_BIND_GRPC", "application.rpc_port"),
    ] {
        let bind = match lookup(variable) {
            Some(bind) => bind,
            None => continue,
        };
        let (host, port) = parse_bind(&bind)
            .map_err(|err| ConfigError::Message(format!("{}: {}", variable, err)))?;

        if let Some(host) = host {
            if let Some(known) = bind_host.as_ref().filter(|known| **known != host) {
                return Err(ConfigError::Message(format!(
                    "{} binds to {} but another listener binds to {}; both must share a host.",
                    variable, host, known
                )));
            }
            bind_host = Some(host);
        }
        overrides.push((port_key, port.to_string()));
    }

    if let Some(host) = bind_host {
        overrides.push(("application.host", host));
    }

    Ok(overrides)
}

/// Splits `host:port` or `:port`. An empty host leaves the configured one in place.
fn parse_bind(bind: &str) -> Result<(Option<String>, u16), String> {
    let (host, port) = bind
        .rsplit_once(':')
        .ok_or_else(|| format!("{} is not a host:port address.", bind))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| format!("{} is not a valid port.", port))?;
    let host = Some(host.trim_start_matches('[').trim_end_matches(']'))
        .filter(|host| !host.is_empty())
        .map(String::from);

    Ok((host, port))
}
