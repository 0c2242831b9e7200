use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file set by {env} does not exist: {path}")]
    ConfigFileNotFound { env: &'static str, path: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
