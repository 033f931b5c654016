use frd_model::ValidationError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("load already in progress")]
    InFlight,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("no record with id {0}")]
    NotFound(String),
    #[error("record {0} is being deleted")]
    Deleting(String),
    #[error("validation failed: {}", join_validation(.0))]
    Validation(Vec<ValidationError>),
    #[error("round trip failed: {0}")]
    RoundTrip(#[from] SinkError),
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field(), e))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config does not match schema: {0}")]
    Schema(String),
    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}
