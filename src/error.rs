use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("missing required setting `{0}`")]
    MissingSetting(String),
    #[error("invalid value for `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },
    #[error("source directory {} does not exist", .0.display())]
    SourceNotFound(PathBuf),
    #[error("every --set-env-vars delimiter candidate occurs in the environment values")]
    NoDelimiter,
    #[error("failed to render the invocation: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment2::Error>),
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with code {code}")]
    InvocationFailed { program: String, code: i32 },
}

impl From<figment2::Error> for DeployError {
    fn from(value: figment2::Error) -> Self {
        DeployError::Config(Box::new(value))
    }
}

impl DeployError {
    /// Process exit code for this error. Invocation failures pass the tool's code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::InvocationFailed { code, .. } => *code,
            DeployError::Spawn { .. } => 127,
            _ => 2,
        }
    }
}
