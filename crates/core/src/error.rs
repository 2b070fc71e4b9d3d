//! Errors returned by the HMS core crate.

#[derive(Debug, thiserror::Error)]
pub enum HmsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write discharge summary file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read discharge summary file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to serialize JSON: {0}")]
    JsonSerialization(serde_json::Error),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("form not submitted properly: {0}")]
    SpamDetected(String),
    #[error("invalid form transition from {from} on {event}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },

    #[error("failed to send email: {0}")]
    MailTransport(#[from] reqwest::Error),
    #[error("email provider rejected the message with status {status}: {body}")]
    MailRejected { status: u16, body: String },
}

pub type HmsResult<T> = std::result::Result<T, HmsError>;
