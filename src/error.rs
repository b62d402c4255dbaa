use serde::Serialize;

/// All errors that can occur while bootstrapping or driving the toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Archive extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Custom(String),
}

// Operation failures cross the agent-tool boundary as plain strings.
impl Serialize for ToolError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
