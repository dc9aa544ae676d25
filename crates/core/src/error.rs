use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to launch script `{}`: {}", .path, .original)]
    Launch {
        path: String,
        original: std::io::Error,
    },

    #[error("Error waiting for script process: {}", _0)]
    SubProcess(#[from] std::io::Error),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("Invalid marker pattern `{}`: {}", .pattern, .original)]
    Pattern {
        pattern: String,
        original: glob::PatternError,
    },

    #[error("Context `{}` is not in the format name=path", .0)]
    ContextFormat(String),

    #[error("Invalid context name `{}`: names may not be empty or contain `$`, `(` or `)`", .0)]
    ContextName(String),

    #[error("Failed to deliver output line: {}", .0)]
    Sink(String),

    #[error("Output stream task failed: {}", .0)]
    StreamTask(#[from] tokio::task::JoinError),

    #[error("Misc error: {}", .0)]
    Misc(String),

    #[error("STDIO error: {}", .0)]
    Stdio(std::io::Error),
}

impl Error {
    pub fn launch_error(path: String, original: std::io::Error) -> Self {
        Self::Launch { path, original }
    }

    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    pub fn pattern_error(pattern: String, original: glob::PatternError) -> Self {
        Self::Pattern { pattern, original }
    }
}
