use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("Index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Patron '{patron}' is not allowed to {action}")]
    Unauthorized { patron: String, action: &'static str },

    #[error("Patron name already registered: {name}")]
    DuplicatePatron { name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Corrupt snapshot: {message}")]
    CorruptSnapshot { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lending,
    Authorization,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LibraryError {
    pub fn not_found(what: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            what,
            key: key.to_string(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::IndexOutOfRange { .. } | Self::DuplicatePatron { .. } => {
                ErrorCategory::Lending
            }
            Self::Unauthorized { .. } => ErrorCategory::Authorization,
            Self::IoError(_) | Self::SerializationError(_) | Self::CorruptSnapshot { .. } => {
                ErrorCategory::Persistence
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } | Self::IndexOutOfRange { .. } => ErrorSeverity::Low,
            Self::Unauthorized { .. } | Self::DuplicatePatron { .. } => ErrorSeverity::Medium,
            Self::IoError(_) | Self::SerializationError(_) => ErrorSeverity::High,
            Self::CorruptSnapshot { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 回傳值可直接顯示給終端使用者
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { what, key } => format!("No {} matches '{}'", what, key),
            Self::IndexOutOfRange { .. } => "Invalid index! Try again!".to_string(),
            Self::Unauthorized { .. } => {
                "This action can only be performed by librarians!".to_string()
            }
            Self::DuplicatePatron { name } => format!("A patron named '{}' already exists", name),
            Self::IoError(e) => format!("Could not access the library data files: {}", e),
            Self::SerializationError(e) => format!("Could not encode library data: {}", e),
            Self::CorruptSnapshot { message } => format!("Library data is corrupt: {}", message),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Lending => "Pick an entry from the listed options",
            ErrorCategory::Authorization => "Log in as a librarian to perform this action",
            ErrorCategory::Persistence => {
                "Check that the data directory exists and is writable, or restore the snapshot from a backup"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags and retry",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_recoverable() {
        assert!(LibraryError::not_found("book", 7).is_recoverable());
        assert!(LibraryError::IndexOutOfRange { index: 3, len: 1 }.is_recoverable());
        assert!(LibraryError::Unauthorized {
            patron: "johan".to_string(),
            action: "add books",
        }
        .is_recoverable());
    }

    #[test]
    fn test_persistence_errors_are_not_recoverable() {
        let io = LibraryError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.category(), ErrorCategory::Persistence);
        assert!(!io.is_recoverable());
        assert_eq!(LibraryError::corrupt("x").severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_messages() {
        let err = LibraryError::not_found("patron", "bob");
        assert_eq!(err.to_string(), "patron not found: bob");
        assert_eq!(err.user_friendly_message(), "No patron matches 'bob'");
    }
}
