//! Error types for the multiout system

use thiserror::Error;

/// Core error type for output board operations
#[derive(Error, Debug)]
pub enum OutputError {
    /// Chain declared with more registers than the buffer can hold
    #[error("Chain too long: {chain_length} shift registers declared, {max} max")]
    ChainTooLong { chain_length: usize, max: usize },

    /// Chain declared without any register
    #[error("Empty chain: at least one shift register is required")]
    EmptyChain,

    /// Data-path operation called before `begin()` completed
    #[error("{operation} must be called after begin() has been called with a correct setup")]
    NotInitialized { operation: &'static str },

    /// Setup operation called after `begin()` completed
    #[error("{operation} must be called before begin()")]
    AlreadyInitialized { operation: &'static str },

    /// 1-based output number outside the chain
    #[error("Output {pin} out of range: this board only has {outputs} outputs")]
    PinOutOfRange { pin: usize, outputs: usize },

    /// Digital binding validated without a signal name
    #[error("Binding for output {pin} has no signal associated")]
    MissingSignal { pin: usize },

    /// Bindings were declared before any board existed
    #[error("{count} binding(s) declared before any output board; boards must be declared first")]
    OrphanedBindings { count: usize },

    /// Board handle does not belong to the registry
    #[error("Output board not found: {0}")]
    BoardNotFound(usize),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for output board operations
pub type Result<T> = std::result::Result<T, OutputError>;

impl From<toml::de::Error> for OutputError {
    fn from(err: toml::de::Error) -> Self {
        OutputError::Config(err.to_string())
    }
}

impl OutputError {
    /// Whether the error describes a wiring or declaration mistake, as opposed
    /// to an API call made at the wrong point of the board lifecycle.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OutputError::ChainTooLong { .. }
                | OutputError::EmptyChain
                | OutputError::PinOutOfRange { .. }
                | OutputError::MissingSignal { .. }
                | OutputError::OrphanedBindings { .. }
                | OutputError::BoardNotFound(_)
                | OutputError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: OutputError = toml_err.into();

        match err {
            OutputError::Config(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OutputError = io_err.into();

        match err {
            OutputError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = OutputError::ChainTooLong {
            chain_length: 60,
            max: 48,
        };
        assert_eq!(
            format!("{}", err),
            "Chain too long: 60 shift registers declared, 48 max"
        );

        let err = OutputError::NotInitialized {
            operation: "OutputBoard::set_bit",
        };
        assert_eq!(
            format!("{}", err),
            "OutputBoard::set_bit must be called after begin() has been called with a correct setup"
        );

        let err = OutputError::AlreadyInitialized {
            operation: "OutputBoard::begin",
        };
        assert_eq!(format!("{}", err), "OutputBoard::begin must be called before begin()");

        let err = OutputError::PinOutOfRange { pin: 49, outputs: 48 };
        assert_eq!(
            format!("{}", err),
            "Output 49 out of range: this board only has 48 outputs"
        );

        let err = OutputError::MissingSignal { pin: 3 };
        assert_eq!(format!("{}", err), "Binding for output 3 has no signal associated");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(OutputError::OrphanedBindings { count: 1 }.is_configuration());
        assert!(OutputError::MissingSignal { pin: 1 }.is_configuration());
        assert!(OutputError::EmptyChain.is_configuration());
        assert!(!OutputError::NotInitialized { operation: "x" }.is_configuration());
        assert!(!OutputError::AlreadyInitialized { operation: "x" }.is_configuration());
    }
}
