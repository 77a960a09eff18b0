use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct GalgameError {
    pub code: String,
    pub message: String,
}

impl GalgameError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_joins_code_and_message() {
        let error = GalgameError::new("ENGINE_X", "broken");
        assert_eq!(error.to_string(), "ENGINE_X: broken");
    }
}
