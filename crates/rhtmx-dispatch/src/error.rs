// File: src/error.rs
// Purpose: Author errors raised while compiling a route tree

use thiserror::Error;

/// Errors raised while compiling matcher expressions into a route tree.
///
/// These are author errors: they surface from [`App::build`](crate::App::build)
/// before any request is dispatched. A request that simply does not match is
/// never reported through this type.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A pattern string or regular expression did not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A matcher option used a key other than `extension` or `param`.
    #[error("unsupported matcher option `{key}` (expected `extension` or `param`)")]
    UnknownOption { key: String },

    /// A matcher option was given an empty value.
    #[error("matcher option `{key}` requires a non-empty value")]
    EmptyOption { key: String },
}

impl CompileError {
    pub(crate) fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        CompileError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_option_message() {
        let err = CompileError::UnknownOption {
            key: "suffix".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported matcher option `suffix` (expected `extension` or `param`)"
        );
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = CompileError::invalid_pattern("(", source);
        assert!(err.to_string().starts_with("invalid pattern `(`"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
