//! Stable error codes for the top-level handler.

use std::fmt;

/// Machine-readable codes derived from error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownCommand,
    MissingArgument,
    AuthBrowserFailed,
    UnknownError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::MissingArgument => "MISSING_ARGUMENT",
            ErrorCode::AuthBrowserFailed => "AUTH_BROWSER_FAILED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(code)
    }
}

/// Format an error message with its stable code for the terminal.
pub fn render_failure(message: &str) -> String {
    format!("Error [{}]: {}", match_error_code(message), message)
}

/// Map an error message to its code.
pub fn match_error_code(message: &str) -> ErrorCode {
    if message.starts_with("Unknown command") {
        ErrorCode::UnknownCommand
    } else if message.starts_with("Missing required argument") {
        ErrorCode::MissingArgument
    } else if message.contains("Failed to open web browser") {
        ErrorCode::AuthBrowserFailed
    } else {
        ErrorCode::UnknownError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            match_error_code("Unknown command: test"),
            ErrorCode::UnknownCommand
        );
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            match_error_code("Missing required argument: name"),
            ErrorCode::MissingArgument
        );
    }

    #[test]
    fn test_browser_failed() {
        assert_eq!(
            match_error_code("Failed to open web browser. Please try again."),
            ErrorCode::AuthBrowserFailed
        );
    }

    #[test]
    fn test_unknown_error() {
        assert_eq!(
            match_error_code("Some random error message"),
            ErrorCode::UnknownError
        );
        assert_eq!(match_error_code(""), ErrorCode::UnknownError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::AuthBrowserFailed.to_string(), "AUTH_BROWSER_FAILED");
    }

    #[test]
    fn test_render_failure_includes_code() {
        assert_eq!(
            render_failure("Failed to open web browser. Please try again."),
            "Error [AUTH_BROWSER_FAILED]: Failed to open web browser. Please try again."
        );
        assert_eq!(
            render_failure("something else"),
            "Error [UNKNOWN_ERROR]: something else"
        );
    }
}
