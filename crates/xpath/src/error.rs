use std::fmt;

/// Subset of the W3C XPath error codes this evaluator raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    XPST0003, // syntax error
    XPST0017, // unknown function or wrong arity
    XPST0081, // unbound namespace prefix
    XPTY0004, // operand of the wrong type
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        use ErrorCode::*;
        match self {
            XPST0003 => "err:XPST0003",
            XPST0017 => "err:XPST0017",
            XPST0081 => "err:XPST0081",
            XPTY0004 => "err:XPTY0004",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPST0003, message)
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPTY0004, message)
    }
}

impl From<pest::error::Error<crate::parser::Rule>> for Error {
    fn from(err: pest::error::Error<crate::parser::Rule>) -> Self {
        use pest::error::LineColLocation;
        let (line, col) = match err.line_col {
            LineColLocation::Pos(at) | LineColLocation::Span(at, _) => at,
        };
        // pest renders a caret diagram; its last line names what was expected.
        let rendered = err.to_string();
        let expected = rendered.lines().last().unwrap_or_default().trim_start_matches([' ', '=']);
        Error::syntax(format!("line {line}, column {col}: {expected}"))
    }
}
