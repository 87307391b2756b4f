//! Compiler error taxonomy.
//!
//! Every parse-time failure is one of three kinds, each with its own exit
//! code so build scripts can tell "bad input content" apart from "bad type".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VccError {
    /// Lexical malformation: unterminated quote, trailing escape, stray byte.
    #[error("syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: u32, col: u32, msg: String },

    /// Well-tokenized but structurally invalid input: unknown stanza,
    /// Method outside Object, duplicate names, illegal identifiers.
    #[error("format error at line {line}: {msg}")]
    Format { line: u32, msg: String },

    /// A type name not present in the type table, or used where disallowed.
    #[error("type error at line {line}: {msg}")]
    Type { line: u32, msg: String },
}

impl VccError {
    pub fn syntax(line: u32, col: u32, msg: impl Into<String>) -> Self {
        VccError::Syntax {
            line,
            col,
            msg: msg.into(),
        }
    }

    pub fn format(line: u32, msg: impl Into<String>) -> Self {
        VccError::Format {
            line,
            msg: msg.into(),
        }
    }

    pub fn type_error(line: u32, msg: impl Into<String>) -> Self {
        VccError::Type {
            line,
            msg: msg.into(),
        }
    }

    /// Process exit code for this error kind. 2 is reserved for "no input
    /// file" and 1 for I/O failures, both handled outside the parser.
    pub fn exit_code(&self) -> i32 {
        match self {
            VccError::Syntax { .. } | VccError::Format { .. } => 3,
            VccError::Type { .. } => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, VccError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = VccError::syntax(3, 7, "unterminated quoted string");
        assert_eq!(
            err.to_string(),
            "syntax error at line 3, column 7: unterminated quoted string"
        );
    }

    #[test]
    fn exit_codes_distinguish_kinds() {
        assert_eq!(VccError::format(1, "x").exit_code(), 3);
        assert_eq!(VccError::syntax(1, 1, "x").exit_code(), 3);
        assert_eq!(VccError::type_error(1, "x").exit_code(), 4);
    }
}
