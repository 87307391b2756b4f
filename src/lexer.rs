//! Tokenizer for declaration lines.
//!
//! Splits on whitespace, treats brackets, parens, braces, comma and equals
//! as standalone one-character tokens, and keeps quoted spans (single or
//! double quote, backslash-escapable) as single tokens including their
//! delimiters. `#` starts a comment running to end of line. Never produces a
//! partial token: an unterminated quote or a trailing escape is a fatal
//! syntax error carrying line and column.

use crate::error::{Result, VccError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub line: u32,
    pub col: u32,
    pub text: String,
}

impl Token {
    fn new(line: u32, col: u32) -> Self {
        Token {
            line,
            col,
            text: String::new(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Tokenize declaration text. `start_line` is the input line the text
/// begins on, so token positions refer to the original file.
pub fn tokenize(text: &str, start_line: u32) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut line = start_line;
    let mut col: u32 = 0;
    // Open quoted token: the delimiter and whether the last char was '\'.
    let mut quote: Option<(char, bool)> = None;
    let mut in_word = false;
    let mut in_comment = false;

    for c in text.chars() {
        col += 1;
        if c == '\n' {
            if let Some((_, _)) = quote {
                return Err(VccError::syntax(line, col, "unterminated quoted string"));
            }
            line += 1;
            col = 0;
            in_word = false;
            in_comment = false;
            continue;
        }
        if in_comment {
            continue;
        }

        if let Some((sep, escaped)) = quote {
            let tok = tokens.last_mut().expect("open quote token");
            if escaped {
                tok.text.push(c);
                quote = Some((sep, false));
            } else if c == '\\' {
                quote = Some((sep, true));
            } else {
                tok.text.push(c);
                if c == sep {
                    quote = None;
                }
            }
            continue;
        }

        if in_word && is_word_char(c) {
            tokens.last_mut().expect("open word token").text.push(c);
            continue;
        }
        in_word = false;

        match c {
            ' ' | '\t' | '\r' => {}
            '#' => in_comment = true,
            '[' | ']' | '(' | ')' | '{' | '}' | ',' | '=' => {
                let mut tok = Token::new(line, col);
                tok.text.push(c);
                tokens.push(tok);
            }
            '"' | '\'' => {
                let mut tok = Token::new(line, col);
                tok.text.push(c);
                tokens.push(tok);
                quote = Some((c, false));
            }
            c if is_word_char(c) => {
                let mut tok = Token::new(line, col);
                tok.text.push(c);
                tokens.push(tok);
                in_word = true;
            }
            other => {
                return Err(VccError::syntax(
                    line,
                    col,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    if let Some((_, escaped)) = quote {
        let msg = if escaped {
            "trailing escape in quoted string"
        } else {
            "unterminated quoted string"
        };
        return Err(VccError::syntax(line, col, msg));
    }

    Ok(tokens)
}

/// Strip matching quote delimiters from a token, if any.
pub fn unquote(text: &str) -> &str {
    let b = text.as_bytes();
    if b.len() >= 2 && (b[0] == b'"' || b[0] == b'\'') && b[b.len() - 1] == b[0] {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input, 1)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn splits_words_and_punctuation() {
        assert_eq!(
            texts("INT add(INT a, INT b)"),
            vec!["INT", "add", "(", "INT", "a", ",", "INT", "b", ")"]
        );
    }

    #[test]
    fn brackets_and_braces_standalone() {
        assert_eq!(
            texts("ENUM {a, b} [INT x = 3]"),
            vec!["ENUM", "{", "a", ",", "b", "}", "[", "INT", "x", "=", "3", "]"]
        );
    }

    #[test]
    fn quoted_span_is_one_token() {
        assert_eq!(texts(r#"STRING s = "two words""#)[3], "\"two words\"");
        assert_eq!(texts("STRING s = 'single'")[3], "'single'");
    }

    #[test]
    fn escaped_quote_inside_span() {
        assert_eq!(texts(r#"s = "a\"b""#)[2], "\"a\"b\"");
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        assert_eq!(texts("INT a # trailing comment\nINT b"), vec!["INT", "a", "INT", "b"]);
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let err = tokenize("STRING s = \"oops", 4).unwrap_err();
        assert!(err.to_string().contains("line 4"));
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn trailing_escape_is_fatal() {
        let err = tokenize("s = \"oops\\", 1).unwrap_err();
        assert!(err.to_string().contains("trailing escape"));
    }

    #[test]
    fn unexpected_character_is_fatal() {
        let err = tokenize("INT a; INT b", 1).unwrap_err();
        assert!(err.to_string().contains("unexpected character ';'"));
    }

    #[test]
    fn token_positions_track_continuation_lines() {
        let toks = tokenize("INT add(\n    INT a)", 7).unwrap();
        assert_eq!(toks[0].line, 7);
        let a = toks.iter().find(|t| t.text == "a").unwrap();
        assert_eq!(a.line, 8);
    }

    #[test]
    fn unquote_strips_matching_delimiters() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
    }
}
