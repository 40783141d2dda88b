//! Script errors: syntax errors with source reports, and per-command failures

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::error::{Rich, RichPattern, RichReason};
use thiserror::Error;

use super::lexer::{Span, Token};
use crate::session::SessionError;

/// A syntax error. Nothing in a script runs when any is found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ScriptError {
    pub fn span(&self) -> &Span {
        match self {
            ScriptError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ScriptError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return format!("{filename}: {self}");
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<Rich<'a, Token>> for ScriptError {
    fn from(err: Rich<'a, Token>) -> Self {
        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let mut expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of input".to_string()),
                RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                RichPattern::Any => Some("any token".to_string()),
                RichPattern::SomethingElse => None,
            })
            .collect();
        expected.sort();
        expected.dedup();

        ScriptError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Colon => "':'".to_string(),
        other => format!("keyword '{}'", format!("{:?}", other).to_lowercase()),
    }
}

/// Why a single command failed. The run goes on with the next command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unknown argument '{key}' for {command}")]
    UnknownArgument { command: &'static str, key: String },

    #[error("argument '{0}' is given twice")]
    DuplicateArgument(String),

    #[error("missing argument '{key}' for {command}")]
    MissingArgument {
        command: &'static str,
        key: &'static str,
    },

    #[error("argument '{key}' must be {expected}")]
    InvalidArgument { key: String, expected: &'static str },

    #[error("unknown structure '{0}', expected wall, window or door")]
    UnknownStructure(String),

    #[error("unknown pan direction '{0}', expected up, down, left, right or reset")]
    UnknownDirection(String),
}
