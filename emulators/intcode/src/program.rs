//! Program text format: one line of comma-separated decimal integers.

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("program is empty")]
    Empty,
    #[error("invalid integer {token:?} at position {index}")]
    InvalidToken { index: usize, token: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn parse_program(text: &str) -> Result<Vec<i64>, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    text.split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token.parse::<i64>().map_err(|_| ParseError::InvalidToken {
                index,
                token: token.to_string(),
            })
        })
        .collect()
}

pub fn load_program(path: impl AsRef<Path>) -> Result<Vec<i64>, ParseError> {
    let text = fs::read_to_string(path)?;
    parse_program(&text)
}
