//! Syntax errors with source positions.

/// A syntax error at a known byte offset, with line/column derived from
/// the source at construction time (1-based, columns in characters).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    /// Build an error at `offset` into `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let clamped = offset.min(source.len());
    let mut line = 1;
    let mut col = 1;
    for c in source[..clamped].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let src = "ab\ncd";
        let err = SyntaxError::at(src, 0, "x");
        assert_eq!((err.line, err.column), (1, 1));
        let err = SyntaxError::at(src, 3, "x");
        assert_eq!((err.line, err.column), (2, 1));
        let err = SyntaxError::at(src, 4, "x");
        assert_eq!((err.line, err.column), (2, 2));
    }

    #[test]
    fn offset_past_end_clamps() {
        let err = SyntaxError::at("ab", 99, "eof");
        assert_eq!((err.line, err.column), (1, 3));
    }
}
