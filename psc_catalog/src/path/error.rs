/// Errors raised while compiling a setting path expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Path expression is empty")]
    Empty,

    #[error("Path expression exceeds {max} characters ({length})")]
    TooLong { length: usize, max: usize },

    #[error("Path expression has {count} segments, maximum is {max}")]
    TooManySegments { count: usize, max: usize },

    #[error("Empty path segment at position {position}")]
    EmptySegment { position: usize },

    #[error("Unterminated '[' starting at position {position}")]
    UnterminatedBracket { position: usize },

    #[error("Invalid bracket expression '[{content}]' at position {position}")]
    InvalidBracket { position: usize, content: String },

    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { position: usize, found: char },
}
