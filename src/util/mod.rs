mod logger;
mod position;
mod source;
use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// The line and column information at a code point. Both fields are 1-based.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper for the compiled source text with lazily computed line information.
pub struct Source<'c> {
    pub value: &'c [u8],
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the tokenizer and analysis passes.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
