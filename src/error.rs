use crate::util::Position;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
/// An error returned when the tokenizer or the parser failed to consume the input.
pub struct ParseError {
    pub pointer: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(pointer: usize, message: String) -> Self {
        Self { pointer, message }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SyntaxError: {}", self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The failure classes reported by the frontend.
pub enum ErrorKind {
    /// The parser rejected the token stream.
    Syntax,
    /// A grammar rule produced a parse tree shape the lowering does not recognize.
    CstShape,
    /// A malformed string literal.
    InvalidLiteral,
    /// A name use with no visible definition point.
    UnresolvedReference,
    /// A name use whose innermost candidate set holds more than one definition.
    AmbiguousReference,
    /// An effectful call inside the body of a function without an `!effect` annotation.
    MissingEffectAnnotation,
    /// A symbol survived closure conversion outside its function parameter list.
    FreeSymbolInFunction,
}

#[derive(Debug, Clone)]
/// A fatal compilation failure with its kind and, where available, the source location.
pub struct CompileError {
    pub kind: ErrorKind,
    pub position: Option<Position>,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, position: Option<Position>, message: String) -> Self {
        Self {
            kind,
            position,
            message,
        }
    }

    pub fn at(kind: ErrorKind, position: Position, message: String) -> Self {
        Self::new(kind, Some(position), message)
    }

    fn label(&self) -> &'static str {
        match self.kind {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::CstShape => "CstShapeError",
            ErrorKind::InvalidLiteral => "InvalidLiteral",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::AmbiguousReference => "AmbiguousReference",
            ErrorKind::MissingEffectAnnotation => "MissingEffectAnnotation",
            ErrorKind::FreeSymbolInFunction => "FreeSymbolInFunction",
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {} at {}", self.label(), self.message, position),
            None => write!(f, "{}: {}", self.label(), self.message),
        }
    }
}
