//! Compiler frontend for YAFL (Yet Another Functional Language).
//!
//! # Overview
//! The crate accepts YAFL source text and produces, for downstream code
//! generation, a typed value graph annotated with scope resolved references,
//! closure converted function definitions, and an ordering of side effecting
//! calls within each block.
//!
//! The pipeline runs in stages:
//!
//! 1. [Tokenization](Tokenizer) with the [lexeme] utilities.
//! 2. The [bind token rewriter](rewrite) disambiguating `:=` by bracket context.
//! 3. The [grammar](cst) producing a parse tree over the structural
//!    [TokenStream].
//! 4. [Lowering](ast) of the parse tree into a uniform arena [Ast](ast::Ast);
//!    string literals expand into integer byte lists.
//! 5. [Scope resolution](bdg) building the block tree, the definition point
//!    set and the per-use resolution candidates, with the
//!    [intrinsics](bdg::intr) injected below the root scope.
//! 6. The [value graph](vg) builder, the innermost-wins phi resolver, the
//!    closure converter and the effect analyzer.
//!
//! # Example
//! ```
//! use yafl_frontend::Frontend;
//!
//! let frontend = Frontend::new();
//! let unit = frontend.compile(b"x := 1; y := x").unwrap();
//!
//! // `y`'s use of `x` resolved to a single candidate at depth 0
//! let phi = &unit.bdg.bindphis()[0];
//! assert_eq!(phi.name, "x");
//! assert_eq!(phi.candidates.len(), 1);
//! ```
//!
//! The whole pipeline is single threaded and synchronous; a [Compilation] is
//! owned by the caller for the lifetime of one unit. All failures are
//! reported as a [CompileError] with a kind and, where available, a source
//! location.

pub mod ast;
pub mod bdg;
mod compile;
pub mod cst;
mod error;
mod field_tree;
pub mod lexeme;
pub mod rewrite;
mod stream;
mod token;
mod tokenizer;
pub mod util;
pub mod vg;

pub use compile::{Compilation, Frontend};
pub use error::{CompileError, ErrorKind, ParseError};
pub use token::{yafl_tokenizer, Token};

use once_cell::unsync::OnceCell;
use std::rc::Rc;

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
/// Element of the tokenized data.
pub struct Lex {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// An interface implemented by the lexeme utilities which are the primary
/// elements of the [Tokenizer].
pub trait Lexeme {
    /// Primary tokenization method implemented by each lexeme utility.
    /// The tokenizer will call this method for all the lexemes at the
    /// incremental locations of the input to create tokens.
    fn consume(
        &self,
        code: &util::Source,
        pointer: usize,
        tokenized_stream: &Vec<Lex>,
    ) -> Option<Lex>;

    fn get_grammar_field(&self) -> Vec<(Token, String)>;
}

/// The lexical analyzer: an ordered list of lexeme utilities applied at the
/// incremental positions of the input.
pub struct Tokenizer {
    lexers: Vec<Rc<dyn Lexeme>>,
    debug: OnceCell<util::Log<&'static str>>,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of the tokenized data in the [TokenStream].
pub struct TokenPtr(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the indices of structural tokens of the [TokenStream].
pub struct FltrPtr(pub(crate) usize);

#[derive(Debug, Clone)]
/// A wrapper implementation of the tokenized data with the hidden channel
/// tokens filtered out.
pub struct TokenStream<'lex> {
    filtered_stream: Vec<TokenPtr>,
    original_stream: &'lex Vec<Lex>,
}

#[derive(Clone, Debug)]
/// A byte tree to match constant fields with the longest match rule.
pub struct FieldTree {
    token: Option<Token>,
    children: Vec<(u8, FieldTree)>,
}
