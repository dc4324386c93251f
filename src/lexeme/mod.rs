//! A module consists of lexeme utilities
//! which analyze string slices at incremental positions of the input and create tokens.
//!
//! The YAFL tokenizer is an ordered list of lexeme utilities.
//! During tokenization each utility will be called sequentially at the incremental
//! locations of the input to split the source into a [Lex](crate::Lex) stream.
//! A [Pattern] matches an anchored regular expression, [Punctuations] matches the
//! longest constant field from a byte tree, and a [Mapper] re-types keyword values
//! tokenized by an inner lexeme utility.
//!
//! # Example
//!
//! ```
//! use yafl_frontend::lexeme::{Mapper, Pattern};
//! use yafl_frontend::util::Source;
//! use yafl_frontend::{Lex, Lexeme, Token};
//!
//! let word = Pattern::new(Token::Identifier, r"^[A-Za-z_][A-Za-z0-9_]*").unwrap();
//! let keywords = Mapper::new(word, vec![("null", Token::Null)]).unwrap();
//!
//! let code = Source::from("null");
//! let lex = keywords.consume(&code, 0, &Vec::new()).unwrap();
//! assert_eq!(lex, Lex::new(Token::Null, 0, 4));
//! ```

mod mapper;
mod pattern;
mod punctuation;


use crate::util::{Log, Source};
use crate::{FieldTree, Lex, Lexeme, Token};
use once_cell::unsync::OnceCell;
use regex::bytes::Regex;

pub(crate) trait LexemeLogger {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>>;

    fn log_result(&self, _pointer: usize, _code: &Source, _result: &Option<Lex>) {
        #[cfg(debug_assertions)]
        match _result {
            Some(lex) => self.log_success(_code, lex),
            None => self.log_failure(_pointer, _code),
        }
    }
    fn log_success(&self, _code: &Source, _lex: &Lex) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.log_cell().get() {
            if log_label.order() >= Log::Success(()).order() {
                println!(
                    "Lexeme success for {} : token: {:?} from {} to {}.",
                    log_label,
                    _lex.token,
                    _code.obtain_position(_lex.start),
                    _code.obtain_position(_lex.end)
                )
            }
        }
    }
    fn log_failure(&self, _pointer: usize, _code: &Source) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.log_cell().get() {
            if log_label.order() >= Log::Result(()).order() {
                println!(
                    "Lexeme error for {} : at {}",
                    log_label,
                    _code.obtain_position(_pointer)
                )
            }
        }
    }
}

/// A regular expression based lexeme utility.
///
/// Provided regex expression will be matched at incremental position of the input utf-8 bytes string.
/// The provided regular expression should be enforce to match string from the beginning
/// i.e. expression should implement start of string (^) match.
pub struct Pattern {
    token: Token,
    regexp: Regex,
    log: OnceCell<Log<&'static str>>,
}

/// A lexeme utility to match a set of constant values like punctuations and operators.
///
/// The utility creates a tree structure from the utf-8 values of the provided fields and
/// returns the token associated with the longest matching field.
pub struct Punctuations {
    field_tree: FieldTree,
    punctuations: Vec<(String, Token)>,
    log: OnceCell<Log<&'static str>>,
}

/// A lexical utility that transforms tokenized data based on the mapped string fields.
///
/// The associated lexeme utility will first be matched with the input string.
/// Once the associated lexeme utility successfully obtains token data,
/// it will then look for the appropriate token value for the tokenized string part of the input.
/// If no match is found for the corresponding tokenized string part, the original tokenized data
/// will be returned.
pub struct Mapper<TLexeme: Lexeme> {
    lexeme: TLexeme,
    fields: std::collections::HashMap<Vec<u8>, Token>,
    log: OnceCell<Log<&'static str>>,
}
