use crate::lexeme::{Mapper, Pattern, Punctuations};
use crate::{Lex, Tokenizer};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
/// Token of the YAFL lexical stream.
pub enum Token {
    EOF,
    Space,
    /// A name: plain (`x`, `i32`), reflective (`~arr!`), suffixed (`print!`, `fn?`),
    /// an annotation name (`!effect`) or the variadic marker (`...`).
    Identifier,
    /// A symbolic intrinsic name such as `+`, `==` or `&&`. Grammatically an
    /// identifier atom; kept apart so the bind rewriter can recognize the plain `=`.
    Operator,
    Integer,
    Float,
    String,
    RawString,
    True,
    False,
    Null,
    /// The context dependent `:=` operator, see [rewrite](crate::rewrite).
    OpBind,
    Colon,
    Comma,
    Semicolon,
    Arrow,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
}

impl Token {
    pub fn eof() -> Self {
        Token::EOF
    }

    /// Whether the token take part in the grammar. Non structural tokens are
    /// kept on a hidden channel and skipped by the parser.
    pub fn is_structural(&self) -> bool {
        match self {
            Token::Space => false,
            _ => true,
        }
    }

    /// The hidden channel is reported as channel 1 in the parse tree dump.
    pub fn channel(&self) -> usize {
        if self.is_structural() {
            0
        } else {
            1
        }
    }

    /// Whether the token may appear as a literal expression atom.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Integer | Token::Float | Token::String | Token::RawString | Token::True | Token::False | Token::Null
        )
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for Lex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("")
            .field(&self.token)
            .field(&self.start)
            .field(&self.end)
            .finish()
    }
}

impl Lex {
    pub fn new(token: Token, start: usize, end: usize) -> Self {
        Self { token, start, end }
    }
}

/// Assemble the YAFL tokenizer from the lexeme utilities.
///
/// Keywords are re-typed from the identifier lexeme with a [Mapper]; symbolic
/// operator names and the bracket punctuations share one longest-match
/// [Punctuations] field tree.
pub fn yafl_tokenizer() -> Tokenizer {
    let space = Rc::new(Pattern::new(Token::Space, r"^\s+").unwrap());

    let raw_string = Rc::new(Pattern::new(Token::RawString, r"^`[^`]*`").unwrap());
    let dq_string = Rc::new(Pattern::new(Token::String, r#"^"([^"\\\r\n]|\\.)*""#).unwrap());
    let sq_string = Rc::new(Pattern::new(Token::String, r#"^'([^'\\\r\n]|\\.)*'"#).unwrap());

    let float_literal =
        Rc::new(Pattern::new(Token::Float, r"^[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?").unwrap());
    let integer_literal = Rc::new(Pattern::new(Token::Integer, r"^[0-9]+").unwrap());

    let word = Pattern::new(
        Token::Identifier,
        r"^~?[A-Za-z_][A-Za-z0-9_]*[!?]?|^![A-Za-z_][A-Za-z0-9_]*|^\.\.\.",
    )
    .unwrap();
    let keywords = Rc::new(
        Mapper::new(
            word,
            vec![
                ("true", Token::True),
                ("false", Token::False),
                ("null", Token::Null),
            ],
        )
        .unwrap(),
    );

    let punctuations = Rc::new(
        Punctuations::new(vec![
            ("(", Token::OpenParen),
            (")", Token::CloseParen),
            ("[", Token::OpenBracket),
            ("]", Token::CloseBracket),
            ("{", Token::OpenBrace),
            ("}", Token::CloseBrace),
            (",", Token::Comma),
            (";", Token::Semicolon),
            (":=", Token::OpBind),
            (":", Token::Colon),
            ("=>", Token::Arrow),
            ("+", Token::Operator),
            ("-", Token::Operator),
            ("*", Token::Operator),
            ("/", Token::Operator),
            ("%", Token::Operator),
            ("&", Token::Operator),
            ("|", Token::Operator),
            ("^", Token::Operator),
            ("<<", Token::Operator),
            (">>", Token::Operator),
            ("==", Token::Operator),
            ("!=", Token::Operator),
            ("<", Token::Operator),
            ("<=", Token::Operator),
            (">", Token::Operator),
            (">=", Token::Operator),
            ("!", Token::Operator),
            ("&&", Token::Operator),
            ("||", Token::Operator),
            ("=", Token::Operator),
        ])
        .unwrap(),
    );

    Tokenizer::new(vec![
        space,
        raw_string,
        dq_string,
        sq_string,
        float_literal,
        integer_literal,
        keywords,
        punctuations,
    ])
}
