use crate::error::ParseError;
use crate::util::{Log, Source};
use crate::{Lex, Lexeme, Token, Tokenizer};
use once_cell::unsync::OnceCell;
use std::fmt::Write;
use std::rc::Rc;

impl Tokenizer {
    pub fn new(lexers: Vec<Rc<dyn Lexeme>>) -> Self {
        Self {
            lexers,
            debug: OnceCell::new(),
        }
    }

    pub fn set_log(&self, log_label: Log<&'static str>) -> Result<(), String> {
        self.debug
            .set(log_label)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Tokenize the code and return result consisting of vec of tokenized stream.
    pub fn tokenize(&self, code: &Source) -> Result<Vec<Lex>, ParseError> {
        let mut tokenized_stream: Vec<Lex> = Vec::new();
        let mut pointer: usize = 0;
        let eof_pointer: usize = code.value.len();

        #[cfg(debug_assertions)]
        let debug = self.debug.get().map_or(Log::None, |s| s.clone());

        if pointer == eof_pointer {
            tokenized_stream.push(Lex::new(Token::eof(), eof_pointer, eof_pointer));
            return Ok(tokenized_stream);
        }

        loop {
            match self
                .lexers
                .iter()
                .find_map(|lexer| lexer.consume(code, pointer, &tokenized_stream))
            {
                Some(lex_data) => {
                    debug_assert_eq!(pointer, lex_data.start);
                    pointer = lex_data.end;

                    tokenized_stream.push(lex_data);

                    if pointer == eof_pointer {
                        #[cfg(debug_assertions)]
                        if debug.order() >= Log::Success(()).order() {
                            println!("[{}; Tokenization success]", debug);
                        }
                        tokenized_stream.push(Lex::new(Token::eof(), eof_pointer, eof_pointer));
                        break Ok(tokenized_stream);
                    }
                }
                None => {
                    #[cfg(debug_assertions)]
                    if debug.order() >= Log::Default(()).order() {
                        println!(
                            "{}: Tokenization failed at {}",
                            debug,
                            code.obtain_position(pointer)
                        );
                    }
                    break Err(ParseError::new(
                        pointer,
                        format!(
                            "Failed to tokenize code @ {}",
                            code.obtain_position(pointer)
                        ),
                    ));
                }
            }
        }
    }

    pub fn build_grammar(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        writeln!(writer, "fragment {{")?;
        for fields in self.lexers.iter().map(|l| l.get_grammar_field()) {
            for (t, s) in &fields {
                writeln!(writer, "{:>6}{:?} : {} ,", "", t, s)?;
            }
        }
        writeln!(writer, "}}")?;
        Ok(writer)
    }
}
