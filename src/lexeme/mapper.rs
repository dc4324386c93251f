use super::{LexemeLogger, Mapper};
use crate::util::{Log, Source};
use crate::{Lex, Lexeme, Token};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;

impl<TLexeme: Lexeme> Mapper<TLexeme> {
    /// Create a new [Mapper] utility.
    /// ## Arguments
    /// * 'lexeme' - Another lexer utility which implement [Lexeme] trait.
    /// * 'fields' - A [Vec] of tuples of mappable string values, and their token values.
    pub fn new(lexeme: TLexeme, fields: Vec<(&str, Token)>) -> Result<Self, String> {
        let mut s = Self {
            lexeme,
            fields: HashMap::new(),
            log: OnceCell::new(),
        };

        s.extend_fields(fields).map(|_| s)
    }

    /// Set a log label to debug the lexeme.
    /// Based on the level of the [Log], the lexeme will debug the lexeme result.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    pub fn extend_fields(&mut self, fields: Vec<(&str, Token)>) -> Result<(), String> {
        for (keyword, token) in fields {
            if let Some(token) = self
                .fields
                .insert(keyword.bytes().collect::<Vec<u8>>(), token)
            {
                return Err(format!(
                    "{:?} is already been used with token {:?}",
                    keyword, token
                ));
            };
        }
        Ok(())
    }
}

impl<TLexeme: Lexeme> LexemeLogger for Mapper<TLexeme> {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

impl<TLexeme: Lexeme> Lexeme for Mapper<TLexeme> {
    fn consume(&self, code: &Source, pointer: usize, tokenized_stream: &Vec<Lex>) -> Option<Lex> {
        let result = self.lexeme.consume(code, pointer, tokenized_stream);
        self.log_result(pointer, code, &result);

        result.map(|mut lex_data| {
            let code_part = &code.value[lex_data.start..lex_data.end];
            if let Some(token) = self.fields.get(code_part) {
                lex_data.token = *token;
            }
            lex_data
        })
    }

    fn get_grammar_field(&self) -> Vec<(Token, String)> {
        let mut v: Vec<(Token, String)> = self
            .fields
            .iter()
            .map(|(s, t)| {
                let s = String::from_utf8_lossy(s);

                (*t, format!("{:?}", s))
            })
            .collect();

        v.extend(self.lexeme.get_grammar_field().into_iter());
        v
    }
}
