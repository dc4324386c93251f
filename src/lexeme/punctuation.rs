use super::{LexemeLogger, Punctuations};
use crate::util::{Log, Source};
use crate::{FieldTree, Lex, Lexeme, Token};
use once_cell::unsync::OnceCell;

impl Punctuations {
    /// Create a new [Punctuations] lexer utility for a set of constant string values.
    /// ## Arguments
    /// `fields` - A [Vec] of tuples of punctuation string values, and their associated token.
    pub fn new(mut fields: Vec<(&str, Token)>) -> Result<Self, String> {
        fields.sort_by_key(|s| s.0.len());
        let mut lexer = Self {
            field_tree: FieldTree::new(),
            punctuations: fields.iter().map(|(s, t)| (s.to_string(), *t)).collect(),
            log: OnceCell::new(),
        };
        lexer.add(fields)?;

        Ok(lexer)
    }

    fn add(&mut self, fields: Vec<(&str, Token)>) -> Result<(), String> {
        for (key, token) in fields {
            self.field_tree
                .insert(key.as_bytes(), token)
                .map_err(|err| {
                    format!(
                        "Punctuation '{}' is already added with token {:?}",
                        key, err
                    )
                })?;
        }

        Ok(())
    }

    /// Set a log label to debug the lexeme.
    /// Based on the level of the [Log], the lexeme will debug the lexeme result.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }
}

impl LexemeLogger for Punctuations {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

impl Lexeme for Punctuations {
    fn consume(&self, code: &Source, pointer: usize, _: &Vec<Lex>) -> Option<Lex> {
        match self.field_tree.find(&code.value[pointer..]) {
            Some((token, index)) => {
                let lex = Lex::new(token, pointer, pointer + index);
                self.log_success(code, &lex);
                Some(lex)
            }
            None => {
                self.log_failure(pointer, code);
                None
            }
        }
    }

    fn get_grammar_field(&self) -> Vec<(Token, String)> {
        self.punctuations
            .iter()
            .map(|(s, t)| (*t, format!("{:?}", s)))
            .collect()
    }
}
