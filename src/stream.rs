use crate::{FltrPtr, Lex, Token, TokenPtr, TokenStream};
use std::ops::Index;

impl<'lex> TokenStream<'lex> {
    pub fn new(original_stream: &'lex Vec<Lex>, filtered_stream: Vec<TokenPtr>) -> Self {
        Self {
            original_stream,
            filtered_stream,
        }
    }
}

impl<'lex> From<&'lex Vec<Lex>> for TokenStream<'lex> {
    fn from(segments: &'lex Vec<Lex>) -> Self {
        let filtered_indices: Vec<TokenPtr> = segments
            .iter()
            .enumerate()
            .filter_map(|(j, data)| {
                if data.token.is_structural() {
                    Some(TokenPtr(j))
                } else {
                    None
                }
            })
            .collect();

        Self::new(segments, filtered_indices)
    }
}

impl<'lex> TokenStream<'lex> {
    pub fn is_eos(&self, index: FltrPtr) -> bool {
        self[index].token == Token::eof()
    }

    pub fn get(&self, index: FltrPtr) -> Option<&Lex> {
        self.filtered_stream.get(index.0).map(|s| &self.original_stream[s.0])
    }

    pub fn length(&self) -> usize {
        self.filtered_stream.len()
    }

    pub fn pointer(&self, index: FltrPtr) -> usize {
        self[index].start
    }

    pub fn get_token_ptr(&self, index: FltrPtr) -> TokenPtr {
        self.filtered_stream[index.0]
    }

    pub fn iter_lex(&'lex self) -> impl Iterator<Item = &'lex Lex> {
        self.filtered_stream.iter().map(|s| &self.original_stream[s.0])
    }

    pub fn get_segments(&self) -> &Vec<Lex> {
        &self.original_stream
    }

    /// Pair every original token with its text for debugging and assertions.
    pub fn token_pair<'code>(&self, code: &'code str) -> Vec<(&Token, &'code str)> {
        self.original_stream
            .iter()
            .map(|d| (&d.token, &code[d.start..d.end]))
            .collect()
    }
}

impl<'lex> Index<FltrPtr> for TokenStream<'lex> {
    type Output = Lex;

    fn index(&self, index: FltrPtr) -> &Self::Output {
        debug_assert!(
            index.0 < self.filtered_stream.len(),
            "Trying to access index '{:?}' from filtered stream length '{}'",
            index,
            self.filtered_stream.len()
        );
        &self.original_stream[self.filtered_stream[index.0].0]
    }
}

impl<'lex> Index<TokenPtr> for TokenStream<'lex> {
    type Output = Lex;

    fn index(&self, index: TokenPtr) -> &Self::Output {
        debug_assert!(
            index.0 < self.original_stream.len(),
            "Trying to access index '{:?}' from lex stream length '{}'",
            index,
            self.original_stream.len()
        );
        &self.original_stream[index.0]
    }
}
