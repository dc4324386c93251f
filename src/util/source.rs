use super::{Position, Source};
use once_cell::unsync::OnceCell;

impl<'c> From<&'c [u8]> for Source<'c> {
    fn from(value: &'c [u8]) -> Self {
        Source::new(value)
    }
}
impl<'c> From<&'c str> for Source<'c> {
    fn from(value: &'c str) -> Self {
        Source::new(value.as_bytes())
    }
}

impl<'c> Source<'c> {
    pub fn new(value: &'c [u8]) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    /// Extract the text between two byte pointers.
    pub fn text(&self, start: usize, end: usize) -> &'c str {
        std::str::from_utf8(&self.value[start..end]).unwrap_or("<invalid utf-8>")
    }

    pub fn obtain_line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .iter()
                .enumerate()
                .filter_map(|(index, n)| if *n == b'\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Obtain 1-based line and column information for a byte pointer.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let line_breaks = self.obtain_line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, pointer + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, pointer - break_point + 1)
        }
    }
}
