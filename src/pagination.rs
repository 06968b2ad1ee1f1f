//! Character-budget pagination of large command output
//!
//! Output is cut into pages at token boundaries, where a token is either a
//! single newline or a run of non-newline characters. Every page is
//! recomputed from the full text on each call, so the same text, page and
//! page size always produce the same [`Page`].

use crate::error::ValidationError;
use crate::types::Page;
use std::borrow::Cow;

/// Return page `requested_page` (1-based) of `full_text`.
///
/// `page_size` is a soft ceiling in characters: a token longer than the
/// budget is never split and gets a page of its own, and a newline always
/// stays on the page holding the line it terminates.
pub fn paginate(full_text: &str, requested_page: usize, page_size: usize) -> Page {
    let mut ordinal = 1;
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for token in tokenize(full_text) {
        let token_len = token.chars().count();
        let terminates_line = token == "\n" && current.last().is_some_and(|last| *last != "\n");

        if current_len + token_len > page_size && !current.is_empty() && !terminates_line {
            if ordinal == requested_page {
                // The token that overflowed is still pending
                return Page::new(current.concat(), requested_page, true);
            }
            ordinal += 1;
            current.clear();
            current_len = 0;
        }

        current.push(token);
        current_len += token_len;
    }

    if ordinal == requested_page && !current.is_empty() {
        Page::new(current.concat(), requested_page, false)
    } else {
        Page::empty(requested_page)
    }
}

/// Split on newlines, keeping each newline as its own token
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for (index, _) in text.match_indices('\n') {
        if index > start {
            tokens.push(&text[start..index]);
        }
        tokens.push(&text[index..index + 1]);
        start = index + 1;
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }

    tokens
}

/// Plain head/tail line filter.
///
/// A simpler windowing mode than [`paginate`]: it keeps a fixed number of
/// lines from one end and is applied to the text before it is paginated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineWindow {
    head: Option<usize>,
    tail: Option<usize>,
}

impl LineWindow {
    pub fn new(head: Option<usize>, tail: Option<usize>) -> Result<Self, ValidationError> {
        if head.is_some() && tail.is_some() {
            return Err(ValidationError::ConflictingOptions(
                "head".to_string(),
                "tail".to_string(),
            ));
        }
        for (field, value) in [("head", head), ("tail", tail)] {
            if value == Some(0) {
                return Err(ValidationError::ConstraintViolation {
                    field: field.to_string(),
                    constraint: "at least 1".to_string(),
                    actual: "0".to_string(),
                });
            }
        }
        Ok(Self { head, tail })
    }

    pub fn head(lines: usize) -> Result<Self, ValidationError> {
        Self::new(Some(lines), None)
    }

    pub fn tail(lines: usize) -> Result<Self, ValidationError> {
        Self::new(None, Some(lines))
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match (self.head, self.tail) {
            (Some(n), _) => Cow::Owned(text.split_inclusive('\n').take(n).collect()),
            (None, Some(n)) => {
                let lines: Vec<&str> = text.split_inclusive('\n').collect();
                let skip = lines.len().saturating_sub(n);
                Cow::Owned(lines[skip..].concat())
            }
            (None, None) => Cow::Borrowed(text),
        }
    }
}
