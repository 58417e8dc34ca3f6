//! Stack of open ancestors.
//!
//! The bottom entry is a synthetic root that is never popped; the top entry is
//! the parent of the next structural token. End tags are resolved against the
//! stack with a best-effort search so that out-of-order and missing closers
//! degrade the tree instead of failing the parse.

use crate::token::{TokenId, ROOT_ID};
use tracing::trace;

/// An element that opened a scope and has not been closed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenElement {
    pub id: TokenId,
    /// Lowercase short tag; empty for the root.
    pub name: String,
    pub level: usize,
}

/// Outcome of resolving an end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseResolution {
    /// A matching ancestor was found. Holds the popped ids, innermost first;
    /// the last entry is the matched element.
    Matched(Vec<TokenId>),
    /// No open ancestor has this name; the stack is untouched.
    Wild,
}

#[derive(Debug, Clone)]
pub struct AncestorStack {
    open_elements: Vec<OpenElement>,
}

impl Default for AncestorStack {
    fn default() -> Self {
        Self::new()
    }
}

impl AncestorStack {
    pub fn new() -> Self {
        Self {
            open_elements: vec![OpenElement {
                id: ROOT_ID,
                name: String::new(),
                level: 0,
            }],
        }
    }

    /// Level assigned to the next token created under the current top.
    pub fn level(&self) -> usize {
        self.open_elements.len() - 1
    }

    /// The current parent.
    pub fn peek(&self) -> &OpenElement {
        // The root is never popped.
        &self.open_elements[self.open_elements.len() - 1]
    }

    pub fn push(&mut self, id: TokenId, name: &str) {
        let level = self.level();
        trace!(id, name, level, "push");
        self.open_elements.push(OpenElement {
            id,
            name: name.to_ascii_lowercase(),
            level,
        });
    }

    /// Pop the top entry if it is `id`. Used to retract an element that turned
    /// out to be self-closing once its last fragment arrived.
    pub fn pop_if_top(&mut self, id: TokenId) -> bool {
        if id == ROOT_ID || self.peek().id != id {
            return false;
        }
        self.open_elements.pop();
        true
    }

    /// Resolve an end tag named `name` against the open ancestors.
    pub fn resolve_close(&mut self, name: &str) -> CloseResolution {
        let name = name.trim_start_matches('/');
        let found = self
            .open_elements
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, open)| open.name.eq_ignore_ascii_case(name))
            .map(|(index, _)| index);

        let Some(index) = found else {
            trace!(name, "no open ancestor");
            return CloseResolution::Wild;
        };

        let popped: Vec<TokenId> = self
            .open_elements
            .drain(index..)
            .rev()
            .map(|open| open.id)
            .collect();
        trace!(name, popped = popped.len(), "close resolved");
        CloseResolution::Matched(popped)
    }

    /// Ids of the elements still open, outermost first, root excluded.
    pub fn open_ids(&self) -> Vec<TokenId> {
        self.open_elements.iter().skip(1).map(|open| open.id).collect()
    }
}
