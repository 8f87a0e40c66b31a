use std::collections::HashSet;

/// Identifies a page of results that has already been processed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageToken {
    /// Normalized URL of a fetched page (link-based pagination)
    Url(String),
    /// Document scroll height after a reveal (scroll-based pagination)
    Height(u64),
}

/// Page tokens seen during one traversal run
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<PageToken>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a token. Returns false if it had already been visited.
    pub fn insert(&mut self, token: PageToken) -> bool {
        if self.seen.contains(&token) {
            ::log::trace!("Already visited: {:?}", token);
            return false;
        }
        self.seen.insert(token);
        true
    }

    pub fn contains(&self, token: &PageToken) -> bool {
        self.seen.contains(token)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
