//! The browser-history boundary.
//!
//! The navigator only ever reads the current location and pushes or replaces
//! entries; everything browser-specific (the `history` API, `popstate`)
//! lives behind the [`History`] trait. Hosts without a browser, and every
//! test, use [`MemoryHistory`].

use std::cell::RefCell;
use url::Url;

/// The seam between the navigator and the host's location/history stack.
///
/// `push` and `replace` take the relative URL strings produced by link
/// construction; implementations resolve them against the current location.
pub trait History {
    /// The current location.
    fn location(&self) -> Url;
    /// Add a new entry.
    fn push(&self, url: &str);
    /// Replace the current entry.
    fn replace(&self, url: &str);
}

/// An in-process [`History`]: a growable entry stack.
///
/// External URL changes (the `popstate` analogue) are simulated with
/// [`MemoryHistory::set_location`]; the host then asks the navigator to
/// re-resolve.
pub struct MemoryHistory {
    current: RefCell<Url>,
    back_stack: RefCell<Vec<Url>>,
}

impl MemoryHistory {
    /// Create a history whose single entry is `initial` (an absolute URL).
    pub fn new(initial: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(initial)?;
        Ok(Self {
            current: RefCell::new(url),
            back_stack: RefCell::new(Vec::new()),
        })
    }

    /// Overwrite the current location without touching the stack depth, as
    /// an external navigation (back/forward, address bar) would.
    pub fn set_location(&self, url: &str) {
        if let Some(resolved) = self.resolve(url) {
            *self.current.borrow_mut() = resolved;
        }
    }

    /// Number of entries on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.back_stack.borrow().len() + 1
    }

    fn resolve(&self, url: &str) -> Option<Url> {
        match self.location().join(url) {
            Ok(resolved) => Some(resolved),
            Err(error) => {
                tracing::warn!(url, %error, "ignoring navigation to unparsable url");
                None
            }
        }
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        self.current.borrow().clone()
    }

    fn push(&self, url: &str) {
        if let Some(resolved) = self.resolve(url) {
            let previous = self.current.replace(resolved);
            self.back_stack.borrow_mut().push(previous);
        }
    }

    fn replace(&self, url: &str) {
        if let Some(resolved) = self.resolve(url) {
            *self.current.borrow_mut() = resolved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_the_stack_and_moves_the_location() {
        let history = MemoryHistory::new("https://example.com/").unwrap();
        history.push("/studios?limit=10");
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.location().as_str(),
            "https://example.com/studios?limit=10"
        );
    }

    #[test]
    fn replace_keeps_the_stack_depth() {
        let history = MemoryHistory::new("https://example.com/").unwrap();
        history.push("/a");
        history.replace("/b");
        assert_eq!(history.len(), 2);
        assert_eq!(history.location().path(), "/b");
    }

    #[test]
    fn relative_urls_resolve_against_the_current_location() {
        let history = MemoryHistory::new("https://example.com/base").unwrap();
        history.push("/#/studios?like=x");
        assert_eq!(
            history.location().as_str(),
            "https://example.com/#/studios?like=x"
        );
    }

    #[test]
    fn set_location_simulates_external_navigation() {
        let history = MemoryHistory::new("https://example.com/").unwrap();
        history.set_location("/studios");
        assert_eq!(history.len(), 1);
        assert_eq!(history.location().path(), "/studios");
    }
}
