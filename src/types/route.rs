use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::page::PageId;

/// A navigable location: path plus optional query string.
///
/// Fragments are dropped on parse; they never trigger re-activation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Route {
    path: String,
    query: Option<String>,
}

impl Route {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    /// Parses a URL or a path. Scheme and authority are stripped if present.
    ///
    /// ```
    /// use scroll_anchor::types::route::Route;
    ///
    /// let r = Route::parse("https://dash.local/tools/chat?model=gpt#top");
    /// assert_eq!(r.path(), "/tools/chat");
    /// assert_eq!(r.query(), Some("model=gpt"));
    /// ```
    pub fn parse(url: &str) -> Self {
        let trimmed = url.trim();
        let without_fragment = trimmed.split('#').next().unwrap_or("");
        let local = match without_fragment.find("://") {
            Some(idx) => {
                let rest = &without_fragment[idx + 3..];
                match rest.find(['/', '?']) {
                    Some(slash) => &rest[slash..],
                    None => "/",
                }
            }
            None => without_fragment,
        };
        let (path, query) = match local.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (local, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self::new(&path, query)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The tool page this route renders, if any.
    pub fn page(&self) -> Option<PageId> {
        PageId::from_path(&self.path)
    }

    pub fn same_path(&self, other: &Route) -> bool {
        self.path == other.path
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new("/", None)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(q) => write!(f, "{}?{}", self.path, q),
            None => f.write_str(&self.path),
        }
    }
}

/// The route currently shown, shared by every component that keys storage by route.
pub type CurrentRoute = Rc<RefCell<Route>>;
