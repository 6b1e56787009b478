use std::fmt;

use serde::{Deserialize, Serialize};

/// Tool pages that take part in scroll preservation on their own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PageId {
    Chat,
    DeepResearch,
    DataFormulator,
}

impl PageId {
    pub const ALL: [PageId; 3] = [PageId::Chat, PageId::DeepResearch, PageId::DataFormulator];

    /// Route segment that identifies the page.
    pub fn slug(&self) -> &'static str {
        match self {
            PageId::Chat => "chat",
            PageId::DeepResearch => "deep-research",
            PageId::DataFormulator => "data-formulator",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }

    /// Identifies the tool page a route path points at, using its last segment.
    ///
    /// `/tools/chat` and `/chat/` both resolve to [`PageId::Chat`].
    pub fn from_path(path: &str) -> Option<Self> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .last()
            .and_then(Self::from_slug)
    }

    /// Name of the "preserve scroll" broadcast for this page.
    pub fn signal_name(&self) -> String {
        format!("preserve-scroll:{}", self.slug())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
