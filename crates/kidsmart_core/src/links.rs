//! crates/kidsmart_core/src/links.rs
//!
//! The kid-zone bookmark shelves. Each shelf combines read-only entries from a
//! published spreadsheet feed with locally owned bookmarks.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{ExternalLink, LinkKind};
use crate::ports::{FeedSource, KeyValueStore, PortResult};
use crate::seeds;
use crate::store::{link_key, ContentStore};

/// Card colors picked at random for new entries.
pub const CARD_COLORS: [&str; 6] = [
    "candy-pink",
    "candy-aqua",
    "candy-lemon",
    "candy-lavender",
    "candy-sky",
    "candy-mint",
];

pub fn random_color() -> &'static str {
    CARD_COLORS[rand::rng().random_range(0..CARD_COLORS.len())]
}

/// Parses published spreadsheet text into feed entries.
///
/// The first line is a header. Each remaining non-blank line needs at least
/// two columns: the last is the URL, the rest form the title. Tab-separated
/// lines take precedence over comma-separated ones.
pub fn parse_feed(text: &str, kind: LinkKind) -> Vec<ExternalLink> {
    text.split('\n')
        .enumerate()
        .skip(1)
        .filter_map(|(row, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (delimiter, joiner) = if line.contains('\t') {
                ('\t', " ")
            } else {
                (',', ",")
            };
            let parts: Vec<&str> = line.split(delimiter).collect();
            let (url, title_parts) = parts.split_last()?;
            if title_parts.is_empty() {
                return None;
            }
            let url = url.trim();
            let title = title_parts.join(joiner);
            let title = strip_outer_quotes(title.trim());
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(ExternalLink {
                id: format!("sheet_{}_{}", kind.as_str(), row),
                title: title.to_string(),
                url: url.to_string(),
                display_color: random_color().to_string(),
                originates_from_feed: true,
            })
        })
        .collect()
}

fn strip_outer_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

/// Fetches and parses a feed. Any failure yields an empty list.
pub async fn fetch_feed(source: &dyn FeedSource, url: &str, kind: LinkKind) -> Vec<ExternalLink> {
    if url.trim().is_empty() {
        return Vec::new();
    }
    match source.fetch_text(url).await {
        Ok(text) => parse_feed(&text, kind),
        Err(e) => {
            warn!(kind = kind.as_str(), url, error = %e, "feed fetch failed, showing local entries only");
            Vec::new()
        }
    }
}

/// Adds `https://` when `url` has no http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[derive(Debug, Default)]
struct Shelf {
    feed: Vec<ExternalLink>,
    local: Vec<ExternalLink>,
}

/// One shelf (stories or games).
pub struct LinkLibrary {
    kind: LinkKind,
    store: ContentStore<ExternalLink>,
    source: Arc<dyn FeedSource>,
    feed_url: Option<String>,
    shelf: Mutex<Shelf>,
}

impl LinkLibrary {
    pub fn new(
        kind: LinkKind,
        kv: Arc<dyn KeyValueStore>,
        source: Arc<dyn FeedSource>,
        feed_url: Option<String>,
    ) -> Self {
        Self {
            kind,
            store: ContentStore::new(kv, link_key(kind)),
            source,
            feed_url: feed_url.filter(|url| !url.trim().is_empty()),
            shelf: Mutex::new(Shelf::default()),
        }
    }

    fn shelf(&self) -> MutexGuard<'_, Shelf> {
        self.shelf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Reads local bookmarks and refreshes the feed. Built-in defaults are
    /// shown only when nothing was ever stored and no feed is configured.
    pub async fn load(&self) -> PortResult<Vec<ExternalLink>> {
        let local = if self.store.is_initialized()? {
            self.store.list_all()?
        } else if self.feed_url.is_none() {
            seeds::default_links(self.kind)
        } else {
            Vec::new()
        };
        self.shelf().local = local;

        if let Some(url) = &self.feed_url {
            let feed = fetch_feed(self.source.as_ref(), url, self.kind).await;
            info!(kind = self.kind.as_str(), entries = feed.len(), "feed loaded");
            if !feed.is_empty() {
                self.shelf().feed = feed;
            }
        }
        Ok(self.combined())
    }

    /// Feed entries first, then local ones.
    pub fn combined(&self) -> Vec<ExternalLink> {
        let shelf = self.shelf();
        shelf.feed.iter().chain(shelf.local.iter()).cloned().collect()
    }

    pub fn local(&self) -> Vec<ExternalLink> {
        self.shelf().local.clone()
    }

    /// Bookmarks a new link. Returns `None` when title or URL is blank.
    pub fn add_local(&self, title: &str, url: &str) -> PortResult<Option<ExternalLink>> {
        let (title, url) = (title.trim(), url.trim());
        if title.is_empty() || url.is_empty() {
            return Ok(None);
        }
        let link = ExternalLink {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            url: normalize_url(url),
            display_color: random_color().to_string(),
            originates_from_feed: false,
        };

        let mut shelf = self.shelf();
        let mut updated = Vec::with_capacity(shelf.local.len() + 1);
        updated.push(link.clone());
        updated.extend(shelf.local.iter().cloned());
        self.store.replace_all(&updated)?;
        shelf.local = updated;
        Ok(Some(link))
    }

    /// Removes a local bookmark. Feed entries cannot be deleted; returns
    /// whether anything was removed.
    pub fn delete(&self, id: &str) -> PortResult<bool> {
        let mut shelf = self.shelf();
        if shelf.feed.iter().any(|link| link.id == id) {
            warn!(kind = self.kind.as_str(), id, "refusing to delete a feed entry");
            return Ok(false);
        }
        if !shelf.local.iter().any(|link| link.id == id) {
            return Ok(false);
        }
        let updated: Vec<ExternalLink> = shelf
            .local
            .iter()
            .filter(|link| link.id != id)
            .cloned()
            .collect();
        self.store.replace_all(&updated)?;
        shelf.local = updated;
        Ok(true)
    }
}
