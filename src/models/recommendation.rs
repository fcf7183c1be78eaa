use serde::{Deserialize, Serialize};

use super::{Item, ItemId};

/// One ranked neighbor of a query item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: ItemId,
    pub score: f32,
}

/// A neighbor resolved against the catalog, as handed to the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: ItemId,
    pub title: String,
    pub release_date: Option<String>,
    pub score: f32,
    /// Filled in by the poster provider, if any
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl Recommendation {
    pub fn new(item: &Item, score: f32) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            release_date: item.release_date.clone(),
            score,
            poster_url: None,
        }
    }
}

/// Result of one "load more" call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Batch {
    pub items: Vec<Recommendation>,
    /// Cursor offset after this batch
    pub offset: usize,
    /// Fewer than the requested number of items came back
    pub exhausted: bool,
}

impl Batch {
    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.title.as_str()).collect()
    }
}
