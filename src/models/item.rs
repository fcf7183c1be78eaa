use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{AppError, AppResult};

/// Stable catalog identifier (MovieLens `movie_id`)
pub type ItemId = u32;

/// A single catalog entry, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    /// Display title. Not unique across the catalog.
    pub title: String,
    /// Descriptive labels (genres)
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub imdb_url: Option<String>,
}

impl Item {
    /// Creates an item with no release metadata
    pub fn new<I, S>(id: ItemId, title: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            title: title.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            release_date: None,
            imdb_url: None,
        }
    }
}

/// Read-only snapshot of every item, in load order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    positions: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Builds a snapshot, rejecting duplicate ids
    pub fn new(items: Vec<Item>) -> AppResult<Self> {
        let mut positions = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if positions.insert(item.id, position).is_some() {
                return Err(AppError::Catalog(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }
        Ok(Self { items, positions })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.positions.get(&id).map(|&p| &self.items[p])
    }

}
