//! Display title → canonical item id.
//!
//! Titles repeat across the catalog, so every lookup collects all matches and
//! returns the lowest id among the best tier of matches.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, ItemId},
};

/// How a user-supplied title is matched against the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Title must equal the catalog title exactly
    #[default]
    Exact,
    /// Exact title first, then case-insensitive equality, then case-insensitive substring
    Contains,
}

/// Lookup tables over catalog titles, built once per snapshot
#[derive(Debug, Clone, Default)]
pub struct TitleResolver {
    /// title → lowest id carrying it
    exact: BTreeMap<String, ItemId>,
    /// lower-cased title → lowest id, ordered by id for substring scans
    folded: Vec<(String, ItemId)>,
}

impl TitleResolver {
    pub fn new(catalog: &Catalog) -> Self {
        let mut exact: BTreeMap<String, ItemId> = BTreeMap::new();
        for item in catalog.items() {
            exact
                .entry(item.title.clone())
                .and_modify(|id| *id = (*id).min(item.id))
                .or_insert(item.id);
        }

        let mut folded: Vec<(String, ItemId)> = catalog
            .items()
            .iter()
            .map(|item| (item.title.to_lowercase(), item.id))
            .collect();
        folded.sort_by_key(|&(_, id)| id);

        Self { exact, folded }
    }

    /// Resolves `title` to one id, or `TitleNotFound` carrying the query
    pub fn resolve(&self, title: &str, mode: MatchMode) -> AppResult<ItemId> {
        let query = title.trim();
        if query.is_empty() {
            return Err(AppError::InvalidArgument(
                "Title cannot be empty".to_string(),
            ));
        }

        if let Some(&id) = self.exact.get(query) {
            return Ok(id);
        }

        if mode == MatchMode::Contains {
            let needle = query.to_lowercase();
            // `folded` is id-ordered, so the first hit in each tier is the lowest id
            let hit = self
                .folded
                .iter()
                .find(|(folded, _)| *folded == needle)
                .or_else(|| self.folded.iter().find(|(folded, _)| folded.contains(&needle)));
            if let Some(&(_, id)) = hit {
                return Ok(id);
            }
        }

        tracing::debug!(title = %title, mode = ?mode, "No catalog match for title");
        Err(AppError::TitleNotFound(title.to_string()))
    }

    /// Distinct catalog titles in sorted order, for a selection list
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.exact.keys().map(String::as_str)
    }
}
