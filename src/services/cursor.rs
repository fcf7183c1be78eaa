use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, Neighbor},
    services::similarity::SimilarityIndex,
};

/// Pagination handle over one query's precomputed ranking.
///
/// The ranking is computed once in [`RecommendationCursor::open`] and never changes;
/// `offset` only moves forward and never passes the end of the ranking.
#[derive(Debug, Clone)]
pub struct RecommendationCursor {
    query_id: ItemId,
    ranked: Arc<[Neighbor]>,
    offset: usize,
}

impl RecommendationCursor {
    /// Ranks every other item against `query_id`. Unknown ids are rejected up front.
    pub fn open(index: &SimilarityIndex, query_id: ItemId) -> AppResult<Self> {
        let ranked = index.neighbors_of(query_id).map_err(|e| match e {
            AppError::ItemNotFound(id) => {
                AppError::InvalidArgument(format!("Cannot open cursor: unknown item id {}", id))
            }
            other => other,
        })?;

        Ok(Self {
            query_id,
            ranked: ranked.into(),
            offset: 0,
        })
    }

    pub fn query_id(&self) -> ItemId {
        self.query_id
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Full ranking, independent of how far the cursor has advanced
    pub fn ranked_neighbors(&self) -> &[Neighbor] {
        &self.ranked
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset == self.ranked.len()
    }

    /// Returns up to `batch_size` neighbors and advances past them.
    ///
    /// A short (possibly empty) slice means the ranking is exhausted.
    pub fn next(&mut self, batch_size: usize) -> AppResult<&[Neighbor]> {
        if batch_size == 0 {
            return Err(AppError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }

        let start = self.offset;
        let end = start.saturating_add(batch_size).min(self.ranked.len());
        self.offset = end;
        Ok(&self.ranked[start..end])
    }
}
