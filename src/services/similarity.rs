//! Pairwise cosine similarity over the whole catalog.
//!
//! The matrix is computed eagerly, exactly once per catalog snapshot, and never
//! mutated afterwards. Every query reads it through a shared reference.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, ItemId, Neighbor},
    services::vectorizer::FeatureVector,
};

/// Cosine similarity; 0 when either vector has zero norm
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    cosine_with_norms(a, b, a.norm(), b.norm())
}

fn cosine_with_norms(a: &FeatureVector, b: &FeatureVector, norm_a: f64, norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }

    let result = a.dot(b) / denom;
    if !result.is_finite() {
        return 0.0;
    }
    // Non-negative weights keep this in [0, 1] up to rounding
    result.clamp(0.0, 1.0)
}

/// Dense, symmetric N×N similarity matrix
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Computes the upper triangle and mirrors it, so symmetry is exact
    pub fn build(vectors: &[FeatureVector]) -> Self {
        let size = vectors.len();
        let norms: Vec<f64> = vectors.iter().map(FeatureVector::norm).collect();
        let mut values = vec![0.0f32; size * size];

        for i in 0..size {
            for j in i..size {
                let sim = cosine_with_norms(&vectors[i], &vectors[j], norms[i], norms[j]) as f32;
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Similarity between rows `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}

/// Score descending, then id ascending
pub fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Matrix plus the id ↔ row mapping needed to answer neighbor queries
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    ids: Vec<ItemId>,
    rows: HashMap<ItemId, usize>,
    matrix: SimilarityMatrix,
}

impl SimilarityIndex {
    /// `vectors` must be in catalog order
    pub fn build(catalog: &Catalog, vectors: &[FeatureVector]) -> AppResult<Self> {
        if catalog.len() != vectors.len() {
            return Err(AppError::Internal(format!(
                "expected {} feature vectors, got {}",
                catalog.len(),
                vectors.len()
            )));
        }

        let matrix = SimilarityMatrix::build(vectors);
        let ids: Vec<ItemId> = catalog.items().iter().map(|item| item.id).collect();
        let rows = ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();

        tracing::info!(
            item_count = matrix.size(),
            "Built similarity matrix"
        );

        Ok(Self { ids, rows, matrix })
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn row_of(&self, id: ItemId) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    /// Similarity between two catalog items
    pub fn similarity(&self, a: ItemId, b: ItemId) -> AppResult<f32> {
        let i = self.row_of(a).ok_or(AppError::ItemNotFound(a))?;
        let j = self.row_of(b).ok_or(AppError::ItemNotFound(b))?;
        Ok(self.matrix.get(i, j))
    }

    /// Every other item ranked by similarity to `id`; never truncated
    pub fn neighbors_of(&self, id: ItemId) -> AppResult<Vec<Neighbor>> {
        let row = self.row_of(id).ok_or(AppError::ItemNotFound(id))?;

        let mut neighbors: Vec<Neighbor> = self
            .matrix
            .row(row)
            .iter()
            .zip(&self.ids)
            .filter(|&(_, &other)| other != id)
            .map(|(&score, &other)| Neighbor { id: other, score })
            .collect();

        neighbors.sort_by(rank_order);
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::services::vectorizer::FeatureVectorizer;

    fn index_for(items: Vec<Item>) -> SimilarityIndex {
        let vectors = FeatureVectorizer::default().vectorize(&items);
        let catalog = Catalog::new(items).unwrap();
        SimilarityIndex::build(&catalog, &vectors).unwrap()
    }

    #[test]
    fn test_cosine_of_zero_vector_is_zero() {
        let vectors = FeatureVectorizer::default().vectorize(&[
            Item::new(1, "A", ["Comedy"]),
            Item::new(2, "B", Vec::<String>::new()),
        ]);

        assert_eq!(cosine_similarity(&vectors[0], &vectors[1]), 0.0);
        assert_eq!(cosine_similarity(&vectors[1], &vectors[1]), 0.0);
        assert!((cosine_similarity(&vectors[0], &vectors[0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_tags_score_one() {
        let index = index_for(vec![
            Item::new(1, "A", ["Comedy"]),
            Item::new(2, "B", ["Comedy"]),
        ]);

        assert!((index.similarity(1, 2).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_comedy_neighbor_ranks_above_drama() {
        let index = index_for(vec![
            Item::new(1, "A", ["Comedy"]),
            Item::new(2, "B", ["Comedy"]),
            Item::new(3, "C", ["Drama"]),
        ]);

        let neighbors = index.neighbors_of(1).unwrap();
        let ids: Vec<ItemId> = neighbors.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(neighbors[1].score, 0.0);
    }

    #[test]
    fn test_empty_tags_are_dissimilar_to_everything() {
        let index = index_for(vec![
            Item::new(1, "Blank", Vec::<String>::new()),
            Item::new(2, "Also blank", Vec::<String>::new()),
            Item::new(3, "Tagged", ["Drama"]),
        ]);

        assert_eq!(index.similarity(1, 2).unwrap(), 0.0);
        assert_eq!(index.similarity(1, 3).unwrap(), 0.0);
        assert_eq!(index.similarity(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let index = index_for(vec![
            Item::new(40, "Q", ["War"]),
            Item::new(30, "X", ["War"]),
            Item::new(10, "Y", ["War"]),
            Item::new(20, "Z", ["War"]),
        ]);

        let ids: Vec<ItemId> = index.neighbors_of(40).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let index = index_for(vec![
            Item::new(1, "A", ["Action", "Comedy"]),
            Item::new(2, "B", ["Comedy", "Romance", "Drama"]),
            Item::new(3, "C", ["Action", "Thriller", "Sci-Fi"]),
        ]);

        let matrix = index.matrix();
        for i in 0..matrix.size() {
            for j in 0..matrix.size() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                assert!((0.0..=1.0).contains(&matrix.get(i, j)));
            }
        }
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let index = index_for(vec![Item::new(1, "A", ["Comedy"])]);

        assert!(matches!(index.neighbors_of(99), Err(AppError::ItemNotFound(99))));
    }

    #[test]
    fn test_singleton_catalog_has_no_neighbors() {
        let index = index_for(vec![Item::new(1, "A", ["Comedy"])]);

        assert!(index.neighbors_of(1).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_vector_count_is_rejected() {
        let catalog = Catalog::new(vec![Item::new(1, "A", ["Comedy"])]).unwrap();
        assert!(SimilarityIndex::build(&catalog, &[]).is_err());
    }
}
