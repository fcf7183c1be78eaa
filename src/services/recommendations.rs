use crate::{
    error::{AppError, AppResult},
    models::{Batch, Catalog, Item, ItemId, Recommendation},
    services::{
        cursor::RecommendationCursor,
        similarity::SimilarityIndex,
        title_resolver::{MatchMode, TitleResolver},
        vectorizer::FeatureVectorizer,
    },
};

/// Content-based recommendation engine over one catalog snapshot
///
/// Built once at startup: vectorizes every item, computes the full similarity
/// matrix and the title lookup tables. Everything afterwards is read-only, so a
/// single instance can be shared across sessions behind an `Arc`.
#[derive(Debug)]
pub struct Recommender {
    catalog: Catalog,
    index: SimilarityIndex,
    resolver: TitleResolver,
}

impl Recommender {
    pub fn build(catalog: Catalog, vectorizer: &FeatureVectorizer) -> AppResult<Self> {
        let vectors = vectorizer.vectorize(catalog.items());
        let index = SimilarityIndex::build(&catalog, &vectors)?;
        let resolver = TitleResolver::new(&catalog);

        tracing::info!(
            item_count = catalog.len(),
            weighting = ?vectorizer.weighting(),
            "Recommender ready"
        );

        Ok(Self {
            catalog,
            index,
            resolver,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn resolver(&self) -> &TitleResolver {
        &self.resolver
    }

    /// Looks up the item a title resolves to
    pub fn resolve(&self, title: &str, mode: MatchMode) -> AppResult<&Item> {
        let id = self.resolver.resolve(title, mode)?;
        self.item(id)
    }

    /// Opens a cursor for a title; `TitleNotFound` when nothing matches
    pub fn query(&self, title: &str, mode: MatchMode) -> AppResult<RecommendationCursor> {
        let id = self.resolver.resolve(title, mode)?;
        self.open(id)
    }

    /// Opens a cursor for an item id
    pub fn open(&self, id: ItemId) -> AppResult<RecommendationCursor> {
        RecommendationCursor::open(&self.index, id)
    }

    /// Advances `cursor` and resolves the neighbors to catalog entries
    pub fn next_batch(
        &self,
        cursor: &mut RecommendationCursor,
        batch_size: usize,
    ) -> AppResult<Batch> {
        let neighbors = cursor.next(batch_size)?;
        let items = neighbors
            .iter()
            .map(|n| self.item(n.id).map(|item| Recommendation::new(item, n.score)))
            .collect::<AppResult<Vec<_>>>()?;

        let exhausted = items.len() < batch_size;
        Ok(Batch {
            items,
            offset: cursor.offset(),
            exhausted,
        })
    }

    /// One-shot top-N for a title
    pub fn recommend(
        &self,
        title: &str,
        mode: MatchMode,
        top_n: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let mut cursor = self.query(title, mode)?;
        Ok(self.next_batch(&mut cursor, top_n)?.items)
    }

    fn item(&self, id: ItemId) -> AppResult<&Item> {
        self.catalog.get(id).ok_or(AppError::ItemNotFound(id))
    }
}
