pub mod cursor;
pub mod providers;
pub mod recommendations;
pub mod similarity;
pub mod title_resolver;
pub mod vectorizer;

pub use cursor::RecommendationCursor;
pub use recommendations::Recommender;
pub use title_resolver::{MatchMode, TitleResolver};
pub use vectorizer::{FeatureSource, FeatureVectorizer, Weighting};
