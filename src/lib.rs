//! Content-based movie recommendations over a MovieLens catalog.
//!
//! Items are vectorized from their genre tags, a full cosine similarity matrix
//! is built once per catalog snapshot, and each client session pages through a
//! precomputed ranking with a [`services::RecommendationCursor`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
