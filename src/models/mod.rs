mod item;
mod recommendation;

pub use item::{Catalog, Item, ItemId};
pub use recommendation::{Batch, Neighbor, Recommendation};
