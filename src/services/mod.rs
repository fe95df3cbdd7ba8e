pub mod likes;
pub mod recommendations;
pub mod song_search;
pub mod stores;

pub use recommendations::{get_recommendations, RECOMMENDATION_LIMIT};
pub use stores::{Catalog, LikeStore};
