pub mod anime;
pub mod custom_list;
pub mod filters;

pub use anime::{AnimeRecord, NewAnime};
pub use custom_list::{CustomList, ListUpdate};
pub use filters::{AnimeFilters, SortOption};
