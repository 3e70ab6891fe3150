pub mod custom_lists;
pub use custom_lists::CustomListService;

pub mod enrichment;
pub use enrichment::{EnrichmentService, FilledFields};

pub mod identify;
pub use identify::{Confidence, IdentifyResult};

pub mod library;
pub use library::{AnimeLibrary, BulkAddReport, LibraryError, bulk_candidates_from_text};

pub mod stats;
pub use stats::LibraryStats;

pub mod view;
pub use view::filter_and_sort;
