//! The aggregation pipeline: identity → dedup/score → interleave → page.

pub mod aggregate;
pub mod identity;
pub mod paginate;
pub mod run;

pub use aggregate::{aggregate, EXTERNAL_DECAY_STEP, EXTERNAL_TOP_SCORE, LOCAL_BOOST};
pub use identity::normalize_url;
pub use paginate::paginate;
pub use run::{run_search, NO_RESULTS_MESSAGE, NO_SOURCES_MESSAGE};
