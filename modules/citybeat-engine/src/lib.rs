pub mod convert;
pub mod engine;
pub mod orchestrator;
pub mod playback;
pub mod search;
pub mod session;
pub mod sort;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use engine::MapEngine;
pub use playback::{PlaybackHandle, PlaybackSignal};
pub use search::SearchParams;
pub use sort::{FilterSpec, SortKey};
pub use store::{MapState, MapStats, SearchState};
pub use traits::{HourQuery, ImageProbe, MapGateway};
