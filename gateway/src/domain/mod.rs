pub mod errors;
pub mod events;
pub mod traits;

pub use errors::ParseError;
pub use events::{SubscribeRequest, VenueEvent};
pub use traits::{FetchError, RawOrder, RawSnapshot, SnapshotFetcher};
