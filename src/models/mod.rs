pub mod event;
pub mod report;

pub use event::{LoginEvent, Location};
pub use report::{TravelDirection, TravelReport};
