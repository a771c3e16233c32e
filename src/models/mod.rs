pub mod candidate;
pub mod query;

pub use candidate::{ElementHandle, FieldCandidate, RecognizedTextCandidate};
pub use query::{DetectionMode, DetectionQuery, SessionRequest};
