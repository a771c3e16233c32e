pub mod sequencer;

pub use sequencer::{InputSequencer, InputTiming};
