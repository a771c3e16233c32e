pub mod capture;

pub use capture::{CaptureOutcome, ClipboardSnapshot, ClipboardTiming, SelectionCapture};
