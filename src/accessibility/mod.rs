pub mod locator;

pub use locator::{AccessibilitySettings, ElementLocator};
