//! The three coordinate spaces the engine moves between.
//!
//! - recognition space: [`NormalizedRect`], fractions of the sampled image
//!   with `y = 0` at the bottom.
//! - accessibility space: [`AxRect`], display points as the accessibility
//!   API reports them.
//! - display space: [`ScreenRect`] for the overlay renderer and
//!   [`InjectionPoint`] for synthetic input. The two are separate types
//!   because the overlay and the input injector disagree on where the
//!   origin is.

pub mod mapper;

pub use mapper::CoordinateMapper;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

macro_rules! rect_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        pub struct $name {
            pub x: f64,
            pub y: f64,
            pub width: f64,
            pub height: f64,
        }

        impl $name {
            pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
                Self { x, y, width, height }
            }

            pub fn center(&self) -> Point {
                Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
            }
        }
    };
}

rect_type!(
    /// Recognition-space box, each component in `[0, 1]`, origin bottom-left.
    NormalizedRect
);
rect_type!(
    /// Accessibility-space rect in display points.
    AxRect
);
rect_type!(
    /// Display-space rect as handed to the overlay renderer.
    ScreenRect
);

/// Display-space point for synthetic input.
///
/// Only [`CoordinateMapper`] builds these, so nothing raw from the
/// recognition or accessibility side can reach the input injector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InjectionPoint(Point);

impl InjectionPoint {
    fn from_mapper(point: Point) -> Self {
        Self(point)
    }

    pub fn point(&self) -> Point {
        self.0
    }
}

/// Both projections of one detected target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedTarget {
    pub highlight: ScreenRect,
    pub click_point: InjectionPoint,
}
