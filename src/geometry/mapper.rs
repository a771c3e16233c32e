use super::{AxRect, InjectionPoint, MappedTarget, NormalizedRect, Point, ScreenRect, ScreenSize};

/// Converts recognition and accessibility geometry into display space.
///
/// The two pipelines use opposite vertical conventions and deliberately do
/// not share a flip helper:
///
/// | path          | highlight            | click point           |
/// |---------------|----------------------|-----------------------|
/// | recognition   | linear scale, no flip| `y = H - center.y`    |
/// | accessibility | `y = H - y - h`      | rect center, no flip  |
///
/// These match the last stable behaviour observed on macOS. Validate them
/// against the target OS before trusting them elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    screen: ScreenSize,
}

impl CoordinateMapper {
    pub fn new(screen: ScreenSize) -> Self {
        Self { screen }
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Scales a normalized box to the display. No vertical flip: the
    /// recognition source is already bottom-up like the display.
    pub fn recognition_to_display(&self, b: &NormalizedRect) -> ScreenRect {
        ScreenRect::new(
            b.x * self.screen.width,
            b.y * self.screen.height,
            b.width * self.screen.width,
            b.height * self.screen.height,
        )
    }

    /// Inverse of [`Self::recognition_to_display`]. An empty screen maps
    /// everything to the zero box.
    pub fn display_to_recognition(&self, r: &ScreenRect) -> NormalizedRect {
        if self.screen.is_empty() {
            return NormalizedRect::default();
        }
        NormalizedRect::new(
            r.x / self.screen.width,
            r.y / self.screen.height,
            r.width / self.screen.width,
            r.height / self.screen.height,
        )
    }

    pub fn recognition_target(&self, b: &NormalizedRect) -> MappedTarget {
        let highlight = self.recognition_to_display(b);
        let center = highlight.center();
        MappedTarget {
            highlight,
            click_point: InjectionPoint::from_mapper(Point::new(
                center.x,
                self.screen.height - center.y,
            )),
        }
    }

    /// Accessibility rect flipped into the overlay's top-left origin.
    pub fn accessibility_to_overlay(&self, ax: &AxRect) -> ScreenRect {
        ScreenRect::new(ax.x, self.screen.height - ax.y - ax.height, ax.width, ax.height)
    }

    pub fn accessibility_target(&self, ax: &AxRect) -> MappedTarget {
        MappedTarget {
            highlight: self.accessibility_to_overlay(ax),
            click_point: InjectionPoint::from_mapper(ax.center()),
        }
    }
}
