//! Interfaces the engine needs from the host platform, and the ones it
//! drives on the presentation side.
//!
//! Everything here is implemented by the embedding application (on macOS:
//! CoreGraphics capture, Vision text recognition, the AX API, CGEvent
//! injection and NSPasteboard). Calls are blocking; the detection loop runs
//! the slow ones on `spawn_blocking` workers.

use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::errors::Capability;
use crate::geometry::{AxRect, Point, ScreenRect, ScreenSize};
use crate::models::{ElementHandle, RecognizedTextCandidate};

/// One sample of the primary display.
#[derive(Debug, Clone)]
pub struct DisplaySample {
    pub image: DynamicImage,
    /// Display frame in points; differs from the image size on HiDPI screens.
    pub screen: ScreenSize,
    pub scale_factor: f64,
}

pub trait DisplayCapture: Send + Sync {
    /// Fails when the screen-recording grant is missing.
    fn capture(&self) -> Result<DisplaySample>;

    /// Primary display frame in points, without sampling pixels.
    fn screen_size(&self) -> Option<ScreenSize>;
}

pub trait TextRecognizer: Send + Sync {
    /// Candidates in the recognizer's own enumeration order.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedTextCandidate>>;
}

/// Read access to the foreground application's accessibility tree.
///
/// Missing attributes are routine; callers treat an `Err` from `role` or
/// `children` as "nothing known about this node".
pub trait AccessibilityTree: Send + Sync {
    fn focused_root(&self) -> Option<ElementHandle>;
    fn role(&self, element: ElementHandle) -> Result<String>;
    fn children(&self, element: ElementHandle) -> Result<Vec<ElementHandle>>;
    fn rect(&self, element: ElementHandle) -> Option<AxRect>;
    fn set_focus(&self, element: ElementHandle) -> Result<()>;
}

/// Synthetic input. Fire-and-forget; the sequencer owns all timing.
pub trait InputDriver: Send + Sync {
    fn move_cursor(&self, to: Point);
    fn mouse_down(&self, at: Point);
    fn mouse_up(&self, at: Point);
    /// `utf16` is the UTF-16 encoding of a single character.
    fn key_down(&self, utf16: &[u16]);
    fn key_up(&self, utf16: &[u16]);
}

pub trait ClipboardAccess: Send + Sync {
    fn read_text(&self) -> Option<String>;
    /// Monotonic counter bumped by every clipboard write. Only compared for
    /// equality within this process.
    fn change_token(&self) -> u64;
    fn write_text(&self, text: &str);
    /// Platform copy shortcut (Cmd+C) sent to the focused application.
    fn synthesize_copy_shortcut(&self);
}

pub trait PermissionProbe: Send + Sync {
    fn has_screen_capture_permission(&self) -> bool;
    fn has_automation_permission(&self) -> bool;

    fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ScreenCapture => self.has_screen_capture_permission(),
            Capability::Automation => self.has_automation_permission(),
        }
    }
}

/// Renderer for highlight and click feedback.
///
/// Highlight rects come straight from `CoordinateMapper`, so their vertical
/// origin depends on the path that produced them: recognition rects are the
/// unflipped bottom-up scale, accessibility rects are flipped to top-left.
/// See the table on [`crate::geometry::CoordinateMapper`].
pub trait OverlaySink: Send + Sync {
    fn highlight(&self, rect: ScreenRect);
    fn clear(&self);
    fn click_indicator(&self, at: Point);
    fn captured_text(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str, severity: Severity);
}

/// Bundle of host collaborators handed to the engine.
#[derive(Clone)]
pub struct HostBridge {
    pub display: Arc<dyn DisplayCapture>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub accessibility: Arc<dyn AccessibilityTree>,
    pub input: Arc<dyn InputDriver>,
    pub clipboard: Arc<dyn ClipboardAccess>,
    pub permissions: Arc<dyn PermissionProbe>,
    pub overlay: Arc<dyn OverlaySink>,
    pub status: Arc<dyn StatusSink>,
}

impl HostBridge {
    pub fn report(&self, message: &str, severity: Severity) {
        self.status.status(message, severity);
    }
}
