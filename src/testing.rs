//! Scripted in-memory host used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use image::DynamicImage;

use crate::geometry::{AxRect, NormalizedRect, Point, ScreenRect, ScreenSize};
use crate::host_bridge::{
    AccessibilityTree, ClipboardAccess, DisplayCapture, DisplaySample, HostBridge, InputDriver,
    OverlaySink, PermissionProbe, Severity, StatusSink, TextRecognizer,
};
use crate::models::{ElementHandle, RecognizedTextCandidate};

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Highlight(ScreenRect),
    Clear,
    ClickIndicator(Point),
    Captured(String),
    Status(String, Severity),
    Move(Point),
    MouseDown(Point),
    MouseUp(Point),
    KeyDown(Vec<u16>),
    KeyUp(Vec<u16>),
    SetFocus(ElementHandle),
    CopyShortcut,
}

/// What the display + recognizer produce for one poll.
#[derive(Debug, Clone)]
pub enum Frame {
    Text(Vec<RecognizedTextCandidate>),
    CaptureFails,
    RecognitionFails,
}

impl Frame {
    pub fn single(text: &str, normalized_box: NormalizedRect) -> Self {
        Frame::Text(vec![RecognizedTextCandidate::new(text, normalized_box)])
    }
}

#[derive(Debug, Clone)]
enum RoleEntry {
    Known(String),
    Unreadable,
}

#[derive(Debug, Clone)]
struct FakeNode {
    role: RoleEntry,
    children: Option<Vec<u64>>,
}

/// Accessibility tree built from `(id, role, children)` triples.
#[derive(Debug, Clone, Default)]
pub struct FakeTree {
    root: Option<u64>,
    nodes: HashMap<u64, FakeNode>,
    frames: HashMap<u64, AxRect>,
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, id: u64) -> Self {
        self.root = Some(id);
        self
    }

    pub fn node(mut self, id: u64, role: &str, children: &[u64]) -> Self {
        self.nodes.insert(
            id,
            FakeNode {
                role: RoleEntry::Known(role.to_string()),
                children: Some(children.to_vec()),
            },
        );
        self
    }

    pub fn broken_role(mut self, id: u64, children: &[u64]) -> Self {
        self.nodes.insert(
            id,
            FakeNode {
                role: RoleEntry::Unreadable,
                children: Some(children.to_vec()),
            },
        );
        self
    }

    pub fn broken_children(mut self, id: u64, role: &str) -> Self {
        self.nodes.insert(
            id,
            FakeNode {
                role: RoleEntry::Known(role.to_string()),
                children: None,
            },
        );
        self
    }

    pub fn frame(mut self, id: u64, rect: AxRect) -> Self {
        self.frames.insert(id, rect);
        self
    }
}

impl AccessibilityTree for FakeTree {
    fn focused_root(&self) -> Option<ElementHandle> {
        self.root.map(ElementHandle)
    }

    fn role(&self, element: ElementHandle) -> Result<String> {
        match self.nodes.get(&element.0).map(|n| &n.role) {
            Some(RoleEntry::Known(role)) => Ok(role.clone()),
            Some(RoleEntry::Unreadable) => Err(anyhow!("kAXErrorAttributeUnsupported")),
            None => Err(anyhow!("invalid element {}", element.0)),
        }
    }

    fn children(&self, element: ElementHandle) -> Result<Vec<ElementHandle>> {
        self.nodes
            .get(&element.0)
            .and_then(|n| n.children.clone())
            .map(|ids| ids.into_iter().map(ElementHandle).collect())
            .ok_or_else(|| anyhow!("kAXErrorNoValue"))
    }

    fn rect(&self, element: ElementHandle) -> Option<AxRect> {
        self.frames.get(&element.0).copied()
    }

    fn set_focus(&self, _element: ElementHandle) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FakeClipboard {
    content: Option<String>,
    token: u64,
    selection: Option<String>,
    writes: Vec<String>,
}

struct Shared {
    events: Mutex<Vec<HostEvent>>,
    screen: Mutex<ScreenSize>,
    frames: Mutex<VecDeque<Frame>>,
    last_frame: Mutex<Frame>,
    captures: AtomicUsize,
    recognize_delay: Mutex<Duration>,
    tree: Mutex<FakeTree>,
    clipboard: Mutex<FakeClipboard>,
    screen_permission: AtomicBool,
    automation_permission: AtomicBool,
}

#[derive(Clone)]
pub struct FakeHost {
    shared: Arc<Shared>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                events: Mutex::new(Vec::new()),
                screen: Mutex::new(ScreenSize::new(1000.0, 800.0)),
                frames: Mutex::new(VecDeque::new()),
                last_frame: Mutex::new(Frame::Text(Vec::new())),
                captures: AtomicUsize::new(0),
                recognize_delay: Mutex::new(Duration::ZERO),
                tree: Mutex::new(FakeTree::new()),
                clipboard: Mutex::new(FakeClipboard::default()),
                screen_permission: AtomicBool::new(true),
                automation_permission: AtomicBool::new(true),
            }),
        }
    }

    pub fn bridge(&self) -> HostBridge {
        let shared = self.shared.clone();
        HostBridge {
            display: shared.clone(),
            recognizer: shared.clone(),
            accessibility: shared.clone(),
            input: shared.clone(),
            clipboard: shared.clone(),
            permissions: shared.clone(),
            overlay: shared.clone(),
            status: shared,
        }
    }

    /// Frames are served in order; the last one repeats once the queue is empty.
    pub fn push_frames(&self, frames: impl IntoIterator<Item = Frame>) {
        self.shared.frames.lock().unwrap().extend(frames);
    }

    pub fn set_screen(&self, screen: ScreenSize) {
        *self.shared.screen.lock().unwrap() = screen;
    }

    pub fn set_recognize_delay(&self, delay: Duration) {
        *self.shared.recognize_delay.lock().unwrap() = delay;
    }

    pub fn set_tree(&self, tree: FakeTree) {
        *self.shared.tree.lock().unwrap() = tree;
    }

    pub fn set_permissions(&self, screen: bool, automation: bool) {
        self.shared.screen_permission.store(screen, Ordering::SeqCst);
        self.shared.automation_permission.store(automation, Ordering::SeqCst);
    }

    pub fn set_clipboard(&self, text: &str) {
        let mut clip = self.shared.clipboard.lock().unwrap();
        clip.content = Some(text.to_string());
        clip.token += 1;
    }

    pub fn set_selection(&self, selection: Option<&str>) {
        self.shared.clipboard.lock().unwrap().selection = selection.map(String::from);
    }

    pub fn clipboard_text(&self) -> Option<String> {
        self.shared.clipboard.lock().unwrap().content.clone()
    }

    pub fn clipboard_token(&self) -> u64 {
        self.shared.clipboard.lock().unwrap().token
    }

    pub fn clipboard_writes(&self) -> Vec<String> {
        self.shared.clipboard.lock().unwrap().writes.clone()
    }

    pub fn capture_count(&self) -> usize {
        self.shared.captures.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.shared.events.lock().unwrap().clone()
    }

    pub fn input_events(&self) -> Vec<HostEvent> {
        self.events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    HostEvent::ClickIndicator(_)
                        | HostEvent::Move(_)
                        | HostEvent::MouseDown(_)
                        | HostEvent::MouseUp(_)
                        | HostEvent::KeyDown(_)
                        | HostEvent::KeyUp(_)
                )
            })
            .collect()
    }

    pub fn overlay_events(&self) -> Vec<HostEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, HostEvent::Highlight(_) | HostEvent::Clear))
            .collect()
    }

    pub fn statuses(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Status(message, severity) => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn captured(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Captured(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::MouseDown(at) => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn typed_text(&self) -> String {
        let units: Vec<u16> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::KeyDown(units) => Some(units),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf16_lossy(&units)
    }
}

impl Shared {
    fn record(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn next_frame(&self) -> Frame {
        let mut last = self.last_frame.lock().unwrap();
        if let Some(frame) = self.frames.lock().unwrap().pop_front() {
            *last = frame;
        }
        last.clone()
    }
}

impl DisplayCapture for Shared {
    fn capture(&self) -> Result<DisplaySample> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if !self.screen_permission.load(Ordering::SeqCst) {
            return Err(anyhow!("CGDisplayCreateImage returned nil"));
        }
        if let Frame::CaptureFails = self.next_frame() {
            return Err(anyhow!("CGDisplayCreateImage returned nil"));
        }
        Ok(DisplaySample {
            image: DynamicImage::new_rgba8(4, 4),
            screen: *self.screen.lock().unwrap(),
            scale_factor: 2.0,
        })
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        Some(*self.screen.lock().unwrap())
    }
}

impl TextRecognizer for Shared {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RecognizedTextCandidate>> {
        let delay = *self.recognize_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match self.last_frame.lock().unwrap().clone() {
            Frame::Text(candidates) => Ok(candidates),
            Frame::CaptureFails | Frame::RecognitionFails => {
                Err(anyhow!("VNRecognizeTextRequest failed"))
            }
        }
    }
}

impl AccessibilityTree for Shared {
    fn focused_root(&self) -> Option<ElementHandle> {
        self.tree.lock().unwrap().focused_root()
    }

    fn role(&self, element: ElementHandle) -> Result<String> {
        self.tree.lock().unwrap().role(element)
    }

    fn children(&self, element: ElementHandle) -> Result<Vec<ElementHandle>> {
        self.tree.lock().unwrap().children(element)
    }

    fn rect(&self, element: ElementHandle) -> Option<AxRect> {
        self.tree.lock().unwrap().rect(element)
    }

    fn set_focus(&self, element: ElementHandle) -> Result<()> {
        self.record(HostEvent::SetFocus(element));
        Ok(())
    }
}

impl InputDriver for Shared {
    fn move_cursor(&self, to: Point) {
        self.record(HostEvent::Move(to));
    }

    fn mouse_down(&self, at: Point) {
        self.record(HostEvent::MouseDown(at));
    }

    fn mouse_up(&self, at: Point) {
        self.record(HostEvent::MouseUp(at));
    }

    fn key_down(&self, utf16: &[u16]) {
        self.record(HostEvent::KeyDown(utf16.to_vec()));
    }

    fn key_up(&self, utf16: &[u16]) {
        self.record(HostEvent::KeyUp(utf16.to_vec()));
    }
}

impl ClipboardAccess for Shared {
    fn read_text(&self) -> Option<String> {
        self.clipboard.lock().unwrap().content.clone()
    }

    fn change_token(&self) -> u64 {
        self.clipboard.lock().unwrap().token
    }

    fn write_text(&self, text: &str) {
        let mut clip = self.clipboard.lock().unwrap();
        clip.content = Some(text.to_string());
        clip.token += 1;
        clip.writes.push(text.to_string());
    }

    fn synthesize_copy_shortcut(&self) {
        self.record(HostEvent::CopyShortcut);
        let mut clip = self.clipboard.lock().unwrap();
        if let Some(selection) = clip.selection.clone() {
            clip.content = Some(selection);
            clip.token += 1;
        }
    }
}

impl PermissionProbe for Shared {
    fn has_screen_capture_permission(&self) -> bool {
        self.screen_permission.load(Ordering::SeqCst)
    }

    fn has_automation_permission(&self) -> bool {
        self.automation_permission.load(Ordering::SeqCst)
    }
}

impl OverlaySink for Shared {
    fn highlight(&self, rect: ScreenRect) {
        self.record(HostEvent::Highlight(rect));
    }

    fn clear(&self) {
        self.record(HostEvent::Clear);
    }

    fn click_indicator(&self, at: Point) {
        self.record(HostEvent::ClickIndicator(at));
    }

    fn captured_text(&self, text: &str) {
        self.record(HostEvent::Captured(text.to_string()));
    }
}

impl StatusSink for Shared {
    fn status(&self, message: &str, severity: Severity) {
        self.record(HostEvent::Status(message.to_string(), severity));
    }
}
