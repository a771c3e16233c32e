use serde::{Deserialize, Serialize};

use crate::host_bridge::AccessibilityTree;
use crate::models::{ElementHandle, FieldCandidate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilitySettings {
    /// Roles that count as an editable text field.
    pub field_roles: Vec<String>,
    /// Guards against hosts that report cyclic parent/child links.
    pub max_depth: usize,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            field_roles: ["AXTextField", "AXTextArea", "AXComboBox", "AXSearchField"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_depth: 64,
        }
    }
}

/// Depth-first, pre-order search for the first editable field.
#[derive(Debug, Clone)]
pub struct ElementLocator {
    settings: AccessibilitySettings,
}

impl ElementLocator {
    pub fn new(settings: AccessibilitySettings) -> Self {
        Self { settings }
    }

    /// First element under `root` (inclusive) whose role is a field role.
    ///
    /// A node whose role or children cannot be read is skipped, not fatal.
    pub fn find_first(
        &self,
        tree: &dyn AccessibilityTree,
        root: ElementHandle,
    ) -> Option<ElementHandle> {
        let mut stack = vec![(root, 0usize)];

        while let Some((element, depth)) = stack.pop() {
            match tree.role(element) {
                Ok(role) if self.is_field_role(&role) => return Some(element),
                Ok(_) => {}
                Err(err) => log::trace!("no role for {element:?}: {err}"),
            }

            if depth >= self.settings.max_depth {
                log::debug!("accessibility search hit max depth at {element:?}");
                continue;
            }

            match tree.children(element) {
                // Reversed so the first child is popped first.
                Ok(children) => stack.extend(children.into_iter().rev().map(|c| (c, depth + 1))),
                Err(err) => log::trace!("no children for {element:?}: {err}"),
            }
        }

        None
    }

    /// Focused app root, first field under it, and that field's frame.
    pub fn locate_field(&self, tree: &dyn AccessibilityTree) -> Option<FieldCandidate> {
        let root = tree.focused_root()?;
        let element = self.find_first(tree, root)?;
        let Some(rect) = tree.rect(element) else {
            log::debug!("field {element:?} has no frame");
            return None;
        };
        Some(FieldCandidate { element, rect })
    }

    fn is_field_role(&self, role: &str) -> bool {
        self.settings.field_roles.iter().any(|r| r == role)
    }
}
