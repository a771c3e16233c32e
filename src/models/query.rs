use serde::{Deserialize, Serialize};

use crate::errors::{Capability, DetectionError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionQuery {
    pub text: String,
    pub exact_match: bool,
    pub case_sensitive: bool,
}

impl DetectionQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exact_match: false,
            case_sensitive: false,
        }
    }

    pub fn exact(mut self, exact_match: bool) -> Self {
        self.exact_match = exact_match;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Second line of the start status, e.g. `Mode: Contains | Case-insensitive`.
    pub fn describe_mode(&self) -> String {
        format!(
            "Mode: {} | {}",
            if self.exact_match { "Exact" } else { "Contains" },
            if self.case_sensitive {
                "Case-sensitive"
            } else {
                "Case-insensitive"
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionMode {
    TextSearch,
    FieldTyping,
    SelectionMonitor,
}

impl DetectionMode {
    /// Modes driven by the poll timer. Selection monitoring reacts to
    /// pointer releases instead.
    pub fn polls(&self) -> bool {
        !matches!(self, DetectionMode::SelectionMonitor)
    }
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMode::TextSearch => f.write_str("text search"),
            DetectionMode::FieldTyping => f.write_str("field typing"),
            DetectionMode::SelectionMonitor => f.write_str("selection monitor"),
        }
    }
}

/// Everything `DetectionController::start` needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub mode: DetectionMode,
    pub query: Option<DetectionQuery>,
    pub type_message: Option<String>,
    pub auto_click: bool,
    pub auto_type: bool,
}

impl SessionRequest {
    pub fn text_search(query: DetectionQuery) -> Self {
        Self {
            mode: DetectionMode::TextSearch,
            query: Some(query),
            type_message: None,
            auto_click: false,
            auto_type: false,
        }
    }

    pub fn field_typing(message: impl Into<String>) -> Self {
        Self {
            mode: DetectionMode::FieldTyping,
            query: None,
            type_message: Some(message.into()),
            auto_click: false,
            auto_type: true,
        }
    }

    pub fn selection_monitor() -> Self {
        Self {
            mode: DetectionMode::SelectionMonitor,
            query: None,
            type_message: None,
            auto_click: false,
            auto_type: false,
        }
    }

    pub fn with_auto_click(mut self, auto_click: bool) -> Self {
        self.auto_click = auto_click;
        self
    }

    /// Arms typing of `message` after the click that focuses the target.
    pub fn with_auto_type(mut self, message: impl Into<String>) -> Self {
        self.auto_type = true;
        self.type_message = Some(message.into());
        self
    }

    /// True when a settled target should trigger a synthetic click.
    pub fn action_armed(&self) -> bool {
        self.mode.polls() && (self.auto_click || self.auto_type)
    }

    /// Message to type once the click has focused the target.
    pub fn message_to_type(&self) -> Option<&str> {
        if !self.auto_type {
            return None;
        }
        self.type_message.as_deref().filter(|m| !m.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        match self.mode {
            DetectionMode::TextSearch => {
                let query = self.query.as_ref().ok_or(DetectionError::EmptyQuery)?;
                if query.text.trim().is_empty() {
                    return Err(DetectionError::EmptyQuery);
                }
                if self.auto_type && self.message_to_type().is_none() {
                    return Err(DetectionError::EmptyTypeMessage);
                }
            }
            DetectionMode::FieldTyping => {
                if self.message_to_type().is_none() {
                    return Err(DetectionError::EmptyTypeMessage);
                }
            }
            DetectionMode::SelectionMonitor => {}
        }
        Ok(())
    }

    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut required = Vec::new();
        if self.mode == DetectionMode::TextSearch {
            required.push(Capability::ScreenCapture);
        }
        if self.mode != DetectionMode::TextSearch || self.action_armed() {
            required.push(Capability::Automation);
        }
        required
    }
}
