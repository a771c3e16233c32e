use serde::{Deserialize, Serialize};

use crate::geometry::{AxRect, NormalizedRect};

/// One text region reported by the recognition source for a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedTextCandidate {
    pub text: String,
    /// Fractions of the sampled image, origin at the bottom-left.
    pub normalized_box: NormalizedRect,
}

impl RecognizedTextCandidate {
    pub fn new(text: impl Into<String>, normalized_box: NormalizedRect) -> Self {
        Self {
            text: text.into(),
            normalized_box,
        }
    }
}

/// Opaque token for an element in the host's accessibility tree.
///
/// The host owns the element; the token is only meaningful for the poll
/// cycle that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

/// An editable field located in the focused application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCandidate {
    pub element: ElementHandle,
    pub rect: AxRect,
}
