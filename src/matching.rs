use crate::models::{DetectionQuery, RecognizedTextCandidate};

/// Compares recognized text against a query.
///
/// The needle is folded once up front; candidates are folded per call.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
    exact_match: bool,
    case_sensitive: bool,
}

impl TextMatcher {
    pub fn new(query: &DetectionQuery) -> Self {
        Self {
            needle: fold(&query.text, query.case_sensitive),
            exact_match: query.exact_match,
            case_sensitive: query.case_sensitive,
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_match(&self, text: &str) -> bool {
        let haystack = fold(text, self.case_sensitive);
        if self.exact_match {
            haystack == self.needle
        } else {
            haystack.contains(self.needle.as_str())
        }
    }

    /// First candidate, in the source's enumeration order, that matches.
    /// No ranking: later hits in the same frame are never looked at.
    pub fn find_first<'a>(
        &self,
        candidates: &'a [RecognizedTextCandidate],
    ) -> Option<(usize, &'a RecognizedTextCandidate)> {
        candidates
            .iter()
            .enumerate()
            .find(|(_, candidate)| self.is_match(&candidate.text))
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}
