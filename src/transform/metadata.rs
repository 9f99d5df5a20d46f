use std::collections::BTreeSet;

use serde::Serialize;

/// Metadata collected during transformation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformMetadata {
    /// Runtime functions the generated code calls
    pub helpers_used: BTreeSet<String>,
    /// Builder calls rewritten
    pub rewrites: usize,
    pub doctype: bool,
}

impl TransformMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uses_escape(&self) -> bool {
        self.helpers_used.contains("htmlspecialchars")
    }

    pub fn uses_implode(&self) -> bool {
        self.helpers_used.contains("implode")
    }
}
