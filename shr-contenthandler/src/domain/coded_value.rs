use serde::{Deserialize, Serialize};
use std::fmt;

/// A term from a coding scheme (e.g. a LOINC code or an IHE format code).
///
/// Equality and ordering compare `coding_scheme` first, then `code`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodedValue {
    coding_scheme: String,
    code: String,
}

impl CodedValue {
    pub fn new(coding_scheme: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            coding_scheme: coding_scheme.into(),
            code: code.into(),
        }
    }

    pub fn coding_scheme(&self) -> &str {
        &self.coding_scheme
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for CodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.coding_scheme, self.code)
    }
}
