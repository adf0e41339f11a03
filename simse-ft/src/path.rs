use std::cmp::Ordering;
use std::fmt;

use crate::error::TreeError;

// ── Constants ───────────────────────────────────────────────────────────────

pub const SEPARATOR: char = '/';

// ── Limits ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PathLimits {
    pub max_path_depth: usize,
    pub max_name_length: usize,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_path_depth: 64,
            max_name_length: 255,
        }
    }
}

// ── PathValue ───────────────────────────────────────────────────────────────

/// An immutable, parsed absolute path: an ordered sequence of components.
///
/// `"a/b"` and `"/a/b"` parse to the same value; rendering always uses the
/// leading-slash form. `.` and `..` are ordinary names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathValue {
    components: Vec<String>,
}

impl PathValue {
    /// Parse an absolute path string.
    ///
    /// Rejects the empty string, a lone `/`, trailing or doubled separators,
    /// and components containing control characters.
    pub fn parse(input: &str) -> Result<Self, TreeError> {
        let local = input.strip_prefix(SEPARATOR).unwrap_or(input);
        if local.is_empty() {
            return Err(TreeError::BadPath(format!(
                "Path has no components: {:?}",
                input
            )));
        }

        let mut components = Vec::new();
        for segment in local.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(TreeError::BadPath(format!(
                    "Path contains an empty component: {:?}",
                    input
                )));
            }
            if has_forbidden_chars(segment) {
                return Err(TreeError::BadPath(format!(
                    "Path component contains forbidden characters: {:?}",
                    input
                )));
            }
            components.push(segment.to_string());
        }

        Ok(Self { components })
    }

    /// Number of components. `/someRoot/aChild` has depth 2.
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// The ancestor of this path with `depth` components. Asking for the
    /// full depth yields a copy of the path itself.
    pub fn prefix(&self, depth: usize) -> Result<Self, TreeError> {
        if depth == 0 || depth > self.depth() {
            return Err(TreeError::NoSuchPath(format!(
                "No prefix of depth {} in {}",
                depth, self
            )));
        }
        Ok(Self {
            components: self.components[..depth].to_vec(),
        })
    }

    /// Length, in components, of the longest prefix shared with `other`.
    pub fn shared_prefix_depth(&self, other: &PathValue) -> usize {
        self.components
            .iter()
            .zip(&other.components)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// True if every component of `self` leads `other`. A path is a prefix
    /// of itself.
    pub fn is_prefix_of(&self, other: &PathValue) -> bool {
        self.depth() <= other.depth() && self.shared_prefix_depth(other) == self.depth()
    }

    /// The component at `level`, counting from 0.
    pub fn component(&self, level: usize) -> Option<&str> {
        self.components.get(level).map(String::as_str)
    }

    /// Check the path against configured limits. Returns `Some(error_message)`
    /// if invalid.
    pub fn validate(&self, limits: &PathLimits) -> Option<String> {
        if self.depth() > limits.max_path_depth {
            return Some(format!(
                "Path exceeds max depth ({})",
                limits.max_path_depth
            ));
        }
        for seg in &self.components {
            if seg.len() > limits.max_name_length {
                return Some(format!(
                    "Path segment exceeds max name length ({})",
                    limits.max_name_length
                ));
            }
        }
        None
    }
}

impl Ord for PathValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for PathValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.components {
            write!(f, "{}{}", SEPARATOR, seg)?;
        }
        Ok(())
    }
}

impl serde::Serialize for PathValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Check if a path segment contains control characters.
fn has_forbidden_chars(segment: &str) -> bool {
    segment.bytes().any(|b| b <= 0x1f)
}

// ── Tests ───────────────────────────────────────────────────────────────────
