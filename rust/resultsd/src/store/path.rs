use crate::error::{StoreError, StoreResult};

/// Characters the tree refuses in a path segment or object key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// Characters replaced by [`sanitize_key`]. `@` is storable but is replaced
/// too so email-derived keys stay readable in one form.
const SANITIZED_CHARS: [char; 6] = ['.', '@', '#', '$', '[', ']'];

/// A validated slash-separated location in the tree. The empty path is the
/// root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Single-segment path for a fixed top-level name. Only for names known
    /// to be valid keys.
    pub(crate) fn top_level(key: &'static str) -> Self {
        debug_assert!(is_valid_key(key) && !key.is_empty(), "bad top-level key {key:?}");
        Self {
            segments: vec![key.to_string()],
        }
    }

    /// Parses `a/b/c`. Leading and trailing slashes are ignored; empty
    /// interior segments are rejected.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for seg in trimmed.split('/') {
            if seg.is_empty() {
                return Err(StoreError::InvalidPath {
                    path: raw.to_string(),
                    reason: "empty segment".into(),
                });
            }
            if !is_valid_key(seg) {
                return Err(StoreError::InvalidPath {
                    path: raw.to_string(),
                    reason: format!("illegal characters in segment {seg:?}"),
                });
            }
            segments.push(seg.to_string());
        }
        Ok(Self { segments })
    }

    pub fn child(&self, key: &str) -> StoreResult<Self> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidPath {
                path: format!("{}/{}", self, key),
                reason: format!("illegal characters in segment {key:?}"),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment, i.e. the top-level row that holds this path.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(|s| s.as_str())
    }

    /// Segments below the top-level row.
    pub fn tail(&self) -> &[String] {
        self.segments.get(1..).unwrap_or(&[])
    }

    /// True when `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &DbPath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// True when a change at one path can alter the value seen at the other.
    pub fn overlaps(&self, other: &DbPath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl std::fmt::Display for DbPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Storable keys are non-empty and free of `.#$[]/` and control characters.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_ascii_control())
}

/// Replaces `.`, `@`, `#`, `$`, `[` and `]` with `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if SANITIZED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
