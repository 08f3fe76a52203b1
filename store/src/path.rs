//! Collection and document paths.
//!
//! Paths alternate collection and document segments, so a collection path
//! always has an odd number of segments and a document path an even number:
//! `temples` is a collection, `temples/abc` a document in it,
//! `temples/abc/media` a subcollection of that document.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Largest accepted segment, in bytes.
pub const MAX_SEGMENT_BYTES: usize = 1500;

fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("path segment must not be empty".into()));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "path segment '{segment}' must not contain '/'"
        )));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidPath(format!(
            "path segment '{segment}' is not allowed"
        )));
    }
    if segment.len() > 4 && segment.starts_with("__") && segment.ends_with("__") {
        return Err(StoreError::InvalidPath(format!(
            "path segment '{segment}' is reserved"
        )));
    }
    if segment.len() > MAX_SEGMENT_BYTES {
        return Err(StoreError::InvalidPath(format!(
            "path segment exceeds {MAX_SEGMENT_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Path to a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> StoreResult<Self> {
        validate_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Parse a slash-separated collection path such as `temples/abc/media`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "'{path}' has an even number of segments and names a document"
            )));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Document `id` inside this collection.
    pub fn doc(&self, id: &str) -> StoreResult<DocPath> {
        validate_segment(id)?;
        Ok(DocPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    /// The last segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// The document owning this collection, if it is a subcollection.
    #[must_use]
    pub fn parent(&self) -> Option<DocPath> {
        let n = self.segments.len();
        if n < 3 {
            return None;
        }
        Some(DocPath {
            collection: Self {
                segments: self.segments[..n - 2].to_vec(),
            },
            id: self.segments[n - 2].clone(),
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Storage key: segments joined by `/`.
    #[must_use]
    pub fn key(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Path to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    /// Parse a slash-separated document path such as `temples/abc`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let (parent, id) = path.rsplit_once('/').ok_or_else(|| {
            StoreError::InvalidPath(format!("'{path}' names a collection, not a document"))
        })?;
        CollectionPath::parse(parent)?.doc(id)
    }

    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Subcollection `name` under this document.
    pub fn subcollection(&self, name: &str) -> StoreResult<CollectionPath> {
        validate_segment(name)?;
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_render() {
        let temples = CollectionPath::root("temples").unwrap();
        let doc = temples.doc("kedarnath").unwrap();
        let media = doc.subcollection("media").unwrap();
        let image = media.doc("img1").unwrap();

        assert_eq!(doc.to_string(), "temples/kedarnath");
        assert_eq!(media.to_string(), "temples/kedarnath/media");
        assert_eq!(image.to_string(), "temples/kedarnath/media/img1");
        assert_eq!(media.name(), "media");
        assert_eq!(media.parent(), Some(doc));
        assert_eq!(temples.parent(), None);
    }

    #[test]
    fn parse_checks_segment_parity() {
        assert!(CollectionPath::parse("temples").is_ok());
        assert!(CollectionPath::parse("temples/a/media").is_ok());
        assert!(CollectionPath::parse("temples/a").is_err());
        assert!(DocPath::parse("temples/a").is_ok());
        assert!(DocPath::parse("temples").is_err());
        assert!(DocPath::parse("temples/a/media").is_err());
    }

    #[test]
    fn rejects_bad_segments() {
        for bad in ["", ".", "..", "a/b", "__name__"] {
            assert!(
                matches!(CollectionPath::root(bad), Err(StoreError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(CollectionPath::root("__").is_ok());
        assert!(CollectionPath::root(&"x".repeat(MAX_SEGMENT_BYTES + 1)).is_err());
        assert!(CollectionPath::parse("temples//media").is_err());
    }
}
