use crate::recognition::domain::embedding::Embedding;

/// One labeled reference face.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryEntry {
    pub label: String,
    pub embedding: Embedding,
}

impl GalleryEntry {
    pub fn new(label: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            label: label.into(),
            embedding,
        }
    }
}

/// Reference faces, loaded once before the stream starts.
///
/// Entry order is significant: the matcher resolves equal scores in favor
/// of the earlier entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}
