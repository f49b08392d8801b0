use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::face_embedding::FaceEmbedding;

/// Startup failure while reading the reference image directory.
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery directory not found: {0}")]
    NotFound(PathBuf),
    #[error("gallery directory {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A labelled reference face.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryEntry {
    pub label: String,
    pub embedding: FaceEmbedding,
}

impl GalleryEntry {
    pub fn new(label: impl Into<String>, embedding: FaceEmbedding) -> Self {
        Self {
            label: label.into(),
            embedding,
        }
    }
}

/// The fixed set of known faces. Read-only once built.
///
/// Labels are not required to be unique; two entries with the same label are
/// both kept and either one can produce a match.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn from_entries(entries: Vec<GalleryEntry>) -> Self {
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

    /// First entry (in gallery order) within `tolerance` of `embedding`.
    pub fn first_match(&self, embedding: &FaceEmbedding, tolerance: f64) -> Option<&GalleryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.embedding.matches(embedding, tolerance))
    }
}
