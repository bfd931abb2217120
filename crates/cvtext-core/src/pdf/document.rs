//! Opened-document handle shared by the extraction and rasterization steps.

use lopdf::{Document, ObjectId};
use tracing::debug;

use crate::error::{ExtractError, Result};

/// An opened, parsed document.
///
/// A handle is created from raw bytes at the start of one extraction
/// invocation, is exclusively owned by that invocation, and is dropped on
/// every exit path. No document state outlives the invocation boundary.
#[derive(Debug)]
pub struct DocumentHandle {
    doc: Document,
    /// Page numbers paired with their object ids, ascending.
    pages: Vec<(u32, ObjectId)>,
}

impl DocumentHandle {
    /// Parse `bytes` into a handle.
    ///
    /// Documents protected with an empty owner password are decrypted in
    /// place; any other parse or decryption failure is `DocumentCorrupt`.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| ExtractError::DocumentCorrupt(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| {
                ExtractError::DocumentCorrupt("document is password-protected".to_string())
            })?;
            debug!("decrypted document with empty password");
        }

        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        debug!("opened document with {} pages", pages.len());
        Ok(Self { doc, pages })
    }

    /// Number of pages in the document. Zero is legal here; the pipeline
    /// decides what a pageless document means.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page numbers in ascending order, as reported by the page tree
    /// (1-indexed).
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|(number, _)| *number)
    }

    pub(crate) fn page_id(&self, number: u32) -> Option<ObjectId> {
        self.pages
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, id)| *id)
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }
}
