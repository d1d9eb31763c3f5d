//! Single-page PDF derivation.

use crate::error::{StorageError, StorageResult};
use lopdf::Document;

/// Number of pages in a PDF.
pub fn page_count(data: &[u8]) -> StorageResult<usize> {
    let doc = Document::load_mem(data)
        .map_err(|e| StorageError::Derivation(format!("failed to parse PDF: {e}")))?;
    Ok(doc.get_pages().len())
}

/// Build a PDF containing only the first page of `data`.
///
/// Every other page is removed from the page tree, objects no longer
/// reachable from the trailer are pruned, and the result is renumbered and
/// serialized. The output depends only on the input bytes. A document with
/// no pages is an error rather than an empty result.
pub fn first_page(data: &[u8]) -> StorageResult<Vec<u8>> {
    let mut doc = Document::load_mem(data)
        .map_err(|e| StorageError::Derivation(format!("failed to parse PDF: {e}")))?;

    // get_pages is keyed by 1-based page number in document order.
    let pages = doc.get_pages();
    let Some(first) = pages.keys().next().copied() else {
        return Err(StorageError::Derivation("document has no pages".to_string()));
    };

    let rest: Vec<u32> = pages.keys().copied().filter(|n| *n != first).collect();
    if !rest.is_empty() {
        doc.delete_pages(&rest);
    }

    doc.prune_objects();
    doc.renumber_objects();

    let mut out = Vec::with_capacity(data.len().min(1 << 20));
    doc.save_to(&mut out)
        .map_err(|e| StorageError::Derivation(format!("failed to serialize PDF: {e}")))?;

    Ok(out)
}
