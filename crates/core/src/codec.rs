//! Keyed, partial, self-inverse byte obfuscation.
//!
//! Outgoing documents are XORed with a short per-token key: every byte of
//! the leading [`FULL_REGION`] bytes, then every [`SPARSE_STRIDE`]th byte of
//! the remainder. The key byte for absolute offset `i` is always
//! `key[i % key.len()]`, so applying [`transform`] twice with the same key
//! restores the input. Decoding is the same operation.
//!
//! # Threat model
//!
//! This is **not encryption**. The key is a handful of random bytes, it is
//! reused cyclically, the coverage pattern is public, and most of the tail is
//! left untouched. Anyone holding the key (which the viewer page embeds) or
//! willing to brute force a few bytes against the well-known `%PDF-` header
//! recovers the document. The only goal is that a payload lifted from the
//! network panel or a proxy log is not directly openable as a PDF. Do not
//! rely on it for confidentiality.

/// Leading bytes that are transformed in full (10 KiB).
pub const FULL_REGION: usize = 10 * 1024;

/// Distance between transformed bytes after [`FULL_REGION`].
pub const SPARSE_STRIDE: usize = 50;

/// Whether the byte at absolute offset `i` is covered.
#[inline]
pub fn is_covered(i: usize) -> bool {
    i < FULL_REGION || (i - FULL_REGION) % SPARSE_STRIDE == 0
}

/// Apply the transformation in place.
///
/// An empty key leaves the buffer unchanged.
pub fn transform_in_place(buf: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }

    let head = buf.len().min(FULL_REGION);
    for (i, byte) in buf[..head].iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }

    let mut i = FULL_REGION;
    while i < buf.len() {
        buf[i] ^= key[i % key.len()];
        i += SPARSE_STRIDE;
    }
}

/// Return a transformed copy of `data`.
pub fn transform(data: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    transform_in_place(&mut out, key);
    out
}
