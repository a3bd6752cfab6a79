//! Byte Buffer
//!
//! Growable, exclusively owned byte container used for record payloads on
//! both the write and the read path.
//!
//! Backed by `BytesMut`. Ownership moves; a copy only happens when the caller
//! asks for one with `clone()`.

use std::fmt;
use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};

/// Owned, resizable payload bytes
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    inner: BytesMut,
}

impl ByteBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            inner: BytesMut::new(),
        }
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Set the length to `new_len`.
    ///
    /// Growing zero-fills the new tail; shrinking keeps the allocation.
    pub fn resize(&mut self, new_len: usize) {
        self.inner.resize(new_len, 0);
    }

    /// Drop the contents, keeping the allocation
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.inner.extend_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.inner
    }

    /// Freeze into an immutable, cheaply shareable `Bytes`
    pub fn into_bytes(self) -> Bytes {
        self.inner.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.inner.to_vec()
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner
    }
}

impl DerefMut for ByteBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl AsMut<[u8]> for ByteBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.inner
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            inner: BytesMut::from(&bytes[..]),
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            inner: BytesMut::from(bytes),
        }
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}

impl From<BytesMut> for ByteBuffer {
    fn from(inner: BytesMut) -> Self {
        Self { inner }
    }
}

impl PartialEq<[u8]> for ByteBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<&[u8]> for ByteBuffer {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_slice() == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for ByteBuffer {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.len())
            .field("bytes", &Bytes::copy_from_slice(&self.inner))
            .finish()
    }
}
