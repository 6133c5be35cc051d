//! In-memory database dumps and restore sources.
//!
//! # Design
//! `dump` hands back the whole backup as a `Dump`, a byte buffer that reads
//! like a file and can be closed. `restore` accepts any `DumpSource`: a
//! reader that can tell whether it is still open. Restoring from a closed
//! source is refused before anything goes on the wire.

use std::fs::File;
use std::io::{self, Cursor, Read};

/// A readable byte source that knows whether it has been closed.
pub trait DumpSource: Read {
    fn is_closed(&self) -> bool;
}

/// Database backup held in memory.
#[derive(Debug, Clone)]
pub struct Dump {
    inner: Option<Cursor<Vec<u8>>>,
}

impl Dump {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Some(Cursor::new(bytes)),
        }
    }

    /// A dump that is already closed.
    pub fn closed() -> Self {
        Self { inner: None }
    }

    /// Release the buffer. Reads fail afterwards.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Whole content, regardless of the read position. `None` once closed.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.inner.as_ref().map(|c| c.get_ref().as_slice())
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.inner.map(Cursor::into_inner)
    }

    pub fn len(&self) -> usize {
        self.as_bytes().map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Read for Dump {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(cursor) => cursor.read(buf),
            None => Err(io::Error::other("read from closed dump")),
        }
    }
}

impl DumpSource for Dump {
    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl DumpSource for File {
    fn is_closed(&self) -> bool {
        false
    }
}

impl<T: AsRef<[u8]>> DumpSource for Cursor<T> {
    fn is_closed(&self) -> bool {
        false
    }
}

impl<S: DumpSource + ?Sized> DumpSource for &mut S {
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
