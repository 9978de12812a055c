//! Replay of captured receiver streams

use super::{ByteSource, Chunk, TransportError};
use bytes::Bytes;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Default number of bytes handed out per read
pub const DEFAULT_REPLAY_CHUNK: usize = 512;

/// Replays a byte stream in fixed-size chunks. End of input is end-of-stream.
pub struct ReplaySource<R: Read> {
    inner: Option<R>,
    chunk: usize,
    name: String,
}

impl ReplaySource<BufReader<File>> {
    /// Replay a capture file
    pub fn open(path: impl AsRef<Path>, chunk: usize) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransportError::PortNotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => {
                TransportError::PermissionDenied(path.display().to_string())
            }
            _ => TransportError::IoError(e),
        })?;
        Ok(Self::with_name(BufReader::new(file), chunk, path.display().to_string()))
    }
}

impl<R: Read> ReplaySource<R> {
    /// Replay from any reader
    pub fn new(inner: R, chunk: usize) -> Self {
        Self::with_name(inner, chunk, "replay".to_string())
    }

    fn with_name(inner: R, chunk: usize, name: String) -> Self {
        Self {
            inner: Some(inner),
            chunk: chunk.max(1),
            name,
        }
    }
}

impl<R: Read> ByteSource for ReplaySource<R> {
    fn read(&mut self, _blocking: bool) -> Result<Chunk, TransportError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(Chunk::EndOfStream);
        };

        let mut buf = vec![0u8; self.chunk];
        loop {
            match inner.read(&mut buf) {
                Ok(0) => return Ok(Chunk::EndOfStream),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Chunk::Data(Bytes::from(buf)));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::IoError(e)),
            }
        }
    }

    fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::SendError(format!("{} is read-only", self.name)))
    }

    fn close(&mut self) {
        self.inner = None;
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
