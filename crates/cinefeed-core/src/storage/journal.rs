//! Append-only journal backing a durable [`MemoryStore`](super::MemoryStore).
//!
//! Frame layout: `[u32 LE payload length][u64 LE xxh64 of payload][JSON payload]`.
//! A truncated final frame is a torn write from a crash and ends replay; a
//! checksum mismatch anywhere is corruption.
//!
//! The file never keeps a frame whose append failed: the journal truncates
//! itself back to the end of the last committed frame, and refuses further
//! appends if even that fails.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use xxhash_rust::xxh64::xxh64;

use crate::error::StorageError;
use crate::types::Record;

const FRAME_HEADER_SIZE: usize = 12;

/// One journaled mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalOp {
    Put { record: Record },
    Delete { partition: String, sort_key: String },
}

/// The file a journal appends to.
pub trait JournalSink: Write {
    /// Make everything written so far durable.
    fn sync(&mut self) -> io::Result<()>;

    /// Cut the sink back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl JournalSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writer half of the journal.
pub struct Journal<F = File> {
    sink: F,
    path: PathBuf,
    /// End offset of the last frame known to be durable.
    committed: u64,
    poisoned: bool,
}

impl Journal<File> {
    /// Open the journal at `path` for appending, creating it if needed, and
    /// return the ops it already holds.
    ///
    /// A torn tail left by a crash is cut off so that new frames follow the
    /// last readable one.
    pub fn open(path: &Path) -> Result<(Self, Vec<JournalOp>), StorageError> {
        let bytes = read_all(path)?;
        let (ops, valid_len) = decode_frames(path, &bytes)?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed = valid_len as u64;
        if (bytes.len() as u64) > committed {
            warn!(path = %path.display(), committed, "truncating torn journal tail");
            file.set_len(committed)?;
        }
        info!(path = %path.display(), ops = ops.len(), "journal replayed");

        let journal = Self {
            sink: file,
            path: path.to_path_buf(),
            committed,
            poisoned: false,
        };
        Ok((journal, ops))
    }

    /// Atomically replace the journal at `path` with one put per record.
    ///
    /// The returned journal is positioned at the end of the new file.
    pub fn rewrite<'a>(
        path: &Path,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<Self, StorageError> {
        let tmp_path = sibling(path, ".tmp");
        let committed = {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            let mut written = 0u64;
            for record in records {
                let frame = encode_frame(&JournalOp::Put {
                    record: record.clone(),
                })?;
                writer.write_all(&frame)?;
                written += frame.len() as u64;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
            written
        };
        fs::rename(&tmp_path, path)?;

        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            sink: file,
            path: path.to_path_buf(),
            committed,
            poisoned: false,
        })
    }

    /// Read every op in the journal at `path` without opening it for writes.
    /// A missing file is empty.
    pub fn replay(path: &Path) -> Result<Vec<JournalOp>, StorageError> {
        let bytes = read_all(path)?;
        let (ops, _) = decode_frames(path, &bytes)?;
        Ok(ops)
    }
}

impl<F: JournalSink> Journal<F> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one op and sync it to disk before returning.
    ///
    /// On failure nothing of the frame remains in the file.
    pub fn append(&mut self, op: &JournalOp) -> Result<(), StorageError> {
        if self.poisoned {
            return Err(StorageError::JournalPoisoned);
        }
        let frame = encode_frame(op)?;

        let written = self
            .sink
            .write_all(&frame)
            .and_then(|()| self.sink.flush())
            .and_then(|()| self.sink.sync());

        match written {
            Ok(()) => {
                self.committed += frame.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(undo) = self.sink.truncate(self.committed) {
                    error!(
                        path = %self.path.display(),
                        error = %undo,
                        "could not roll back failed journal append; refusing further writes"
                    );
                    self.poisoned = true;
                }
                Err(e.into())
            }
        }
    }
}

/// `path` with `suffix` appended to its full file name.
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn read_all(path: &Path) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    match File::open(path) {
        Ok(mut file) => {
            file.read_to_end(&mut bytes)?;
            Ok(bytes)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(bytes),
        Err(e) => Err(e.into()),
    }
}

/// Decode frames from `bytes`, returning the ops and the length of the
/// readable prefix.
fn decode_frames(path: &Path, bytes: &[u8]) -> Result<(Vec<JournalOp>, usize), StorageError> {
    let mut ops = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let rest = &bytes[offset..];
        if rest.len() < FRAME_HEADER_SIZE {
            warn!(path = %path.display(), offset, "torn frame header at journal tail; ignoring");
            break;
        }
        let len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let mut sum = [0u8; 8];
        sum.copy_from_slice(&rest[4..FRAME_HEADER_SIZE]);
        let checksum = u64::from_le_bytes(sum);

        let Some(payload) = rest.get(FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + len) else {
            warn!(path = %path.display(), offset, "torn frame payload at journal tail; ignoring");
            break;
        };
        if xxh64(payload, 0) != checksum {
            return Err(StorageError::Corrupted(format!(
                "checksum mismatch in frame at offset {offset}"
            )));
        }
        let op: JournalOp = serde_json::from_slice(payload).map_err(|e| {
            StorageError::Corrupted(format!("undecodable frame at offset {offset}: {e}"))
        })?;
        ops.push(op);
        offset += FRAME_HEADER_SIZE + len;
    }
    Ok((ops, offset))
}

fn encode_frame(op: &JournalOp) -> Result<Vec<u8>, StorageError> {
    let payload = serde_json::to_vec(op)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| StorageError::Corrupted("journal frame exceeds 4 GiB".to_string()))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&xxh64(&payload, 0).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
