//! # Propagation Queue Persistence
//!
//! Binary snapshot of a [`PropagationQueue`], written alongside the host's
//! world save so that running cascades survive a save/reload.
//!
//! ## Format
//!
//! ```text
//! ┌──────────┬───────────┬────────────┬───────────────────────────────┐
//! │ "CVQ1"   │ version   │ crc32      │ body (lz4, size prepended)    │
//! │ 4 bytes  │ u32 LE    │ u32 LE     │                               │
//! └──────────┴───────────┴────────────┴───────────────────────────────┘
//! ```
//!
//! The checksum covers the compressed body. Decompressed, the body is a
//! `u32` record count followed by the records:
//!
//! ```text
//! due_tick u64 │ epicenter 3×i32 │ radius_squared i64 │ count u32 │ count × 3×i32
//! ```
//!
//! Everything is little-endian. Positions are written as packed `BlockPos`
//! values through `bytemuck`, so a frontier is one contiguous copy. Any
//! mismatch rejects the whole snapshot; there is no partial recovery.

use std::path::Path;

use cavein_shared::BlockPos;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{CollapseError, CollapseResult};
use crate::queue::{PendingPropagation, PropagationQueue, ScheduledPropagation};

/// Snapshot magic bytes.
pub const QUEUE_MAGIC: &[u8; 4] = b"CVQ1";

/// Snapshot format version.
pub const QUEUE_VERSION: u32 = 1;

/// Header size: magic + version + checksum.
const HEADER_SIZE: usize = 12;

/// Encoded size of one position.
const POS_SIZE: usize = std::mem::size_of::<BlockPos>();

/// Smallest encoded record (empty frontier).
const MIN_RECORD_SIZE: usize = 8 + POS_SIZE + 8 + 4;

/// Serializes `queue` into a snapshot.
#[must_use]
pub fn encode(queue: &PropagationQueue) -> Vec<u8> {
    let mut raw = Vec::with_capacity(4 + queue.len() * MIN_RECORD_SIZE);
    raw.extend_from_slice(&(queue.len() as u32).to_le_bytes());
    for entry in queue.iter() {
        raw.extend_from_slice(&entry.due_tick.to_le_bytes());
        raw.extend_from_slice(bytemuck::bytes_of(&to_le(entry.record.epicenter)));
        raw.extend_from_slice(&entry.record.radius_squared.to_le_bytes());
        raw.extend_from_slice(&(entry.record.frontier.len() as u32).to_le_bytes());
        if cfg!(target_endian = "little") {
            raw.extend_from_slice(bytemuck::cast_slice(entry.record.frontier.as_slice()));
        } else {
            let packed: Vec<BlockPos> = entry.record.frontier.iter().copied().map(to_le).collect();
            raw.extend_from_slice(bytemuck::cast_slice(packed.as_slice()));
        }
    }

    let body = compress_prepend_size(&raw);
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(QUEUE_MAGIC);
    out.extend_from_slice(&QUEUE_VERSION.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// Restores a queue from a snapshot.
///
/// # Errors
///
/// Returns [`CollapseError::CorruptSave`] on a bad magic, unknown version,
/// checksum mismatch, or malformed body.
pub fn decode(data: &[u8]) -> CollapseResult<PropagationQueue> {
    if data.len() < HEADER_SIZE {
        return Err(corrupt(format!("snapshot is {} bytes, header needs {HEADER_SIZE}", data.len())));
    }
    let (header, body) = data.split_at(HEADER_SIZE);
    let mut header = ByteReader::new(header);

    if header.take(4)? != QUEUE_MAGIC {
        return Err(corrupt("bad magic".to_string()));
    }
    let version = header.u32()?;
    if version != QUEUE_VERSION {
        return Err(corrupt(format!("unsupported version {version}")));
    }
    let expected_crc = header.u32()?;
    let computed_crc = crc32fast::hash(body);
    if expected_crc != computed_crc {
        return Err(corrupt(format!(
            "checksum mismatch: expected {expected_crc:08x}, got {computed_crc:08x}"
        )));
    }

    let raw = decompress_size_prepended(body).map_err(|e| corrupt(format!("decompression failed: {e}")))?;
    let mut reader = ByteReader::new(&raw);

    let count = reader.u32()? as usize;
    if count > reader.remaining() / MIN_RECORD_SIZE {
        return Err(corrupt(format!("record count {count} exceeds body size")));
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let due_tick = reader.u64()?;
        let epicenter = reader.pos()?;
        let radius_squared = reader.i64()?;
        let frontier_len = reader.u32()? as usize;
        if frontier_len > reader.remaining() / POS_SIZE {
            return Err(corrupt(format!("frontier length {frontier_len} exceeds body size")));
        }
        let frontier = reader
            .take(frontier_len * POS_SIZE)?
            .chunks_exact(POS_SIZE)
            .map(|bytes| to_le(bytemuck::pod_read_unaligned(bytes)))
            .collect();

        entries.push(ScheduledPropagation {
            due_tick,
            record: PendingPropagation::new(epicenter, frontier, radius_squared),
        });
    }

    if reader.remaining() != 0 {
        return Err(corrupt(format!("{} trailing bytes", reader.remaining())));
    }
    Ok(entries.into_iter().collect())
}

/// Writes a snapshot of `queue` to `path`.
///
/// # Errors
///
/// Returns [`CollapseError::Io`] if the file cannot be written.
pub fn save_to_file(queue: &PropagationQueue, path: impl AsRef<Path>) -> CollapseResult<()> {
    let path = path.as_ref();
    std::fs::write(path, encode(queue))
        .map_err(|e| CollapseError::Io(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!("saved {} pending propagations to {}", queue.len(), path.display());
    Ok(())
}

/// Reads a snapshot from `path`.
///
/// # Errors
///
/// Returns [`CollapseError::Io`] if the file cannot be read and
/// [`CollapseError::CorruptSave`] if its content is rejected.
pub fn load_from_file(path: impl AsRef<Path>) -> CollapseResult<PropagationQueue> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|e| CollapseError::Io(format!("failed to read {}: {e}", path.display())))?;

    match decode(&data) {
        Ok(queue) => {
            tracing::info!("loaded {} pending propagations from {}", queue.len(), path.display());
            Ok(queue)
        }
        Err(e) => {
            tracing::warn!("rejected propagation snapshot {}: {}", path.display(), e);
            Err(e)
        }
    }
}

/// Swaps a position between native and little-endian byte order (a no-op on
/// little-endian targets; the swap is its own inverse).
const fn to_le(pos: BlockPos) -> BlockPos {
    BlockPos::new(pos.x.to_le(), pos.y.to_le(), pos.z.to_le())
}

fn corrupt(message: String) -> CollapseError {
    CollapseError::CorruptSave(message)
}

/// Bounds-checked little-endian cursor.
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize) -> CollapseResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(corrupt(format!(
                "truncated at byte {}: wanted {len}, have {}",
                self.offset,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> CollapseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> CollapseResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> CollapseResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> CollapseResult<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn pos(&mut self) -> CollapseResult<BlockPos> {
        Ok(to_le(bytemuck::pod_read_unaligned(self.take(POS_SIZE)?)))
    }
}
