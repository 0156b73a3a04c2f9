//! Stream byte reconstruction.
//!
//! Grounded on the teacher's `OleFile::open_stream`: routing on
//! `stream_size < mini_stream_cutoff` to decide FAT vs. mini-FAT, and
//! truncating the final chunk to the remaining byte count. Restructured to
//! operate on a directory index (not a path) and to yield chunks lazily
//! instead of building one `Vec<u8>` up front.

use crate::{constants, error::Error, Result};

/// One FAT-or-mini-FAT-backed stream, materialized as an ordered run of
/// sector-sized byte chunks (the mini-stream's sectors are 64 bytes; a
/// regular FAT sector is `header.sector_size` bytes). The last chunk is
/// truncated to the stream's declared byte length.
pub struct StreamChunks {
    chunks: Vec<Vec<u8>>,
    position: usize,
}

impl StreamChunks {
    pub fn into_vec(self) -> Vec<u8> {
        self.chunks.into_iter().flatten().collect()
    }
}

impl Iterator for StreamChunks {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.chunks.len() {
            return None;
        }
        let chunk = std::mem::take(&mut self.chunks[self.position]);
        self.position += 1;
        Some(chunk)
    }
}

/// Reads a stream of `stream_size` bytes starting at `first_sector`,
/// chasing either the regular FAT over `sectors` or the mini-FAT over the
/// root's mini-stream, matching the routing rule in MS-CFB §2.4: a stream
/// shorter than `mini_stream_cutoff` lives in the mini-stream.
pub fn read_stream(
    sectors: &[Vec<u8>],
    fat: &[u32],
    minifat: &[u32],
    mini_stream: &[u8],
    first_sector: u32,
    stream_size: u64,
    mini_stream_cutoff: u32,
) -> Result<StreamChunks> {
    if stream_size == 0 {
        return Ok(StreamChunks {
            chunks: Vec::new(),
            position: 0,
        });
    }

    let raw = if stream_size < mini_stream_cutoff as u64 {
        read_chain_generic(mini_stream, minifat, first_sector, 64)?
    } else {
        read_chain_from_sectors(sectors, fat, first_sector)?
    };

    if (raw.len() as u64) < stream_size {
        return Err(Error::Truncated("stream chain shorter than its declared size"));
    }

    let mut remaining = stream_size as usize;
    let sector_len = if stream_size < mini_stream_cutoff as u64 { 64 } else { sectors.first().map(|s| s.len()).unwrap_or(raw.len()) };
    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    while remaining > 0 {
        let take = sector_len.min(remaining).min(raw.len() - cursor);
        if take == 0 {
            break;
        }
        chunks.push(raw[cursor..cursor + take].to_vec());
        cursor += take;
        remaining -= take;
    }

    Ok(StreamChunks { chunks, position: 0 })
}

fn read_chain_from_sectors(sectors: &[Vec<u8>], fat: &[u32], first_sector: u32) -> Result<Vec<u8>> {
    crate::fat::read_chain(sectors, fat, first_sector)
}

/// Follows a chain through a flat byte buffer divided into `unit_len`-sized
/// units (used for the mini-stream, whose "sectors" are 64-byte slices of
/// the root entry's stream rather than whole file sectors).
fn read_chain_generic(buffer: &[u8], chain: &[u32], first: u32, unit_len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut next = first;
    let mut visited = 0usize;
    let unit_count = buffer.len() / unit_len;
    while next != constants::ENDOFCHAIN {
        if next as usize >= unit_count {
            return Err(Error::Truncated("mini-FAT chain references an out-of-range mini-sector"));
        }
        if visited > unit_count {
            return Err(Error::Truncated("mini-FAT chain longer than the mini-stream's unit count"));
        }
        let start = next as usize * unit_len;
        data.extend_from_slice(&buffer[start..start + unit_len]);
        next = *chain
            .get(next as usize)
            .ok_or(Error::Truncated("mini-FAT has no entry for a chained mini-sector"))?;
        visited += 1;
    }
    Ok(data)
}
