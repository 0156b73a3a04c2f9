//! Directory entry parsing and red-black-tree-to-children lift.
//!
//! Each storage's children are stored on disk as a red-black tree (root at
//! `child_id`, siblings linked via `left_sibling_id`/`right_sibling_id`) per
//! MS-CFB §2.6. The teacher never flattens this: `find_stream` walks
//! left/right/child on every single lookup. Here the tree is lifted once,
//! into a plain `children: Vec<usize>`, so lookups afterwards are a flat
//! scan (see `CompoundFile::find_stream`).

use crate::{constants, error::Error, guid::Guid, header::Header, Result};
use chrono::NaiveDateTime;
use derivative::Derivative;
use std::array::TryFromSliceError;

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum EntryKind {
    Storage {
        class_id: Option<Guid>,
        children: Vec<usize>,
    },
    Stream {
        starting_sector: u32,
        stream_size: u64,
    },
    Root {
        class_id: Option<Guid>,
        /// First sector of the mini-stream, if any entries use it.
        ministream_sector: Option<u32>,
        ministream_size: u64,
        children: Vec<usize>,
    },
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DirectoryEntry {
    pub index: usize,
    pub name: String,
    pub kind: EntryKind,
    pub creation_time: Option<NaiveDateTime>,
    pub modification_time: Option<NaiveDateTime>,
    /// First byte of the on-disk record equals `0x05` (the low byte of the
    /// leading `\u{0005}` code unit real-world writers use to flag a
    /// property-set stream). Computed from the raw name bytes, since the
    /// lifted `name` has control characters stripped and would lose it.
    pub(crate) has_property_set_marker: bool,
    pub(crate) left_sibling_id: Option<u32>,
    pub(crate) right_sibling_id: Option<u32>,
    pub(crate) child_id: Option<u32>,
}

impl DirectoryEntry {
    pub fn is_stream(&self) -> bool {
        matches!(self.kind, EntryKind::Stream { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.kind, EntryKind::Storage { .. } | EntryKind::Root { .. })
    }

    pub fn children(&self) -> &[usize] {
        match &self.kind {
            EntryKind::Storage { children, .. } | EntryKind::Root { children, .. } => children,
            EntryKind::Stream { .. } => &[],
        }
    }

    /// True for STREAM/ROOT entries whose on-disk marker byte flags them as
    /// a serialized property set (§4.4/§4.8).
    pub fn looks_like_property_set(&self) -> bool {
        !matches!(self.kind, EntryKind::Storage { .. }) && self.has_property_set_marker
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct RawDirectoryEntry {
    name: [u8; 64],
    name_len: [u8; 2],
    object_type: [u8; 1],
    color_flag: [u8; 1],
    left_sibling_id: [u8; 4],
    right_sibling_id: [u8; 4],
    child_id: [u8; 4],
    class_id: [u8; 16],
    state_bits: [u8; 4],
    creation_time: [u8; 8],
    modification_time: [u8; 8],
    starting_sector_location: [u8; 4],
    stream_size: [u8; 8],
}

fn field<const N: usize>(entry: &[u8], start: usize, name: &'static str) -> Result<[u8; N]> {
    entry[start..start + N]
        .try_into()
        .map_err(|err: TryFromSliceError| Error::InvalidDirectoryEntry(name, err.to_string()))
}

impl RawDirectoryEntry {
    pub fn parse(entry: &[u8]) -> Result<Self> {
        Ok(RawDirectoryEntry {
            name: field(entry, 0, "name")?,
            name_len: field(entry, 64, "name_len")?,
            object_type: field(entry, 66, "object_type")?,
            color_flag: field(entry, 67, "color_flag")?,
            left_sibling_id: field(entry, 68, "left_sibling_id")?,
            right_sibling_id: field(entry, 72, "right_sibling_id")?,
            child_id: field(entry, 76, "child_id")?,
            class_id: field(entry, 80, "class_id")?,
            state_bits: field(entry, 96, "state_bits")?,
            creation_time: field(entry, 100, "creation_time")?,
            modification_time: field(entry, 108, "modification_time")?,
            starting_sector_location: field(entry, 116, "starting_sector_location")?,
            stream_size: field(entry, 120, "stream_size")?,
        })
    }
}

fn stream_id(raw: [u8; 4], field_name: &'static str) -> Result<Option<u32>> {
    let value = u32::from_le_bytes(raw);
    if value == constants::NOSTREAM {
        Ok(None)
    } else if value > constants::MAXREGSID {
        Err(Error::InvalidDirectoryEntry(
            field_name,
            format!("invalid stream id: {value:#x}"),
        ))
    } else {
        Ok(Some(value))
    }
}

/// `name_len` on disk includes the 2-byte null terminator; the meaningful
/// text is `name_len - 2` bytes, with any remaining control characters
/// (0x00-0x1F) stripped rather than assumed to be a single trailing NUL.
fn parse_name(raw: &RawDirectoryEntry) -> Result<String> {
    let name_len = u16::from_le_bytes(raw.name_len) as usize;
    if name_len > 64 || name_len % 2 != 0 {
        return Err(Error::InvalidDirectoryEntry(
            "name_len",
            format!("invalid directory entry name length: {name_len}"),
        ));
    }
    let text_len = name_len.saturating_sub(2);
    let units: Vec<u16> = raw.name[0..text_len]
        .chunks(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let name: String = String::from_utf16(&units)?
        .chars()
        .filter(|c| (*c as u32) > 0x1F)
        .collect();
    Ok(name)
}

fn parse_class_id(bytes: [u8; 16]) -> Option<Guid> {
    if bytes == [0u8; 16] {
        None
    } else {
        Some(Guid::from_bytes(bytes))
    }
}

/// Parses one 128-byte record. Returns `Ok(None)` for unallocated slots,
/// which `build_entries` skips.
pub fn parse_entry(raw: &[u8], header: &Header, index: usize) -> Result<Option<DirectoryEntry>> {
    let raw = RawDirectoryEntry::parse(raw)?;

    if raw.object_type[0] == constants::OBJECT_TYPE_UNKNOWN_OR_UNALLOCATED {
        return Ok(None);
    }

    match raw.color_flag[0] {
        constants::NODE_COLOR_RED | constants::NODE_COLOR_BLACK => {}
        other => {
            return Err(Error::InvalidDirectoryEntry(
                "color_flag",
                format!("invalid value: {other:#x}"),
            ))
        }
    }

    let has_property_set_marker = raw.name[0] == 0x05;
    let name = parse_name(&raw)?;
    let left_sibling_id = stream_id(raw.left_sibling_id, "left_sibling_id")?;
    let right_sibling_id = stream_id(raw.right_sibling_id, "right_sibling_id")?;
    let child_id = stream_id(raw.child_id, "child_id")?;

    let creation_time = match i64::from_le_bytes(raw.creation_time) {
        0 => None,
        ticks => epochs::windows_file(ticks),
    };
    let modification_time = match i64::from_le_bytes(raw.modification_time) {
        0 => None,
        ticks => epochs::windows_file(ticks),
    };

    let stream_size = {
        let mut bytes = raw.stream_size;
        if header.major_version == constants::MAJOR_VERSION_3_VALUE {
            // v3 streams are capped at 2GB; the top 32 bits are sometimes
            // left uninitialized by older writers.
            bytes[4..8].copy_from_slice(&[0, 0, 0, 0]);
        }
        u64::from_le_bytes(bytes)
    };

    let starting_sector_location = u32::from_le_bytes(raw.starting_sector_location);
    let class_id = parse_class_id(raw.class_id);
    let _state_bits = raw.state_bits;

    let kind = match raw.object_type[0] {
        constants::OBJECT_TYPE_STORAGE => {
            if stream_size != 0 {
                return Err(Error::InvalidDirectoryEntry(
                    "stream_size",
                    "storage entries must have a zero stream size".to_string(),
                ));
            }
            EntryKind::Storage {
                class_id,
                children: Vec::new(),
            }
        }
        constants::OBJECT_TYPE_STREAM => EntryKind::Stream {
            starting_sector: starting_sector_location,
            stream_size,
        },
        constants::OBJECT_TYPE_ROOT_STORAGE => {
            if stream_size % 64 != 0 {
                return Err(Error::InvalidDirectoryEntry(
                    "stream_size",
                    "root storage stream size must be a multiple of 64".to_string(),
                ));
            }
            EntryKind::Root {
                class_id,
                ministream_sector: if stream_size == 0 {
                    None
                } else {
                    Some(starting_sector_location)
                },
                ministream_size: stream_size,
                children: Vec::new(),
            }
        }
        other => {
            return Err(Error::InvalidDirectoryEntry(
                "object_type",
                format!("invalid value: {other:#x}"),
            ))
        }
    };

    Ok(Some(DirectoryEntry {
        index,
        name,
        kind,
        creation_time,
        modification_time,
        has_property_set_marker,
        left_sibling_id,
        right_sibling_id,
        child_id,
    }))
}

/// Parses every 128-byte record in the directory stream, skipping
/// unallocated slots, then lifts each storage's red-black sibling tree into
/// a flat `children` list.
pub fn build_entries(directory_stream: &[u8], header: &Header) -> Result<Vec<DirectoryEntry>> {
    if directory_stream.len() % constants::SIZE_OF_DIRECTORY_ENTRY != 0 {
        return Err(Error::InvalidDirectoryEntry(
            "directory_stream",
            format!(
                "directory stream size {} is not a multiple of {}",
                directory_stream.len(),
                constants::SIZE_OF_DIRECTORY_ENTRY
            ),
        ));
    }

    // Stop at the first globally-invalid entry rather than skipping
    // individual unallocated slots: `left`/`right`/`child` ids elsewhere in
    // the stream are raw positions into this array, so a filtered gap in
    // the middle would silently misalign every cross-reference after it.
    // Well-formed files only pad with INVALID entries at the tail, so this
    // is equivalent to "skip unallocated slots" in practice while staying
    // safe against malformed files that don't.
    let mut entries = Vec::new();
    for (index, raw) in directory_stream
        .chunks_exact(constants::SIZE_OF_DIRECTORY_ENTRY)
        .enumerate()
    {
        match parse_entry(raw, header, index)? {
            Some(entry) => entries.push(entry),
            None => break,
        }
    }

    if entries.is_empty() {
        return Err(Error::DirectoryEntryNotFound);
    }

    let budget = entries.len();
    let root_child = entries[0].child_id;
    let children = collect_subtree(&entries, root_child, budget)?;
    set_children(&mut entries, 0, children);

    for i in 0..entries.len() {
        if let EntryKind::Storage { .. } = entries[i].kind {
            let child_id = entries[i].child_id;
            let children = collect_subtree(&entries, child_id, budget)?;
            set_children(&mut entries, i, children);
        }
    }

    Ok(entries)
}

fn set_children(entries: &mut [DirectoryEntry], index: usize, new_children: Vec<usize>) {
    match &mut entries[index].kind {
        EntryKind::Storage { children, .. } | EntryKind::Root { children, .. } => {
            *children = new_children;
        }
        EntryKind::Stream { .. } => {}
    }
}

/// In-order walk of the sibling tree rooted at `root`, bounded by `budget`
/// total visits so a cyclic `left`/`right` reference cannot loop forever.
fn collect_subtree(
    entries: &[DirectoryEntry],
    root: Option<u32>,
    budget: usize,
) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    if let Some(root) = root {
        stack.push(root as usize);
    }
    let mut visited = 0usize;

    while let Some(id) = stack.pop() {
        visited += 1;
        if visited > budget {
            return Err(Error::Truncated("directory tree traversal exceeded entry count"));
        }
        let entry = entries
            .get(id)
            .ok_or(Error::DirectoryEntryNotFound)?;
        out.push(id);
        if let Some(left) = entry.left_sibling_id {
            stack.push(left as usize);
        }
        if let Some(right) = entry.right_sibling_id {
            stack.push(right as usize);
        }
    }

    out.sort_unstable();
    Ok(out)
}
