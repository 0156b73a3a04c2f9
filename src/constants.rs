use std::marker::Unpin;
use tokio::io::AsyncRead;

/// Anything the parser can read sequentially from. `tokio::fs::File` is the
/// real-world instance; an in-memory `Cursor` lets tests synthesize CFB
/// byte buffers without touching disk.
pub trait Readable: Unpin + AsyncRead {}
impl Readable for tokio::fs::File {}
impl<T: AsRef<[u8]> + Unpin> Readable for std::io::Cursor<T> {}

pub const HEADER_LENGTH: usize = 512;
pub const MAGIC_BYTES: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const CORRECT_MINOR_VERSION: [u8; 2] = [0x3E, 0x00];

pub const MAJOR_VERSION_3_VALUE: u16 = 3;
pub const MAJOR_VERSION_4_VALUE: u16 = 4;
pub const MAJOR_VERSION_3: [u8; 2] = [0x03, 0x00];
pub const MAJOR_VERSION_4: [u8; 2] = [0x04, 0x00];
pub const SECTOR_SIZE_VERSION_3: [u8; 2] = [0x09, 0x00];
pub const SECTOR_SIZE_VERSION_4: [u8; 2] = [0x0C, 0x00];
pub const CORRECT_MINI_SECTOR_SIZE: [u8; 2] = [0x06, 0x00];
pub const CORRECT_STANDARD_STREAM_MIN_SIZE: [u8; 4] = [0x00, 0x10, 0x00, 0x00];

/// SECT sentinels (MS-CFB 2.1).
pub const FREESECT: u32 = 0xFFFFFFFF;
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
pub const FATSECT: u32 = 0xFFFFFFFD;
pub const DIFSECT: u32 = 0xFFFFFFFC;

pub const SIZE_OF_DIRECTORY_ENTRY: usize = 128;

pub const NODE_COLOR_RED: u8 = 0x00;
pub const NODE_COLOR_BLACK: u8 = 0x01;

pub const OBJECT_TYPE_UNKNOWN_OR_UNALLOCATED: u8 = 0x00;
pub const OBJECT_TYPE_STORAGE: u8 = 0x01;
pub const OBJECT_TYPE_STREAM: u8 = 0x02;
pub const OBJECT_TYPE_ROOT_STORAGE: u8 = 0x05;

/// Terminator for Child/LeftSibling/RightSibling ids. Shares a bit pattern
/// with `FREESECT` but is a distinct namespace (stream ids, not sectors).
pub const NOSTREAM: u32 = 0xFFFFFFFF;
pub const MAXREGSID: u32 = 0xFFFFFFFA;

pub const PROPERTY_SET_BYTE_ORDER_MARK: u16 = 0xFFFE;
