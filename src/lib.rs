mod constants;
mod directory;
pub mod error;
mod fat;
mod guid;
mod header;
pub mod properties;
mod stream;

pub use directory::{DirectoryEntry, EntryKind};
pub use guid::Guid;
pub use properties::{PropertyDecodeOptions, PropertySet, PropertyValue};
pub use stream::StreamChunks;

pub type Result<T> = std::result::Result<T, Error>;

use crate::{
    constants::Readable,
    error::{Error, HeaderErrorType},
    header::Header,
};
use derivative::Derivative;
use std::collections::HashMap;
use tokio::io::AsyncReadExt;

/// A parsed Compound File Binary container.
///
/// Mirrors the teacher's `OleFile`, reshaped around the five-phase pipeline
/// (header, FAT/DIFAT, directory, mini-FAT, property-set decode) and a
/// flat case-insensitive `find_stream` rather than a path-segment recursive
/// lookup.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct CompoundFile {
    header: Header,
    #[derivative(Debug = "ignore")]
    sectors: Vec<Vec<u8>>,
    #[derivative(Debug = "ignore")]
    fat: Vec<u32>,
    #[derivative(Debug = "ignore")]
    minifat: Vec<u32>,
    #[derivative(Debug = "ignore")]
    mini_stream: Vec<u8>,
    entries: Vec<DirectoryEntry>,
    property_sets: HashMap<usize, PropertySet>,
    closed: bool,
}

impl CompoundFile {
    /// Opens and fully parses a CFB file: header, FAT/DIFAT, directory tree,
    /// mini-FAT, and any property sets attached to directory entries.
    ///
    /// ## Example usage
    /// ```rust,no_run
    /// use cfb::CompoundFile;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let file = "data/oledoc1.doc_";
    ///
    ///     let res = CompoundFile::open(file).await;
    ///     assert!(res.is_ok());
    /// }
    /// ```
    #[cfg(feature = "async")]
    pub async fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Self::open_with_options(file, PropertyDecodeOptions::default()).await
    }

    /// Synchronous equivalent of [`CompoundFile::open`], for callers outside
    /// a `tokio` runtime. Spins up a throwaway runtime and blocks on it.
    ///
    /// ## Example usage
    /// ```rust,no_run
    /// use cfb::CompoundFile;
    /// let file = "data/oledoc1.doc_";
    ///
    /// let res = CompoundFile::open_blocking(file);
    /// assert!(res.is_ok());
    /// ```
    #[cfg(feature = "blocking")]
    pub fn open_blocking<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let rt = tokio::runtime::Runtime::new()?;
        let file = rt.block_on(tokio::fs::File::open(path))?;
        rt.block_on(Self::open_with_options(file, PropertyDecodeOptions::default()))
    }

    /// Runs the full open pipeline over any [`Readable`] source rather than
    /// a file path. `open`/`open_blocking` delegate here; callers with a
    /// non-file byte source (e.g. an in-memory `Cursor`, as the tests use)
    /// call it directly.
    pub async fn open_with_options<R>(mut read: R, options: PropertyDecodeOptions) -> Result<Self>
    where
        R: Readable,
    {
        let header = header::parse_header(&mut read).await?;
        let sector_size = header.sector_size as usize;

        // The header is always padded out to a full sector for larger
        // sector sizes; the remainder is reserved and must be zero.
        if sector_size > constants::HEADER_LENGTH {
            let pad_len = sector_size - constants::HEADER_LENGTH;
            let mut pad = vec![0u8; pad_len];
            let read_len = read.read(&mut pad).await?;
            if read_len != pad_len {
                return Err(Error::InvalidFormat(HeaderErrorType::NotEnoughBytes(pad_len, read_len)));
            }
            if pad != vec![0u8; pad_len] {
                return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
                    "header_padding",
                    "non-zero padding after a larger header".to_string(),
                )));
            }
        }

        let mut sectors = Vec::new();
        loop {
            let mut buf = vec![0u8; sector_size];
            let read_len = read.read(&mut buf).await?;
            if read_len == 0 {
                break;
            }
            if read_len != sector_size {
                return Err(Error::Truncated("final sector is shorter than the declared sector size"));
            }
            sectors.push(buf);
        }

        let fat = fat::assemble_fat(&sectors, &header)?;
        let directory_stream = fat::read_chain(&sectors, &fat, header.first_directory_sector)?;
        let entries = directory::build_entries(&directory_stream, &header)?;
        let minifat = fat::assemble_minifat(&sectors, &fat, &header)?;

        let mini_stream = match &entries[0].kind {
            EntryKind::Root {
                ministream_sector: Some(first),
                ..
            } => fat::read_chain(&sectors, &fat, *first)?,
            _ => Vec::new(),
        };

        let mut property_sets = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if !entry.looks_like_property_set() {
                continue;
            }
            let (starting_sector, stream_size) = match &entry.kind {
                EntryKind::Stream {
                    starting_sector,
                    stream_size,
                } => (*starting_sector, *stream_size),
                EntryKind::Root {
                    ministream_sector: Some(sector),
                    ministream_size,
                    ..
                } => (*sector, *ministream_size),
                _ => continue,
            };
            // A malformed property set degrades to "no properties for that
            // entry" rather than failing the whole open (spec §7).
            if let Ok(chunks) = stream::read_stream(
                &sectors,
                &fat,
                &minifat,
                &mini_stream,
                starting_sector,
                stream_size,
                header.mini_stream_cutoff,
            ) {
                let data = chunks.into_vec();
                if let Ok(set) = properties::parse_property_set(&data, options) {
                    property_sets.insert(index, set);
                }
            }
        }

        Ok(CompoundFile {
            header,
            sectors,
            fat,
            minifat,
            mini_stream,
            entries,
            property_sets,
            closed: false,
        })
    }

    /// The root storage entry (always directory index 0), whose `children`
    /// form the top of the storage/stream tree.
    pub fn root(&self) -> &DirectoryEntry {
        &self.entries[0]
    }

    /// The flat, lifted directory array in on-disk order. `entries()[0]` is
    /// always [`CompoundFile::root`].
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// The decoded property set for a directory entry, if its on-disk
    /// marker byte flagged it as one and decoding succeeded (spec §4.8).
    pub fn properties(&self, index: usize) -> Option<&PropertySet> {
        self.property_sets.get(&index)
    }

    /// Case-insensitive exact match over the flat directory list (spec §6),
    /// replacing the teacher's recursive path-segment `find_stream`.
    pub fn find_stream(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.is_stream() && entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.index)
    }

    /// Reads a stream's full contents into one buffer, routing through the
    /// regular FAT or the mini-FAT per spec §4.5. Fails with
    /// [`Error::NoSuchStream`] if `index` doesn't name a STREAM entry.
    pub fn get_stream(&self, index: usize) -> Result<Vec<u8>> {
        Ok(self.get_stream_chunks(index)?.into_vec())
    }

    /// Same as [`CompoundFile::get_stream`], but returns the chunked,
    /// chain-ordered iterator directly rather than flattening it.
    pub fn get_stream_chunks(&self, index: usize) -> Result<StreamChunks> {
        if self.closed {
            return Err(Error::Closed);
        }
        let entry = self.entries.get(index).ok_or(Error::NoSuchStream(index))?;
        let EntryKind::Stream {
            starting_sector,
            stream_size,
        } = entry.kind
        else {
            return Err(Error::NoSuchStream(index));
        };

        stream::read_stream(
            &self.sectors,
            &self.fat,
            &self.minifat,
            &self.mini_stream,
            starting_sector,
            stream_size,
            self.header.mini_stream_cutoff,
        )
    }

    /// Releases the in-memory sector storage. Subsequent stream reads fail
    /// with `Error::Closed`.
    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.sectors.clear();
        self.sectors.shrink_to_fit();
        self.mini_stream.clear();
        self.mini_stream.shrink_to_fit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SECTOR_SIZE: usize = 512;

    fn le32(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    fn build_header(
        num_fat_sectors: u32,
        first_directory_sector: u32,
        first_minifat_sector: u32,
        num_minifat_sectors: u32,
        fat_sectors_head: &[u32],
    ) -> Vec<u8> {
        let mut header = vec![0u8; SECTOR_SIZE];
        header[0..8].copy_from_slice(&constants::MAGIC_BYTES);
        header[24..26].copy_from_slice(&constants::CORRECT_MINOR_VERSION);
        header[26..28].copy_from_slice(&constants::MAJOR_VERSION_3);
        header[28..30].copy_from_slice(&[0xFE, 0xFF]);
        header[30..32].copy_from_slice(&constants::SECTOR_SIZE_VERSION_3);
        header[32..34].copy_from_slice(&constants::CORRECT_MINI_SECTOR_SIZE);
        header[44..48].copy_from_slice(&le32(num_fat_sectors));
        header[48..52].copy_from_slice(&le32(first_directory_sector));
        header[56..60].copy_from_slice(&constants::CORRECT_STANDARD_STREAM_MIN_SIZE);
        header[60..64].copy_from_slice(&le32(first_minifat_sector));
        header[64..68].copy_from_slice(&le32(num_minifat_sectors));
        header[68..72].copy_from_slice(&le32(constants::ENDOFCHAIN));
        header[72..76].copy_from_slice(&le32(0));

        for (i, sect) in fat_sectors_head.iter().enumerate() {
            let start = 76 + i * 4;
            header[start..start + 4].copy_from_slice(&le32(*sect));
        }
        for i in fat_sectors_head.len()..109 {
            let start = 76 + i * 4;
            header[start..start + 4].copy_from_slice(&le32(constants::FREESECT));
        }
        header
    }

    fn root_entry_bytes(name: &str, ministream_sector: u32, ministream_size: u64) -> Vec<u8> {
        directory_entry_bytes(
            name,
            constants::OBJECT_TYPE_ROOT_STORAGE,
            None,
            None,
            None,
            ministream_sector,
            ministream_size,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn directory_entry_bytes(
        name: &str,
        object_type: u8,
        left: Option<u32>,
        right: Option<u32>,
        child: Option<u32>,
        sector: u32,
        size: u64,
    ) -> Vec<u8> {
        let mut entry = vec![0u8; 128];
        let mut units: Vec<u16> = name.encode_utf16().collect();
        units.push(0);
        for (i, unit) in units.iter().enumerate() {
            let bytes = unit.to_le_bytes();
            entry[i * 2..i * 2 + 2].copy_from_slice(&bytes);
        }
        entry[64..66].copy_from_slice(&((units.len() as u16) * 2).to_le_bytes());
        entry[66] = object_type;
        entry[67] = constants::NODE_COLOR_BLACK;
        entry[68..72].copy_from_slice(&le32(left.unwrap_or(constants::NOSTREAM)));
        entry[72..76].copy_from_slice(&le32(right.unwrap_or(constants::NOSTREAM)));
        entry[76..80].copy_from_slice(&le32(child.unwrap_or(constants::NOSTREAM)));
        entry[116..120].copy_from_slice(&le32(sector));
        entry[120..128].copy_from_slice(&size.to_le_bytes());
        entry
    }

    #[tokio::test]
    async fn minimal_root_only_file_opens() {
        let mut data = build_header(1, 1, 0, 0, &[0]);

        let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
        fat_sector[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(fat_sector);

        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", constants::ENDOFCHAIN, 0);
        dir_sector[0..128].copy_from_slice(&root);
        data.extend(dir_sector);

        let cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        assert!(cf.root().children().is_empty());
        assert_eq!(cf.find_stream("Anything"), None);
    }

    #[tokio::test]
    async fn small_stream_via_minifat() {
        // sector 0: FAT, sector 1: directory, sector 2: mini-FAT, sector 3: mini-stream.
        let mut data = build_header(1, 1, 2, 1, &[0]);

        let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
        fat_sector[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        fat_sector[8..12].copy_from_slice(&le32(constants::ENDOFCHAIN));
        fat_sector[12..16].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(fat_sector);

        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", 3, 64);
        let tiny = directory_entry_bytes(
            "Tiny",
            constants::OBJECT_TYPE_STREAM,
            None,
            None,
            None,
            0,
            60,
        );
        dir_sector[0..128].copy_from_slice(&root);
        dir_sector[128..256].copy_from_slice(&tiny);
        data.extend(dir_sector);

        let mut minifat_sector = vec![0xFFu8; SECTOR_SIZE];
        minifat_sector[0..4].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(minifat_sector);

        let mut mini_stream_sector = vec![0u8; SECTOR_SIZE];
        for (i, byte) in mini_stream_sector.iter_mut().take(60).enumerate() {
            *byte = i as u8;
        }
        data.extend(mini_stream_sector);

        let cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        let index = cf.find_stream("tiny").expect("stream found case-insensitively");
        let bytes = cf.get_stream(index).unwrap();
        assert_eq!(bytes.len(), 60);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[59], 59);
    }

    #[tokio::test]
    async fn bad_magic_is_rejected() {
        let mut data = vec![0u8; SECTOR_SIZE];
        data[0..8].copy_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let err = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn close_prevents_further_stream_reads() {
        let mut data = build_header(1, 1, 0, 0, &[0]);
        let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
        fat_sector[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(fat_sector);
        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", constants::ENDOFCHAIN, 0);
        dir_sector[0..128].copy_from_slice(&root);
        data.extend(dir_sector);

        let mut cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        cf.close().unwrap();
        assert!(matches!(cf.get_stream(0), Err(Error::Closed)));
    }

    #[tokio::test]
    async fn fragmented_stream_is_reassembled_in_chain_order_with_truncated_tail() {
        // A FAT-routed stream (size >= the 4096-byte mini-stream cutoff)
        // chained through non-contiguous sectors, with the final sector
        // truncated to the remaining byte count. Chain: 5 -> 7 -> 12 -> 13
        // -> 14 -> 15 -> 16 -> 17 -> 18 -> ENDOFCHAIN; the first 8 sectors
        // are full (4096 bytes), the 9th contributes only 4 more bytes.
        const CHAIN: [u32; 9] = [5, 7, 12, 13, 14, 15, 16, 17, 18];
        const STREAM_SIZE: u64 = 4100;

        let max_index = *CHAIN.iter().max().unwrap() as usize;
        let mut sectors = vec![vec![0u8; SECTOR_SIZE]; max_index + 1];

        let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
        fat_sector[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        for (i, &sect) in CHAIN.iter().enumerate() {
            let next = CHAIN.get(i + 1).copied().unwrap_or(constants::ENDOFCHAIN);
            let start = sect as usize * 4;
            fat_sector[start..start + 4].copy_from_slice(&le32(next));
        }
        sectors[0] = fat_sector;

        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", constants::ENDOFCHAIN, 0);
        let big = directory_entry_bytes(
            "Big",
            constants::OBJECT_TYPE_STREAM,
            None,
            None,
            None,
            CHAIN[0],
            STREAM_SIZE,
        );
        dir_sector[0..128].copy_from_slice(&root);
        dir_sector[128..256].copy_from_slice(&big);
        sectors[1] = dir_sector;

        // Each sector in the chain is filled with its position (0-8) as a
        // repeated byte, so reassembly order and the truncated tail are
        // both directly verifiable.
        for (i, &sect) in CHAIN.iter().enumerate() {
            sectors[sect as usize] = vec![i as u8; SECTOR_SIZE];
        }

        let mut data = build_header(1, 1, 0, 0, &[0]);
        for sector in sectors {
            data.extend(sector);
        }

        let cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        let index = cf.find_stream("Big").unwrap();
        let bytes = cf.get_stream(index).unwrap();

        assert_eq!(bytes.len(), STREAM_SIZE as usize);
        for i in 0u8..8 {
            let start = i as usize * SECTOR_SIZE;
            assert!(bytes[start..start + SECTOR_SIZE].iter().all(|&b| b == i));
        }
        assert!(bytes[4096..4100].iter().all(|&b| b == 8));
    }

    #[tokio::test]
    async fn difat_extension_reaches_fat_sectors_past_the_header_head() {
        // Sector 0: first FAT sector (covers sector indices 0-127).
        // Sector 1: directory.
        // Sector 2: DIFAT sector naming sector 3 as a second FAT sector.
        // Sector 3: second FAT sector (covers sector indices 128-255).
        // Sectors 128-135: the "Big" stream's 8 data sectors, only
        // addressable through the DIFAT-extended FAT.
        let mut data = build_header(2, 1, 0, 0, &[0]);
        data[68..72].copy_from_slice(&le32(2)); // first_difat_sector
        data[72..76].copy_from_slice(&le32(1)); // num_difat_sectors

        let mut fat_sector_1 = vec![0xFFu8; SECTOR_SIZE];
        fat_sector_1[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector_1[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        fat_sector_1[8..12].copy_from_slice(&le32(constants::DIFSECT));
        fat_sector_1[12..16].copy_from_slice(&le32(constants::FATSECT));
        data.extend(fat_sector_1);

        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", constants::ENDOFCHAIN, 0);
        let big = directory_entry_bytes(
            "Big",
            constants::OBJECT_TYPE_STREAM,
            None,
            None,
            None,
            128,
            4096,
        );
        dir_sector[0..128].copy_from_slice(&root);
        dir_sector[128..256].copy_from_slice(&big);
        data.extend(dir_sector);

        let mut difat_sector = vec![0xFFu8; SECTOR_SIZE];
        difat_sector[0..4].copy_from_slice(&le32(3)); // extra FAT sector: 3
        difat_sector[SECTOR_SIZE - 4..SECTOR_SIZE].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(difat_sector);

        let mut fat_sector_2 = vec![0xFFu8; SECTOR_SIZE];
        // Local entries 0-7 of this sector are global sector indices 128-135.
        for local in 0..7 {
            let next_global = 128 + local + 1;
            fat_sector_2[local * 4..local * 4 + 4].copy_from_slice(&le32(next_global as u32));
        }
        fat_sector_2[7 * 4..7 * 4 + 4].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(fat_sector_2);

        // Filler sectors 4-127 (unreferenced).
        for _ in 4..128 {
            data.extend(vec![0u8; SECTOR_SIZE]);
        }
        // The stream's 8 data sectors (128-135), each filled with its
        // position in the chain so reassembly order is verifiable.
        for k in 0u8..8 {
            data.extend(vec![k; SECTOR_SIZE]);
        }

        let cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        let index = cf.find_stream("Big").unwrap();
        let bytes = cf.get_stream(index).unwrap();

        assert_eq!(bytes.len(), 4096);
        for k in 0u8..8 {
            let start = k as usize * SECTOR_SIZE;
            assert!(bytes[start..start + SECTOR_SIZE].iter().all(|&b| b == k));
        }
    }

    #[tokio::test]
    async fn summary_information_property_set_is_decoded() {
        use crate::properties::{format_id, pid, vt};

        // sectors: 0 = FAT, 1 = directory, 2 = mini-FAT, 3 = mini-stream
        // (the property-set stream lives in the first two 64-byte
        // mini-sectors of the mini-stream).
        let mut data = build_header(1, 1, 2, 1, &[0]);

        let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
        fat_sector[0..4].copy_from_slice(&le32(constants::FATSECT));
        fat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        fat_sector[8..12].copy_from_slice(&le32(constants::ENDOFCHAIN));
        fat_sector[12..16].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(fat_sector);

        let mut dir_sector = vec![0u8; SECTOR_SIZE];
        let root = root_entry_bytes("Root Entry", 3, 128);
        let summary_info = directory_entry_bytes(
            "\u{0005}SummaryInformation",
            constants::OBJECT_TYPE_STREAM,
            None,
            None,
            None,
            0,
            100,
        );
        dir_sector[0..128].copy_from_slice(&root);
        dir_sector[128..256].copy_from_slice(&summary_info);
        data.extend(dir_sector);

        let mut minifat_sector = vec![0xFFu8; SECTOR_SIZE];
        minifat_sector[0..4].copy_from_slice(&le32(1)); // mini-sector 0 -> 1
        minifat_sector[4..8].copy_from_slice(&le32(constants::ENDOFCHAIN));
        data.extend(minifat_sector);

        // The mini-stream itself, stored as one regular 512-byte FAT sector,
        // holding the 100-byte PROPERTYSETHEADER+FORMATIDOFFSET+section.
        let mut prop_buf = vec![0u8; 100];
        prop_buf[0..2].copy_from_slice(&[0xFE, 0xFF]); // byte order mark
        prop_buf[2..4].copy_from_slice(&0u16.to_le_bytes()); // fmtVer
        // offsets 4-27 (OS version + app CLSID) left zero, ignored.
        let summary_format_id: [u8; 16] = [
            0xE0, 0x85, 0x9F, 0xF2, 0xF9, 0x4F, 0x68, 0x10, 0xAB, 0x91, 0x08, 0x00, 0x2B, 0x27, 0xB3, 0xD9,
        ];
        prop_buf[28..44].copy_from_slice(&summary_format_id);
        prop_buf[44..48].copy_from_slice(&le32(48)); // sectionStart
        prop_buf[48..52].copy_from_slice(&le32(52)); // section byte size (diagnostic, ignored)
        prop_buf[52..56].copy_from_slice(&le32(2)); // numProps
        prop_buf[56..60].copy_from_slice(&le32(pid::TITLE));
        prop_buf[60..64].copy_from_slice(&le32(24)); // relative offset -> absolute 72
        prop_buf[64..68].copy_from_slice(&le32(pid::CREATE_DTM));
        prop_buf[68..72].copy_from_slice(&le32(40)); // relative offset -> absolute 88
        prop_buf[72..76].copy_from_slice(&le32(vt::VT_LPSTR));
        prop_buf[76..80].copy_from_slice(&le32(6)); // "Hello\0"
        prop_buf[80..86].copy_from_slice(b"Hello\0");
        prop_buf[88..92].copy_from_slice(&le32(vt::VT_FILETIME));
        prop_buf[92..96].copy_from_slice(&le32(1_761_935_360)); // low
        prop_buf[96..100].copy_from_slice(&le32(30_785_590)); // high: 2020-01-01T00:00:00Z

        let mut mini_stream_sector = vec![0u8; SECTOR_SIZE];
        mini_stream_sector[0..100].copy_from_slice(&prop_buf);
        data.extend(mini_stream_sector);

        let cf = CompoundFile::open_with_options(Cursor::new(data), PropertyDecodeOptions::default())
            .await
            .unwrap();
        let index = cf.find_stream("SummaryInformation").expect("marker-prefixed name is stripped");
        let props = cf.properties(index).expect("property set decoded during open");

        assert_eq!(props.format_id.to_string(), format_id::SUMMARY);

        match props.get(pid::TITLE) {
            Some(PropertyValue::Lpstr(title)) => assert_eq!(title, "Hello"),
            other => panic!("expected VT_LPSTR title, got {other:?}"),
        }
        match props.get(pid::CREATE_DTM) {
            Some(PropertyValue::Filetime(Some(dt))) => {
                assert_eq!(dt.timestamp(), 1_577_836_800);
            }
            other => panic!("expected VT_FILETIME create-date, got {other:?}"),
        }
    }
}
