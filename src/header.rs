use crate::{
    constants::{self, Readable},
    error::{Error, HeaderErrorType},
    Result,
};
use derivative::Derivative;
use std::array::TryFromSliceError;
use tokio::io::AsyncReadExt;

/// The 512-byte CFB header (MS-CFB §2.2), decoded into native types.
/// Field names follow the format's own terminology (FAT/DIFAT/mini-FAT)
/// rather than the teacher's "sector allocation table" phrasing.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Header {
    pub major_version: u16,
    pub minor_version: u16,
    pub sector_size: u32,
    pub mini_sector_size: u32,
    /// Streams strictly smaller than this live in the mini-stream.
    pub mini_stream_cutoff: u32,
    /// First sector of the directory stream chain.
    pub first_directory_sector: u32,
    /// Number of sectors making up the FAT (diagnostic only; the FAT
    /// assembler derives the real length from the sector chains it walks).
    pub num_fat_sectors: u32,
    pub first_minifat_sector: u32,
    pub num_minifat_sectors: u32,
    pub first_difat_sector: u32,
    pub num_difat_sectors: u32,
    /// Up to 109 initial FAT sector numbers, stopping at the first sentinel.
    #[derivative(Debug = "ignore")]
    pub difat_head: Vec<u32>,
}

impl Header {
    fn from_raw(raw: RawHeader) -> Self {
        let major_version = u16::from_le_bytes(raw.major_version);
        let minor_version = u16::from_le_bytes(raw.minor_version);
        let sector_size = 1u32 << u16::from_le_bytes(raw.sector_shift);
        let mini_sector_size = 1u32 << u16::from_le_bytes(raw.mini_sector_shift);

        let mut difat_head = Vec::with_capacity(109);
        for sect in &raw.difat_head_raw {
            if *sect == constants::ENDOFCHAIN || *sect == constants::FREESECT {
                break;
            }
            difat_head.push(*sect);
        }

        Header {
            major_version,
            minor_version,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff: u32::from_le_bytes(raw.mini_stream_cutoff),
            first_directory_sector: u32::from_le_bytes(raw.first_directory_sector),
            num_fat_sectors: u32::from_le_bytes(raw.num_fat_sectors),
            first_minifat_sector: u32::from_le_bytes(raw.first_minifat_sector),
            num_minifat_sectors: u32::from_le_bytes(raw.num_minifat_sectors),
            first_difat_sector: u32::from_le_bytes(raw.first_difat_sector),
            num_difat_sectors: u32::from_le_bytes(raw.num_difat_sectors),
            difat_head,
        }
    }
}

/// Raw, still-byte-array fields straight off disk. See
/// <https://winprotocoldoc.blob.core.windows.net/productionwindowsarchives/MS-CFB/%5bMS-CFB%5d.pdf>
/// §2.2 for field semantics.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
struct RawHeader {
    minor_version: [u8; 2],
    major_version: [u8; 2],
    sector_shift: [u8; 2],
    mini_sector_shift: [u8; 2],
    num_directory_sectors: [u8; 4],
    num_fat_sectors: [u8; 4],
    first_directory_sector: [u8; 4],
    mini_stream_cutoff: [u8; 4],
    first_minifat_sector: [u8; 4],
    num_minifat_sectors: [u8; 4],
    first_difat_sector: [u8; 4],
    num_difat_sectors: [u8; 4],
    #[derivative(Debug = "ignore")]
    difat_head_raw: [u32; 109],
}

fn field<const N: usize>(header: &[u8], start: usize, name: &'static str) -> Result<[u8; N]> {
    header[start..start + N]
        .try_into()
        .map_err(|err: TryFromSliceError| Error::InvalidFormat(HeaderErrorType::Parsing(name, err.to_string())))
}

pub async fn parse_header<R>(read: &mut R) -> Result<Header>
where
    R: Readable,
{
    let mut header = [0u8; constants::HEADER_LENGTH];
    let bytes_read = read.read(&mut header).await?;
    if bytes_read != constants::HEADER_LENGTH {
        return Err(Error::InvalidFormat(HeaderErrorType::NotEnoughBytes(
            constants::HEADER_LENGTH,
            bytes_read,
        )));
    }

    let signature: [u8; 8] = field(&header, 0, "signature")?;
    if signature != constants::MAGIC_BYTES {
        return Err(Error::InvalidFormat(HeaderErrorType::WrongMagicBytes(signature.into())));
    }

    let class_identifier: [u8; 16] = field(&header, 8, "class_identifier")?;
    if class_identifier != [0u8; 16] {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "class_identifier",
            "header class id must be all zeroes".to_string(),
        )));
    }

    let minor_version: [u8; 2] = field(&header, 24, "minor_version")?;
    if minor_version != constants::CORRECT_MINOR_VERSION {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "minor_version",
            format!("incorrect minor version {minor_version:x?}"),
        )));
    }

    let major_version: [u8; 2] = field(&header, 26, "major_version")?;
    match major_version {
        constants::MAJOR_VERSION_3 | constants::MAJOR_VERSION_4 => {}
        _ => {
            return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
                "major_version",
                format!("incorrect major version {major_version:x?}"),
            )))
        }
    }

    let byte_order_mark: [u8; 2] = field(&header, 28, "byte_order_identifier")?;
    if byte_order_mark != [0xFE, 0xFF] {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "byte_order_identifier",
            format!("incorrect byte order identifier {byte_order_mark:x?}"),
        )));
    }

    let sector_shift: [u8; 2] = field(&header, 30, "sector_shift")?;
    match major_version {
        constants::MAJOR_VERSION_3 if sector_shift == constants::SECTOR_SIZE_VERSION_3 => {}
        constants::MAJOR_VERSION_4 if sector_shift == constants::SECTOR_SIZE_VERSION_4 => {}
        // Any other (version, sector-size) pairing is a version/geometry
        // mismatch rather than a structurally malformed header (spec §4.4,
        // "Any other (version, sector-size) combination is an error").
        _ => return Err(Error::VersionMismatch("sector size does not match the declared format version")),
    }

    let mini_sector_shift: [u8; 2] = field(&header, 32, "mini_sector_shift")?;
    if mini_sector_shift != constants::CORRECT_MINI_SECTOR_SIZE {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "mini_sector_shift",
            format!("incorrect mini sector shift {mini_sector_shift:x?}"),
        )));
    }

    let reserved: [u8; 6] = field(&header, 34, "reserved")?;
    if reserved != [0u8; 6] {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "reserved",
            "non-zero entries in reserved header field".to_string(),
        )));
    }

    let num_directory_sectors: [u8; 4] = field(&header, 40, "num_directory_sectors")?;
    if num_directory_sectors != [0u8; 4] && major_version == constants::MAJOR_VERSION_3 {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "num_directory_sectors",
            "must be zero for major version 3".to_string(),
        )));
    }

    let num_fat_sectors: [u8; 4] = field(&header, 44, "num_fat_sectors")?;
    let first_directory_sector: [u8; 4] = field(&header, 48, "first_directory_sector")?;
    let _transaction_signature: [u8; 4] = field(&header, 52, "transaction_signature_number")?;

    let mini_stream_cutoff: [u8; 4] = field(&header, 56, "mini_stream_cutoff")?;
    if mini_stream_cutoff != constants::CORRECT_STANDARD_STREAM_MIN_SIZE {
        return Err(Error::InvalidFormat(HeaderErrorType::Parsing(
            "mini_stream_cutoff",
            format!("incorrect mini stream cutoff {mini_stream_cutoff:x?}"),
        )));
    }

    let first_minifat_sector: [u8; 4] = field(&header, 60, "first_minifat_sector")?;
    let num_minifat_sectors: [u8; 4] = field(&header, 64, "num_minifat_sectors")?;
    let first_difat_sector: [u8; 4] = field(&header, 68, "first_difat_sector")?;
    let num_difat_sectors: [u8; 4] = field(&header, 72, "num_difat_sectors")?;

    let mut difat_head_raw = [0u32; 109];
    for (i, chunk) in header[76..512].chunks_exact(4).enumerate() {
        difat_head_raw[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    Ok(Header::from_raw(RawHeader {
        minor_version,
        major_version,
        sector_shift,
        mini_sector_shift,
        num_directory_sectors,
        num_fat_sectors,
        first_directory_sector,
        mini_stream_cutoff,
        first_minifat_sector,
        num_minifat_sectors,
        first_difat_sector,
        num_difat_sectors,
        difat_head_raw,
    }))
}
