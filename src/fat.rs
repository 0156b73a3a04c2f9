//! FAT/DIFAT/mini-FAT assembly.
//!
//! The teacher never implements the DIFAT extension: once the 109-entry
//! header head is exhausted it returns `Error::CurrentlyUnimplemented`. Here
//! the chain is followed the way `other_examples`' cfb-style readers do it —
//! each DIFAT sector holds `(sector_size / 4) - 1` FAT sector numbers
//! followed by a trailing next-DIFAT-sector link, terminated by
//! `ENDOFCHAIN`.

use crate::{
    constants,
    error::Error,
    header::Header,
    Result,
};

fn sector_as_u32s(sector: &[u8]) -> impl Iterator<Item = u32> + '_ {
    sector
        .chunks_exact(4)
        .map(|quad| u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
}

/// Walks the DIFAT chain and returns the full, ordered list of FAT sector
/// numbers (head entries from the header followed by any extension
/// sectors).
fn difat_sectors(sectors: &[Vec<u8>], header: &Header) -> Result<Vec<u32>> {
    let mut fat_sector_numbers = header.difat_head.clone();

    if header.num_difat_sectors == 0 {
        return Ok(fat_sector_numbers);
    }

    let entries_per_difat_sector = sectors
        .first()
        .map(|s| s.len() / 4 - 1)
        .unwrap_or(0);

    let mut next = header.first_difat_sector;
    let mut visited = 0usize;
    while next != constants::ENDOFCHAIN {
        if next == constants::FREESECT || next as usize >= sectors.len() {
            return Err(Error::Truncated("DIFAT chain references an out-of-range sector"));
        }
        if visited >= header.num_difat_sectors as usize {
            return Err(Error::Truncated("DIFAT chain longer than num_difat_sectors"));
        }
        let sector = &sectors[next as usize];
        let mut values = sector_as_u32s(sector);
        for _ in 0..entries_per_difat_sector {
            match values.next() {
                Some(v) if v == constants::FREESECT => {}
                Some(v) => fat_sector_numbers.push(v),
                None => break,
            }
        }
        next = values.next().unwrap_or(constants::ENDOFCHAIN);
        visited += 1;
    }

    Ok(fat_sector_numbers)
}

/// Reads every FAT sector (following DIFAT extension as needed) and
/// concatenates them into the flat `sector index -> next sector` table.
pub fn assemble_fat(sectors: &[Vec<u8>], header: &Header) -> Result<Vec<u32>> {
    let fat_sector_numbers = difat_sectors(sectors, header)?;

    let mut fat = Vec::new();
    for sector_index in fat_sector_numbers {
        if sector_index as usize >= sectors.len() {
            return Err(Error::Truncated("FAT references an out-of-range sector"));
        }
        fat.extend(sector_as_u32s(&sectors[sector_index as usize]));
    }

    Ok(fat)
}

/// Follows a FAT chain starting at `first_sector`, concatenating the raw
/// sector bytes. Bounded by the total sector count so a cyclic chain cannot
/// spin forever.
pub fn read_chain(sectors: &[Vec<u8>], fat: &[u32], first_sector: u32) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut next = first_sector;
    let mut visited = 0usize;
    while next != constants::ENDOFCHAIN {
        if next as usize >= sectors.len() {
            return Err(Error::Truncated("sector chain references an out-of-range sector"));
        }
        if visited > sectors.len() {
            return Err(Error::Truncated("sector chain longer than the file's sector count"));
        }
        data.extend(sectors[next as usize].iter());
        next = *fat
            .get(next as usize)
            .ok_or(Error::Truncated("FAT has no entry for a chained sector"))?;
        visited += 1;
    }
    Ok(data)
}

/// Assembles the mini-FAT table (same shape as the regular FAT, but chained
/// through the regular FAT/sectors rather than self-contained).
pub fn assemble_minifat(sectors: &[Vec<u8>], fat: &[u32], header: &Header) -> Result<Vec<u32>> {
    if header.num_minifat_sectors == 0 || header.first_minifat_sector == constants::ENDOFCHAIN {
        return Ok(Vec::new());
    }

    let raw = read_chain(sectors, fat, header.first_minifat_sector)?;
    Ok(sector_as_u32s(&raw).collect())
}
