//! OLE property-set decoding ([MS-OLEPS]), used for streams such as
//! `\u{0005}SummaryInformation` and `\u{0005}DocumentSummaryInformation`.
//!
//! Layout and per-type decoding grounded on
//! `examples/DevExzh-litchi/src/ole/metadata.rs`'s `parse_property_stream`/
//! `parse_property_value`, generalized into a typed `PropertyValue` enum
//! and widened to every VT_* tag rather than litchi's metadata-only subset.

use crate::{error::Error, guid::Guid, Result};
use chrono::{DateTime, Duration, Utc};

pub mod vt {
    pub const VT_NULL: u32 = 1;
    pub const VT_I2: u32 = 2;
    pub const VT_I4: u32 = 3;
    pub const VT_R4: u32 = 4;
    pub const VT_R8: u32 = 5;
    pub const VT_DATE: u32 = 7;
    pub const VT_BSTR: u32 = 8;
    pub const VT_ERROR: u32 = 10;
    pub const VT_BOOL: u32 = 11;
    pub const VT_I1: u32 = 16;
    pub const VT_UI1: u32 = 17;
    pub const VT_UI2: u32 = 18;
    pub const VT_UI4: u32 = 19;
    pub const VT_INT: u32 = 22;
    pub const VT_UINT: u32 = 23;
    pub const VT_LPSTR: u32 = 30;
    pub const VT_LPWSTR: u32 = 31;
    pub const VT_FILETIME: u32 = 64;
    pub const VT_BLOB: u32 = 65;
    pub const VT_CLSID: u32 = 72;
}

/// Well-known property identifiers for SummaryInformation /
/// DocumentSummaryInformation streams.
pub mod pid {
    // SummaryInformation
    pub const CODEPAGE: u32 = 1;
    pub const TITLE: u32 = 2;
    pub const SUBJECT: u32 = 3;
    pub const AUTHOR: u32 = 4;
    pub const KEYWORDS: u32 = 5;
    pub const COMMENTS: u32 = 6;
    pub const TEMPLATE: u32 = 7;
    pub const LAST_SAVED_BY: u32 = 8;
    pub const REVISION_NUMBER: u32 = 9;
    pub const EDIT_TIME: u32 = 10;
    pub const LAST_PRINTED: u32 = 11;
    pub const CREATE_DTM: u32 = 12;
    pub const LASTSAVE_DTM: u32 = 13;
    pub const PAGECOUNT: u32 = 14;
    pub const WORDCOUNT: u32 = 15;
    pub const CHARCOUNT: u32 = 16;
    pub const APPNAME: u32 = 18;
    pub const SECURITY: u32 = 19;

    // DocumentSummaryInformation
    pub const CATEGORY: u32 = 2;
    pub const MANAGER: u32 = 14;
    pub const COMPANY: u32 = 15;
}

/// Well-known format ids, canonically displayed.
pub mod format_id {
    pub const SUMMARY: &str = "F29F85E0-4FF9-1068-AB91-08002B27B3D9";
    pub const DOC_SUMMARY: &str = "D5CDD502-2E9C-101B-9397-08002B2CF9AE";
}

#[derive(Clone, Debug)]
pub enum PropertyValue {
    Null,
    I1(i8),
    I2(i16),
    I4(i32),
    UI1(u8),
    UI2(u16),
    UI4(u32),
    R4(f32),
    R8(f64),
    Bool(bool),
    /// Seconds since the Unix epoch, decoded per `PropertyDecodeOptions`.
    Date(i64),
    Lpstr(String),
    Lpwstr(String),
    /// Absolute timestamp, `None` when `PID_EDITTIME` (an elapsed duration;
    /// see `edit_time` below) or out of `DateTime<Utc>`'s representable range.
    Filetime(Option<DateTime<Utc>>),
    /// Elapsed duration, populated only for `PID_EDITTIME` items.
    EditTime(Duration),
    Blob(Vec<u8>),
    Clsid(Guid),
}

#[derive(Clone, Debug)]
pub struct Property {
    pub id: u32,
    pub value: PropertyValue,
}

#[derive(Clone, Debug)]
pub struct PropertySet {
    pub format_id: Guid,
    pub properties: Vec<Property>,
}

impl PropertySet {
    pub fn get(&self, id: u32) -> Option<&PropertyValue> {
        self.properties.iter().find(|p| p.id == id).map(|p| &p.value)
    }
}

/// Controls the two ambiguities spec §9 flags in VT_DATE / VT_BSTR decoding.
#[derive(Clone, Copy, Debug)]
pub struct PropertyDecodeOptions {
    /// When set, VT_DATE reproduces the source's bug: the stored value is
    /// discarded and "now" (seconds since the Unix epoch) is returned
    /// instead. Defaults to `false` (the corrected conversion).
    pub bug_compatible_vt_date: bool,
}

impl Default for PropertyDecodeOptions {
    fn default() -> Self {
        PropertyDecodeOptions {
            bug_compatible_vt_date: false,
        }
    }
}

const PROPERTYSETHEADER_LEN: usize = 28;
const FORMATIDOFFSET_LEN: usize = 20;
const EPOCH_DIFF_100NS: i64 = 116_444_736_000_000_000;

fn u16_at(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(Error::InvalidPropertySet("truncated while reading a u16 field"))
}

fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(Error::InvalidPropertySet("truncated while reading a u32 field"))
}

fn i32_at(data: &[u8], offset: usize) -> Result<i32> {
    u32_at(data, offset).map(|v| v as i32)
}

fn f32_at(data: &[u8], offset: usize) -> Result<f32> {
    u32_at(data, offset).map(f32::from_bits)
}

fn f64_at(data: &[u8], offset: usize) -> Result<f64> {
    data.get(offset..offset + 8)
        .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
        .ok_or(Error::InvalidPropertySet("truncated while reading an f64 field"))
}

fn bytes_at<'a>(data: &'a [u8], offset: usize, len: usize) -> Result<&'a [u8]> {
    data.get(offset..offset + len)
        .ok_or(Error::InvalidPropertySet("truncated while reading a byte run"))
}

fn filetime_ticks_to_timestamp(ticks: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp((ticks - EPOCH_DIFF_100NS) / 10_000_000, 0)
}

/// Decodes one typed value at `offset` (already past the leading `type`
/// field). `offset` is an absolute index into the whole property-set
/// buffer, matching the on-disk item table's `(id, offset)` pairs.
fn decode_value(
    data: &[u8],
    offset: usize,
    prop_type: u32,
    id: u32,
    options: PropertyDecodeOptions,
) -> Result<PropertyValue> {
    use vt::*;

    Ok(match prop_type {
        VT_NULL => PropertyValue::Null,
        VT_I1 => PropertyValue::I1(*bytes_at(data, offset, 1)?.first().unwrap() as i8),
        VT_UI1 => PropertyValue::UI1(*bytes_at(data, offset, 1)?.first().unwrap()),
        VT_I2 => PropertyValue::I2(u16_at(data, offset)? as i16),
        VT_UI2 => PropertyValue::UI2(u16_at(data, offset)?),
        VT_I4 | VT_INT | VT_ERROR => PropertyValue::I4(i32_at(data, offset)?),
        VT_UI4 | VT_UINT => PropertyValue::UI4(u32_at(data, offset)?),
        VT_R4 => PropertyValue::R4(f32_at(data, offset)?),
        VT_R8 => PropertyValue::R8(f64_at(data, offset)?),
        VT_BOOL => PropertyValue::Bool(*bytes_at(data, offset, 1)?.first().unwrap() != 0),
        VT_DATE => {
            let value = f64_at(data, offset)?;
            let seconds = if options.bug_compatible_vt_date {
                Utc::now().timestamp()
            } else {
                ((value - 25569.0) * 86400.0) as i64
            };
            PropertyValue::Date(seconds)
        }
        VT_BSTR => {
            let count = u32_at(data, offset)? as usize;
            let raw = bytes_at(data, offset + 4, count)?;
            let trimmed = raw.strip_suffix(&[0u8]).unwrap_or(raw);
            PropertyValue::Lpstr(String::from_utf8_lossy(trimmed).into_owned())
        }
        VT_LPSTR => {
            let count = u32_at(data, offset)? as usize;
            let raw = bytes_at(data, offset + 4, count)?;
            let trimmed = raw.strip_suffix(&[0u8]).unwrap_or(raw);
            PropertyValue::Lpstr(String::from_utf8_lossy(trimmed).into_owned())
        }
        VT_LPWSTR => {
            let count = u32_at(data, offset)? as usize;
            let raw = bytes_at(data, offset + 4, count * 2)?;
            let mut units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();
            if units.last() == Some(&0) {
                units.pop();
            }
            PropertyValue::Lpwstr(String::from_utf16_lossy(&units))
        }
        VT_FILETIME => {
            let low = u32_at(data, offset)? as u64;
            let high = u32_at(data, offset + 4)? as u64;
            let ticks_unsigned = (high << 32) | low;
            if id == pid::EDIT_TIME {
                PropertyValue::EditTime(Duration::seconds((ticks_unsigned / 10_000_000) as i64))
            } else {
                let ticks = ticks_unsigned as i64;
                PropertyValue::Filetime(filetime_ticks_to_timestamp(ticks))
            }
        }
        VT_BLOB => {
            let count = u32_at(data, offset)? as usize;
            PropertyValue::Blob(bytes_at(data, offset + 4, count)?.to_vec())
        }
        VT_CLSID => {
            let bytes: [u8; 16] = bytes_at(data, offset, 16)?.try_into().unwrap();
            PropertyValue::Clsid(Guid::from_bytes(bytes))
        }
        _ => PropertyValue::Null,
    })
}

/// Decodes the first property-set section found in `data` (spec §9
/// "Multiple property-set sections" — a faithful parser restricts itself to
/// the first, though CFB permits more).
pub fn parse_property_set(data: &[u8], options: PropertyDecodeOptions) -> Result<PropertySet> {
    if data.len() < PROPERTYSETHEADER_LEN + FORMATIDOFFSET_LEN {
        return Err(Error::InvalidPropertySet("property stream shorter than PROPERTYSETHEADER+FORMATIDOFFSET"));
    }

    let byte_order_mark = u16_at(data, 0)?;
    if byte_order_mark != crate::constants::PROPERTY_SET_BYTE_ORDER_MARK {
        return Err(Error::InvalidPropertySet("incorrect byte order mark"));
    }

    let format_id_bytes: [u8; 16] = bytes_at(data, 28, 16)?.try_into().unwrap();
    let format_id = Guid::from_bytes(format_id_bytes);
    let section_start = u32_at(data, 44)? as usize;

    if section_start + 8 > data.len() {
        return Err(Error::InvalidPropertySet("section start is out of range"));
    }

    let num_props = u32_at(data, section_start + 4)? as usize;
    let table_start = section_start + 8;

    let mut properties = Vec::with_capacity(num_props);
    for i in 0..num_props {
        let entry_offset = table_start + i * 8;
        let id = match u32_at(data, entry_offset) {
            Ok(id) => id,
            Err(_) => break,
        };
        let relative_offset = match u32_at(data, entry_offset + 4) {
            Ok(v) => v as usize,
            Err(_) => break,
        };
        let value_offset = section_start + relative_offset;
        let prop_type = match u32_at(data, value_offset) {
            Ok(t) => t,
            Err(_) => continue,
        };
        // Unrecognized tags are skipped without aborting the rest: each
        // item's value sits at an absolute offset, so a bad tag can't
        // desynchronize subsequent items.
        if let Ok(value) = decode_value(data, value_offset + 4, prop_type, id, options) {
            properties.push(Property { id, value });
        }
    }

    Ok(PropertySet { format_id, properties })
}
