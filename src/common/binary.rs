//! Little-endian primitive reads over byte slices.
//!
//! Every multi-byte value in a drawing stream is little-endian and unaligned,
//! so all reads go through zerocopy's byte-order wrappers instead of pointer
//! casts. Text helpers decode the two string encodings that appear inside
//! client-textbox and property blobs (UTF-16LE and Windows-1252).

use thiserror::Error;
use zerocopy::{FromBytes, I16, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("Insufficient data: expected {expected}, got {available}")]
    InsufficientData { expected: usize, available: usize },
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn window<const N: usize>(data: &[u8], offset: usize) -> BinaryResult<&[u8]> {
    let end = offset.checked_add(N).unwrap_or(usize::MAX);
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    window::<1>(data, offset).map(|b| b[0])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use dff_import::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = window::<2>(data, offset)?;
    Ok(U16::<LE>::read_from_bytes(bytes).map_or(0, |v| v.get()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use dff_import::common::binary::read_i16_le;
/// let data = [0xF0, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    let bytes = window::<2>(data, offset)?;
    Ok(I16::<LE>::read_from_bytes(bytes).map_or(0, |v| v.get()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = window::<4>(data, offset)?;
    Ok(U32::<LE>::read_from_bytes(bytes).map_or(0, |v| v.get()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use dff_import::common::binary::read_i32_le;
/// let data = [0xFF, 0xFF, 0xFF, 0xFF];
/// assert_eq!(read_i32_le(&data, 0).unwrap(), -1i32);
/// ```
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    let bytes = window::<4>(data, offset)?;
    Ok(I32::<LE>::read_from_bytes(bytes).map_or(0, |v| v.get()))
}

/// Decode UTF-16LE text, stopping at the first NUL code unit.
///
/// Unpaired surrogates are replaced rather than dropped so character
/// positions stay aligned with the source.
pub fn parse_utf16le_string(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode Windows-1252 ("compressed unicode") text, stopping at NUL.
pub fn parse_windows1252_string(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| windows_1252_to_char(b))
        .collect()
}

#[inline]
fn windows_1252_to_char(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        _ => byte as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_past_end_reports_sizes() {
        let data = [0u8; 3];
        assert_eq!(
            read_u32_le(&data, 1),
            Err(BinaryError::InsufficientData {
                expected: 5,
                available: 3
            })
        );
        assert!(read_i32_le(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_parse_utf16le() {
        let data = [0x48, 0x00, 0x69, 0x00, 0x00, 0x00, 0x41, 0x00];
        assert_eq!(parse_utf16le_string(&data), "Hi");
    }

    #[test]
    fn test_parse_windows1252() {
        let result = parse_windows1252_string(b"Say \x93hi\x94\0tail");
        assert_eq!(result, "Say \u{201C}hi\u{201D}");
    }
}
