//! UTF-16 offset conversions
//!
//! The DOM measures text in UTF-16 code units while Rust strings are UTF-8.
//! Flat offsets are kept in UTF-16 units throughout; these helpers translate
//! at the boundary where a `&str` is sliced or searched.

/// Length of `s` in UTF-16 code units
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Byte index for a UTF-16 offset
///
/// An offset landing inside a surrogate pair rounds down to the start of
/// that character. Returns `None` past the end of the string.
pub fn utf16_to_byte(s: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units >= offset {
            return Some(byte);
        }
        units += ch.len_utf16();
        if units > offset {
            return Some(byte);
        }
    }
    if units == offset {
        Some(s.len())
    } else {
        None
    }
}

/// UTF-16 offset of a byte index (must be a char boundary)
pub fn byte_to_utf16(s: &str, byte: usize) -> usize {
    utf16_len(&s[..byte])
}

/// Slice `s` by a half-open UTF-16 range, clamped to the string
pub fn slice_utf16(s: &str, start: usize, end: usize) -> &str {
    let len = utf16_len(s);
    let end = end.min(len);
    let start = start.min(end);
    let from = utf16_to_byte(s, start).unwrap_or(s.len());
    let to = utf16_to_byte(s, end).unwrap_or(s.len());
    &s[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_match_bytes() {
        assert_eq!(utf16_len("faith"), 5);
        assert_eq!(utf16_to_byte("faith", 3), Some(3));
        assert_eq!(utf16_to_byte("faith", 5), Some(5));
        assert_eq!(utf16_to_byte("faith", 6), None);
    }

    #[test]
    fn test_multibyte_offsets() {
        // 'é' is 2 bytes / 1 unit, '𝄞' is 4 bytes / 2 units
        let s = "é𝄞a";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(utf16_to_byte(s, 1), Some(2));
        assert_eq!(utf16_to_byte(s, 3), Some(6));
        assert_eq!(byte_to_utf16(s, 6), 3);
        // Inside the surrogate pair rounds down
        assert_eq!(utf16_to_byte(s, 2), Some(2));
    }

    #[test]
    fn test_slice_utf16_clamps() {
        assert_eq!(slice_utf16("grace alone", 6, 11), "alone");
        assert_eq!(slice_utf16("grace", 3, 99), "ce");
        assert_eq!(slice_utf16("grace", 4, 2), "");
    }
}
