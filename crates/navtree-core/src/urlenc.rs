//! Percent-encoding and path-splitting helpers.
//!
//! Path segments are encoded with the RFC 3986 unreserved set; query strings
//! go through `url::form_urlencoded` instead (form encoding, `+` for space).

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode a single URL component.
///
/// Everything outside the RFC 3986 unreserved set is encoded, including `/`.
#[must_use]
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push('%');
                result.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                result.push(HEX_DIGITS[(byte & 0xF) as usize] as char);
            }
        }
    }
    result
}

/// Decode a percent-encoded component.
///
/// With `plus_as_space`, `+` additionally decodes to a space (form encoding).
/// Returns `None` on invalid percent-encoding or non-UTF-8 output.
#[must_use]
pub fn percent_decode(s: &str, plus_as_space: bool) -> Option<String> {
    let mut result = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let hi = char::from(bytes.next()?).to_digit(16)?;
            let lo = char::from(bytes.next()?).to_digit(16)?;
            result.push((hi * 16 + lo) as u8);
        } else if byte == b'+' && plus_as_space {
            result.push(b' ');
        } else {
            result.push(byte);
        }
    }
    String::from_utf8(result).ok()
}

/// Split a path into `/`-separated parts.
///
/// The result is normalized to always start with one empty part and to never
/// end with one: `""`, `"/"` → `[""]`; `"/a/b"`, `"a/b"`, `"a/b/"` →
/// `["", "a", "b"]`. Route templates and evaluated URL paths are split the
/// same way so their parts align by index.
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut parts = vec![""];
    parts.extend(trimmed.split('/'));
    if parts.len() > 1 && parts[parts.len() - 1].is_empty() {
        parts.pop();
    }
    parts
}
