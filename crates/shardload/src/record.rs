//! CSV record parsing: extracting the partition-key field from a raw line.
//!
//! [`field_by_index`] walks a record left to right splitting on `,`,
//! honoring a single pair of double quotes around a field, and returns the
//! `index`-th field (1-based, matching the canonical "+1" variant settled
//! in the design notes: field `1` is the first field, not the zeroth).
//! Records are assumed to be single-line; a quoted field containing an
//! embedded newline is not supported.

use crate::err::ShardLoadError;

const DELIM: u8 = b',';
const QUOTE: u8 = b'"';

/// Returns the `index`-th (1-based) comma-separated field of `line`,
/// stripping a trailing `\n` (and `\r\n`) from the final field and
/// unquoting a field wrapped in a single pair of double quotes.
///
/// # Errors
///
/// Returns [`ShardLoadError::Parse`] if `line` has fewer than `index`
/// fields, or if a quoted field's closing quote is missing.
pub fn field_by_index(reader: usize, line: &[u8], index: usize) -> Result<&[u8], ShardLoadError> {
    if index == 0 {
        return Err(ShardLoadError::parse(
            reader,
            "field index is 1-based; 0 is not a valid field",
        ));
    }

    let mut rest = line;
    let mut field: &[u8] = &[];
    for _ in 0..index {
        if rest.is_empty() {
            return Err(ShardLoadError::parse(
                reader,
                format!("expected at least {index} fields, record ended early"),
            ));
        }
        let (f, consumed) = next_field(reader, rest)?;
        field = f;
        rest = &rest[consumed..];
    }
    Ok(field)
}

/// Splits the leading field off `c`, returning `(field, bytes_consumed)`.
/// `bytes_consumed` includes the trailing delimiter (or terminator) so the
/// caller can slice past it to reach the next field.
fn next_field(reader: usize, c: &[u8]) -> Result<(&[u8], usize), ShardLoadError> {
    if c[0] == QUOTE {
        let body = &c[1..];
        match memchr(QUOTE, body) {
            Some(i) => {
                let after = i + 1;
                let consumed = if body.get(after) == Some(&DELIM) {
                    1 + after + 1
                } else {
                    1 + after + trailing_len(&body[after..])
                };
                Ok((&body[..i], consumed))
            }
            None => Err(ShardLoadError::parse(reader, "unterminated quoted field")),
        }
    } else {
        match memchr(DELIM, c) {
            Some(i) => Ok((&c[..i], i + 1)),
            None => {
                let trim = trailing_len(c);
                Ok((&c[..c.len() - trim], c.len()))
            }
        }
    }
}

/// Number of trailing `\n` / `\r\n` bytes to strip from the final field of
/// a record.
fn trailing_len(b: &[u8]) -> usize {
    if b.ends_with(b"\r\n") {
        2
    } else if b.ends_with(b"\n") {
        1
    } else {
        0
    }
}

fn memchr(needle: u8, haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

/// Parses a field as the `i64` partition key the router hashes on.
pub fn parse_key(reader: usize, field: &[u8]) -> Result<i64, ShardLoadError> {
    let s = std::str::from_utf8(field)
        .map_err(|e| ShardLoadError::parse(reader, format!("field is not valid utf-8: {e}")))?;
    s.trim()
        .parse::<i64>()
        .map_err(ShardLoadError::IntConversion)
}
