//! HTTP Range header parsing for single byte ranges
//!
//! Only the first range of a `bytes=` list is honored. Suffix ranges
//! (`bytes=-500`) are treated as malformed so the caller falls back to a full
//! response.

use std::fmt;

/// Inclusive byte interval `[start, end]` within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Creates a range, returning `None` when `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Range covering a whole resource, or `None` when it is empty.
    pub fn full(total_length: u64) -> Option<Self> {
        total_length.checked_sub(1).map(|end| Self { start: 0, end })
    }

    /// First byte offset, inclusive.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset, inclusive.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered by the range.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for a `Content-Range` header against a resource of `total_length` bytes.
    pub fn content_range(&self, total_length: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_length)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Reasons a Range header cannot be served as partial content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Header is not a usable `bytes=<start>-[<end>]` expression
    #[error("Malformed range header: {reason}")]
    Malformed {
        /// What was wrong with the header
        reason: String,
    },

    /// Well-formed range that lies outside the resource
    #[error("Range starting at {start} not satisfiable for {total_length} bytes")]
    Unsatisfiable {
        /// Requested first byte
        start: u64,
        /// Length of the resource
        total_length: u64,
    },
}

impl RangeError {
    fn malformed(reason: impl Into<String>) -> Self {
        RangeError::Malformed {
            reason: reason.into(),
        }
    }
}

/// Parse a Range header against a resource of `total_length` bytes.
///
/// An `end` past the last byte is clamped to `total_length - 1`; an omitted
/// `end` means "to the end of the resource".
///
/// # Examples
/// ```
/// use tunestream_core::streaming::range::parse_range_header;
/// let range = parse_range_header("bytes=200-299", 1000).unwrap();
/// assert_eq!((range.start(), range.end(), range.length()), (200, 299, 100));
/// ```
///
/// # Errors
/// - `RangeError::Malformed` - Wrong unit, missing or non-numeric start, non-numeric end
/// - `RangeError::Unsatisfiable` - `start >= total_length` or `start > end`
pub fn parse_range_header(header: &str, total_length: u64) -> Result<ByteRange, RangeError> {
    let header = header.trim();
    let (unit, spec) = header
        .split_once('=')
        .ok_or_else(|| RangeError::malformed("missing '='"))?;

    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Err(RangeError::malformed(format!("unsupported unit {unit:?}")));
    }

    let first = spec.split(',').next().unwrap_or_default().trim();
    let (start_str, end_str) = first
        .split_once('-')
        .ok_or_else(|| RangeError::malformed("missing '-'"))?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return Err(RangeError::malformed("suffix ranges are not supported"));
    }

    let start = start_str
        .parse::<u64>()
        .map_err(|_| RangeError::malformed(format!("non-numeric start {start_str:?}")))?;

    let end = if end_str.is_empty() {
        None
    } else {
        Some(
            end_str
                .parse::<u64>()
                .map_err(|_| RangeError::malformed(format!("non-numeric end {end_str:?}")))?,
        )
    };

    let unsatisfiable = RangeError::Unsatisfiable {
        start,
        total_length,
    };

    let last_byte = total_length
        .checked_sub(1)
        .ok_or_else(|| unsatisfiable.clone())?;

    if start > last_byte {
        return Err(unsatisfiable);
    }

    let end = match end {
        Some(end) if end < start => return Err(unsatisfiable),
        Some(end) => end.min(last_byte),
        None => last_byte,
    };

    ByteRange::new(start, end).ok_or(unsatisfiable)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn range(start: u64, end: u64) -> ByteRange {
        ByteRange::new(start, end).unwrap()
    }

    #[test]
    fn test_parse_closed_range() {
        let parsed = parse_range_header("bytes=200-299", 1000).unwrap();
        assert_eq!(parsed, range(200, 299));
        assert_eq!(parsed.length(), 100);
        assert_eq!(parsed.content_range(1000), "bytes 200-299/1000");
    }

    #[test]
    fn test_parse_open_end() {
        let parsed = parse_range_header("bytes=900-", 1000).unwrap();
        assert_eq!(parsed, range(900, 999));
        assert_eq!(parsed.length(), 100);
    }

    #[test]
    fn test_parse_clamps_end_past_resource() {
        assert_eq!(
            parse_range_header("bytes=500-5000", 1000).unwrap(),
            range(500, 999)
        );
    }

    #[test]
    fn test_parse_single_byte() {
        assert_eq!(parse_range_header("bytes=0-0", 1).unwrap(), range(0, 0));
        assert_eq!(parse_range_header("bytes=999-999", 1000).unwrap(), range(999, 999));
    }

    #[test]
    fn test_only_first_range_honored() {
        assert_eq!(
            parse_range_header("bytes=0-9, 20-29", 100).unwrap(),
            range(0, 9)
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_unit_case() {
        assert_eq!(
            parse_range_header("  Bytes = 10 - 19 ", 100).unwrap(),
            range(10, 19)
        );
    }

    #[test]
    fn test_malformed_headers() {
        for header in [
            "bytes=abc-def",
            "bytes=-500",
            "bytes=10",
            "bytes=10-x",
            "items=0-10",
            "invalid",
            "bytes=",
            "bytes=1-2-3",
        ] {
            assert!(
                matches!(
                    parse_range_header(header, 1000),
                    Err(RangeError::Malformed { .. })
                ),
                "{header} should be malformed"
            );
        }
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        for (header, total) in [
            ("bytes=1000-", 1000),
            ("bytes=1500-1600", 1000),
            ("bytes=500-400", 1000),
            ("bytes=0-", 0),
        ] {
            assert_eq!(
                parse_range_header(header, total).map_err(|e| matches!(
                    e,
                    RangeError::Unsatisfiable { .. }
                )),
                Err(true),
                "{header} against {total} bytes should be unsatisfiable"
            );
        }
    }

    #[test]
    fn test_full_range() {
        assert_eq!(ByteRange::full(1000), Some(range(0, 999)));
        assert_eq!(ByteRange::full(0), None);
        assert_eq!(ByteRange::new(5, 4), None);
    }

    proptest! {
        #[test]
        fn prop_valid_ranges_round_trip(total in 1u64..1_000_000, a in any::<u64>(), b in any::<u64>()) {
            let start = a % total;
            let end = start + b % (total - start);
            let header = format!("bytes={start}-{end}");

            let parsed = parse_range_header(&header, total).unwrap();
            prop_assert_eq!(parsed.start(), start);
            prop_assert_eq!(parsed.end(), end);
            prop_assert_eq!(parsed.length(), end - start + 1);
            prop_assert!(parsed.end() < total);
        }

        #[test]
        fn prop_never_exceeds_resource(total in 0u64..10_000, header in "bytes=[0-9]{0,6}-[0-9]{0,6}") {
            if let Ok(parsed) = parse_range_header(&header, total) {
                prop_assert!(parsed.start() <= parsed.end());
                prop_assert!(parsed.end() < total);
            }
        }
    }
}
