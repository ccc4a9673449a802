//! Range header parsing and bounds resolution.
//!
//! The accepted grammar is `bytes=<first>-[<last>]`. Multi-range and
//! suffix forms (`bytes=-500`) are rejected rather than ignored, so a
//! client never mistakes a full-body 200 for the range it asked for.

/// A parsed, not yet bounds-checked, range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=first-last`, both inclusive.
    Bounded { first: u64, last: u64 },
    /// `bytes=first-`, open-ended: the suffix of the file from `first`.
    From { first: u64 },
}

/// A range resolved against a concrete file size. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub first: u64,
    pub last: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range header")]
    Malformed,

    #[error("range not satisfiable for size {size}")]
    Unsatisfiable { size: u64 },
}

/// Parse a Range header value.
pub fn parse_range(header: &str) -> Result<RangeSpec, RangeError> {
    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;

    if spec.contains(',') {
        return Err(RangeError::Malformed);
    }

    let mut parts = spec.splitn(2, '-');
    let first = parts.next().ok_or(RangeError::Malformed)?;
    let last = parts.next().ok_or(RangeError::Malformed)?;

    if first.is_empty() {
        return Err(RangeError::Malformed);
    }
    let first: u64 = first.parse().map_err(|_| RangeError::Malformed)?;

    if last.is_empty() {
        return Ok(RangeSpec::From { first });
    }
    let last: u64 = last.parse().map_err(|_| RangeError::Malformed)?;
    if last < first {
        return Err(RangeError::Malformed);
    }
    Ok(RangeSpec::Bounded { first, last })
}

impl RangeSpec {
    /// Check the parsed range against a file size.
    pub fn resolve(self, size: u64) -> Result<ByteRange, RangeError> {
        let (first, last) = match self {
            RangeSpec::Bounded { first, last } => (first, last),
            RangeSpec::From { first } => {
                if size == 0 {
                    return Err(RangeError::Unsatisfiable { size });
                }
                (first, size - 1)
            }
        };
        if first >= size || last >= size {
            return Err(RangeError::Unsatisfiable { size });
        }
        Ok(ByteRange { first, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounded_range() {
        assert_eq!(
            parse_range("bytes=0-99"),
            Ok(RangeSpec::Bounded { first: 0, last: 99 })
        );
        assert_eq!(
            parse_range("bytes=500-500"),
            Ok(RangeSpec::Bounded { first: 500, last: 500 })
        );
    }

    #[test]
    fn parses_open_ended_range() {
        assert_eq!(parse_range("bytes=900-"), Ok(RangeSpec::From { first: 900 }));
        assert_eq!(parse_range(" bytes=0- "), Ok(RangeSpec::From { first: 0 }));
    }

    #[test]
    fn rejects_malformed_ranges() {
        for header in [
            "bytes=",
            "bytes=-",
            "bytes=-500",
            "bytes=abc-def",
            "bytes=10",
            "bytes=5-3",
            "bytes=0-99,200-299",
            "bits=0-99",
            "0-99",
        ] {
            assert_eq!(parse_range(header), Err(RangeError::Malformed), "{header}");
        }
    }

    #[test]
    fn resolve_within_bounds() {
        let range = parse_range("bytes=0-99").unwrap().resolve(1000).unwrap();
        assert_eq!(range, ByteRange { first: 0, last: 99 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn resolve_open_ended_to_eof() {
        let range = parse_range("bytes=900-").unwrap().resolve(1000).unwrap();
        assert_eq!(range, ByteRange { first: 900, last: 999 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn resolve_out_of_bounds() {
        assert_eq!(
            parse_range("bytes=1000-").unwrap().resolve(1000),
            Err(RangeError::Unsatisfiable { size: 1000 })
        );
        assert_eq!(
            parse_range("bytes=0-1000").unwrap().resolve(1000),
            Err(RangeError::Unsatisfiable { size: 1000 })
        );
        assert_eq!(
            parse_range("bytes=0-").unwrap().resolve(0),
            Err(RangeError::Unsatisfiable { size: 0 })
        );
    }

    #[test]
    fn single_byte_file() {
        let range = parse_range("bytes=0-0").unwrap().resolve(1).unwrap();
        assert_eq!(range.len(), 1);
    }
}
