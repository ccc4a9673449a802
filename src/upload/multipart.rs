//! Browser-shaped `multipart/form-data` parsing.
//!
//! A small state machine over the buffered body: find the next boundary
//! delimiter, read part headers up to the blank line, then take bytes
//! until the following delimiter. Nested multipart and transfer
//! encodings are out of scope; browsers do not send them for file
//! uploads.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultipartError {
    #[error("content type has no boundary parameter")]
    MissingBoundary,

    #[error("multipart body is truncated")]
    Truncated,

    #[error("malformed part headers")]
    MalformedHeaders,
}

/// Headers of a single part, as sent by browsers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// One decoded part: headers plus raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPart {
    pub headers: PartHeaders,
    pub body: Vec<u8>,
}

/// Extract the boundary parameter from a Content-Type header value.
pub fn boundary_from_content_type(content_type: &str) -> Result<String, MultipartError> {
    for param in content_type.split(';') {
        let param = param.trim();
        if let Some(value) = param.strip_prefix("boundary=") {
            let value = value.trim_matches('"');
            if !value.is_empty() {
                return Ok(value.to_string());
            }
        }
    }
    Err(MultipartError::MissingBoundary)
}

enum State {
    SeekBoundary,
    ReadHeaders,
    ReadBody,
}

/// Split a buffered multipart body into its parts.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<RawPart>, MultipartError> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut cursor = 0usize;
    let mut state = State::SeekBoundary;
    let mut headers = PartHeaders::default();

    loop {
        match state {
            State::SeekBoundary => {
                let at = find(&body[cursor..], delimiter).ok_or(MultipartError::Truncated)?;
                cursor += at + delimiter.len();
                if body[cursor..].starts_with(b"--") {
                    // Closing delimiter.
                    return Ok(parts);
                }
                // Skip the CRLF after the delimiter line.
                if body[cursor..].starts_with(b"\r\n") {
                    cursor += 2;
                } else if body[cursor..].starts_with(b"\n") {
                    cursor += 1;
                } else {
                    return Err(MultipartError::Truncated);
                }
                // `headers` is back to default here: ReadBody takes it
                // out when the previous part completes.
                state = State::ReadHeaders;
            }
            State::ReadHeaders => {
                let line_end = find(&body[cursor..], b"\r\n").ok_or(MultipartError::Truncated)?;
                let line = &body[cursor..cursor + line_end];
                cursor += line_end + 2;
                if line.is_empty() {
                    state = State::ReadBody;
                    continue;
                }
                let line =
                    std::str::from_utf8(line).map_err(|_| MultipartError::MalformedHeaders)?;
                let (header_name, value) = line
                    .split_once(':')
                    .ok_or(MultipartError::MalformedHeaders)?;
                let value = value.trim();
                if header_name.eq_ignore_ascii_case("content-disposition") {
                    headers.name = param_value(value, "name");
                    headers.filename = param_value(value, "filename");
                } else if header_name.eq_ignore_ascii_case("content-type") {
                    headers.content_type = Some(value.to_string());
                }
            }
            State::ReadBody => {
                let end = match find(&body[cursor..], delimiter) {
                    Some(at) => cursor + at,
                    // Tolerate a missing closing delimiter: the last
                    // part runs to end of body.
                    None => body.len(),
                };
                let mut part_body = &body[cursor..end];
                // The CRLF before the delimiter belongs to the framing,
                // not the part.
                if part_body.ends_with(b"\r\n") {
                    part_body = &part_body[..part_body.len() - 2];
                } else if part_body.ends_with(b"\n") {
                    part_body = &part_body[..part_body.len() - 1];
                }
                parts.push(RawPart {
                    headers: std::mem::take(&mut headers),
                    body: part_body.to_vec(),
                });
                if end == body.len() {
                    return Ok(parts);
                }
                cursor = end;
                state = State::SeekBoundary;
            }
        }
    }
}

/// Pull a quoted parameter out of a Content-Disposition value. The key
/// must start a parameter (`filename=` must not match inside another
/// parameter's value, and `name=` must not match inside `filename=`).
fn param_value(header: &str, key: &str) -> Option<String> {
    let needle = format!("{key}=");
    let mut search_from = 0;
    while let Some(at) = header[search_from..].find(&needle) {
        let absolute = search_from + at;
        let preceded_ok = absolute == 0
            || matches!(
                header.as_bytes()[absolute - 1],
                b' ' | b';' | b'\t'
            );
        if preceded_ok {
            let raw = &header[absolute + needle.len()..];
            let value = if let Some(rest) = raw.strip_prefix('"') {
                rest.split('"').next().unwrap_or("")
            } else {
                raw.split(';').next().unwrap_or("").trim()
            };
            return Some(value.to_string());
        }
        search_from = absolute + needle.len();
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(boundary: &str, parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (disposition, content) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; {disposition}\r\n\r\n").as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[test]
    fn boundary_extraction() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=xyz").unwrap(),
            "xyz"
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=\"quoted\"").unwrap(),
            "quoted"
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data"),
            Err(MultipartError::MissingBoundary)
        );
    }

    #[test]
    fn parses_two_file_parts() {
        let body = body_with(
            "BOUND",
            &[
                ("name=\"files[]\"; filename=\"a.txt\"", b"alpha"),
                ("name=\"files[]\"; filename=\"b.txt\"", b"bravo"),
            ],
        );
        let parts = parse_multipart(&body, "BOUND").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].headers.filename.as_deref(), Some("a.txt"));
        assert_eq!(parts[0].body, b"alpha");
        assert_eq!(parts[1].headers.filename.as_deref(), Some("b.txt"));
        assert_eq!(parts[1].body, b"bravo");
    }

    #[test]
    fn part_without_filename() {
        let body = body_with("B", &[("name=\"comment\"", b"hello world")]);
        let parts = parse_multipart(&body, "B").unwrap();
        assert_eq!(parts[0].headers.name.as_deref(), Some("comment"));
        assert_eq!(parts[0].headers.filename, None);
    }

    #[test]
    fn name_does_not_match_inside_filename() {
        let header = "form-data; filename=\"x.txt\"";
        assert_eq!(param_value(header, "name"), None);
        assert_eq!(param_value(header, "filename").as_deref(), Some("x.txt"));
    }

    #[test]
    fn binary_body_with_crlf_bytes() {
        let content = b"line1\r\nline2\r\n\r\nline3";
        let body = body_with("B", &[("name=\"f\"; filename=\"f.bin\"", content)]);
        let parts = parse_multipart(&body, "B").unwrap();
        assert_eq!(parts[0].body, content);
    }

    #[test]
    fn missing_closing_delimiter_keeps_last_part() {
        let mut body = body_with("B", &[("name=\"f\"; filename=\"f.txt\"", b"data")]);
        // Strip the closing delimiter line.
        let closing = body.len() - "--B--\r\n".len();
        body.truncate(closing);
        let parts = parse_multipart(&body, "B").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"data");
    }

    #[test]
    fn part_content_type_is_captured() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--B\r\n");
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"f\"; filename=\"p.png\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(b"PNGDATA\r\n--B--\r\n");
        let parts = parse_multipart(&body, "B").unwrap();
        assert_eq!(parts[0].headers.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn empty_body_is_truncated() {
        assert_eq!(parse_multipart(b"", "B"), Err(MultipartError::Truncated));
    }
}
