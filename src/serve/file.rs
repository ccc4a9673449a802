//! File and directory responses.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use futures_util::TryStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::config::schema::ServeConfig;
use crate::http::error::ApiError;
use crate::serve::listing::render_directory;
use crate::serve::mime::content_type_for;
use crate::serve::range::parse_range;

/// Streaming chunk size for file bodies.
const STREAM_CHUNK_BYTES: usize = 64 * 1024;

/// Maps request paths onto a confined directory tree and builds file,
/// listing, and range responses.
#[derive(Debug)]
pub struct FileServer {
    root: PathBuf,
    index_files: Vec<String>,
    hidden_extensions: Vec<String>,
    mime_overrides: std::collections::BTreeMap<String, String>,
}

impl FileServer {
    pub fn new(config: &ServeConfig) -> std::io::Result<Self> {
        Ok(Self {
            root: config.root_dir.canonicalize()?,
            index_files: config.index_files.clone(),
            hidden_extensions: config.hidden_extensions.clone(),
            mime_overrides: config.mime_overrides.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a filesystem path under the root. Rejects
    /// any path containing a `..` segment after percent-decoding;
    /// confinement is lexical, nothing outside the root is ever stat'd.
    pub fn resolve(&self, uri_path: &str) -> Result<PathBuf, ApiError> {
        let decoded = urlencoding::decode(uri_path)
            .map_err(|_| ApiError::BadRequest("invalid path encoding".to_string()))?;

        let mut resolved = self.root.clone();
        for segment in decoded.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            // Catch both a literal ".." segment and anything Path would
            // still treat as a parent or root component.
            if segment == ".."
                || Path::new(segment)
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(ApiError::BadRequest("invalid path".to_string()));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }

    /// Build the response for a GET request.
    pub async fn serve(&self, uri_path: &str, headers: &HeaderMap) -> Result<Response, ApiError> {
        let fs_path = self.resolve(uri_path)?;

        let metadata = match tokio::fs::metadata(&fs_path).await {
            Ok(m) => m,
            Err(_) => return Err(ApiError::NotFound),
        };

        if metadata.is_dir() {
            if !uri_path.ends_with('/') {
                // Redirect so relative links in the listing resolve.
                let location = format!("{uri_path}/");
                return Ok((
                    StatusCode::MOVED_PERMANENTLY,
                    [(header::LOCATION, location)],
                )
                    .into_response());
            }
            for index in &self.index_files {
                let candidate = fs_path.join(index);
                if tokio::fs::metadata(&candidate)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false)
                {
                    return self.serve_file(&candidate, headers).await;
                }
            }
            let decoded = urlencoding::decode(uri_path)
                .map_err(|_| ApiError::BadRequest("invalid path encoding".to_string()))?;
            let html = render_directory(&fs_path, &decoded, &self.hidden_extensions)
                .map_err(|e| ApiError::Internal(format!("failed to list directory: {e}")))?;
            return Ok(Html(html).into_response());
        }

        self.serve_file(&fs_path, headers).await
    }

    async fn serve_file(&self, path: &Path, headers: &HeaderMap) -> Result<Response, ApiError> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(f) => f,
            Err(_) => return Err(ApiError::NotFound),
        };
        let metadata = file
            .metadata()
            .await
            .map_err(|e| ApiError::Internal(format!("failed to stat file: {e}")))?;
        let size = metadata.len();
        let content_type = content_type_for(path, &self.mime_overrides);
        let last_modified = metadata.modified().ok().map(httpdate::fmt_http_date);

        let range_header = match headers.get(header::RANGE) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::MalformedRange("non-ASCII range header".to_string()))?,
            ),
            None => None,
        };

        let mut builder = Response::builder()
            .header(header::CONTENT_TYPE, content_type.as_str())
            .header(header::ACCEPT_RANGES, "bytes");
        if let Some(modified) = &last_modified {
            builder = builder.header(header::LAST_MODIFIED, modified.as_str());
        }

        let response = match range_header {
            None => builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size)
                .body(stream_body(file, path)),
            Some(raw) => {
                let range = parse_range(raw)?.resolve(size)?;
                file.seek(SeekFrom::Start(range.first))
                    .await
                    .map_err(|e| ApiError::Internal(format!("seek failed: {e}")))?;
                builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{}", range.first, range.last, size),
                    )
                    .header(header::CONTENT_LENGTH, range.len())
                    .body(stream_body(file.take(range.len()), path))
            }
        };

        response.map_err(|e| ApiError::Internal(format!("failed to build response: {e}")))
    }
}

/// Chunked body over a reader. A read failure mid-transfer is logged
/// before the copy stops; the client sees a truncated body.
fn stream_body<R>(reader: R, path: &Path) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let name = path.display().to_string();
    let stream = ReaderStream::with_capacity(reader, STREAM_CHUNK_BYTES)
        .inspect_err(move |err| tracing::warn!(path = %name, %err, "file stream failed mid-transfer"));
    Body::from_stream(stream)
}
