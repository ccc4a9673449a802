//! Upload validation and persistence.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::schema::UploadConfig;
use crate::upload::multipart::{boundary_from_content_type, parse_multipart, MultipartError};

/// Why a part was refused. Ordered: size, then filename, then extension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("file too large: {size} bytes exceeds limit of {max}")]
    FileTooLarge { size: u64, max: u64 },

    #[error("empty or invalid filename")]
    EmptyFilename,

    #[error("file type not allowed: .{extension}")]
    UnsafeExtension { extension: String },
}

/// Result of processing one upload request.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// All file parts validated and persisted.
    Accepted { filenames: Vec<String> },
    /// A part failed validation; parts persisted before it remain.
    Rejected(UploadRejection),
    /// The body parsed but contained no usable file part.
    NoValidFiles,
}

/// Failures that are the server's fault, not the client's.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("failed to persist upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates multipart file parts and writes them to disk.
#[derive(Debug)]
pub struct UploadIngestor {
    max_upload_bytes: u64,
    blocked_extensions: BTreeSet<String>,
}

impl UploadIngestor {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            blocked_extensions: config
                .blocked_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Process one upload request body. Parts without a filename are
    /// ignored; each file part is validated in order (size, filename,
    /// extension) and persisted on acceptance. The first rejection
    /// aborts the batch without removing already-persisted files.
    pub async fn ingest(
        &self,
        content_type: &str,
        body: &[u8],
        target_dir: &Path,
    ) -> Result<UploadOutcome, IngestError> {
        let boundary = boundary_from_content_type(content_type)?;
        let parts = parse_multipart(body, &boundary)?;

        let mut accepted = Vec::new();
        for part in parts {
            let Some(raw_name) = part.headers.filename.as_deref() else {
                continue;
            };

            let size = part.body.len() as u64;
            if size >= self.max_upload_bytes {
                return Ok(UploadOutcome::Rejected(UploadRejection::FileTooLarge {
                    size,
                    max: self.max_upload_bytes,
                }));
            }

            let Some(filename) = sanitize_filename(raw_name) else {
                return Ok(UploadOutcome::Rejected(UploadRejection::EmptyFilename));
            };

            if let Some(extension) = blocked_extension(&filename, &self.blocked_extensions) {
                return Ok(UploadOutcome::Rejected(UploadRejection::UnsafeExtension {
                    extension,
                }));
            }

            tokio::fs::write(target_dir.join(&filename), &part.body).await?;
            tracing::info!(filename = %filename, bytes = size, "upload accepted");
            accepted.push(filename);
        }

        if accepted.is_empty() {
            Ok(UploadOutcome::NoValidFiles)
        } else {
            Ok(UploadOutcome::Accepted {
                filenames: accepted,
            })
        }
    }
}

/// Reduce a client-supplied filename to a bare basename. Path
/// separators from either platform are stripped; an empty or dot-only
/// result is unusable.
fn sanitize_filename(raw: &str) -> Option<String> {
    let basename = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    if basename.is_empty() || basename == "." || basename == ".." {
        return None;
    }
    Some(basename.to_string())
}

fn blocked_extension(filename: &str, blocked: &BTreeSet<String>) -> Option<String> {
    let (stem, extension) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let extension = extension.to_ascii_lowercase();
    blocked.contains(&extension).then_some(extension)
}
