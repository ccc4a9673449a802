//! Content-Type selection.

use std::collections::BTreeMap;
use std::path::Path;

/// Pick a Content-Type for a path: config overrides win, then the
/// built-in table, then `application/octet-stream`.
pub fn content_type_for(path: &Path, overrides: &BTreeMap<String, String>) -> String {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if let Some(mime) = overrides.get(&ext.to_ascii_lowercase()) {
            return mime.clone();
        }
    }
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
