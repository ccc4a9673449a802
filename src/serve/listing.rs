//! Directory listing HTML.

use std::path::Path;
use std::time::SystemTime;

/// One renderable directory entry.
struct Entry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: Option<SystemTime>,
}

/// Render a directory as a minimal HTML page: parent link, upload form,
/// then entries with sizes and modification times. Entries whose
/// extension is hidden are skipped; dotfiles are listed as-is.
pub fn render_directory(
    fs_path: &Path,
    uri_path: &str,
    hidden_extensions: &[String],
) -> Result<String, std::io::Error> {
    let mut entries = Vec::new();
    for dirent in std::fs::read_dir(fs_path)? {
        let dirent = dirent?;
        let name = dirent.file_name().to_string_lossy().into_owned();
        let metadata = dirent.metadata()?;
        if !metadata.is_dir() && is_hidden(&name, hidden_extensions) {
            continue;
        }
        entries.push(Entry {
            name,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        });
    }

    // Directories first, then case-insensitive by name.
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let title = html_escape(uri_path);
    let mut page = String::with_capacity(1024 + entries.len() * 128);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    page.push_str(&format!("<meta charset=\"utf-8\">\n<title>Index of {title}</title>\n"));
    page.push_str("</head>\n<body>\n");
    page.push_str(&format!("<h1>Index of {title}</h1>\n"));
    page.push_str(
        "<form method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"files[]\" multiple>\n\
         <input type=\"submit\" value=\"Upload\">\n\
         </form>\n<hr>\n<ul>\n",
    );

    if uri_path != "/" {
        page.push_str("<li><a href=\"../\">../</a></li>\n");
    }

    for entry in &entries {
        let mut href = urlencoding::encode(&entry.name).into_owned();
        let mut label = html_escape(&entry.name);
        if entry.is_dir {
            href.push('/');
            label.push('/');
        }
        let detail = if entry.is_dir {
            String::new()
        } else {
            format!(" ({})", format_size(entry.size))
        };
        let mtime = entry
            .modified
            .map(|t| format!(" - {}", httpdate::fmt_http_date(t)))
            .unwrap_or_default();
        page.push_str(&format!(
            "<li><a href=\"{href}\">{label}</a>{detail}{mtime}</li>\n"
        ));
    }

    page.push_str("</ul>\n</body>\n</html>\n");
    Ok(page)
}

fn is_hidden(name: &str, hidden_extensions: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            hidden_extensions.iter().any(|h| h == &ext)
        }
        _ => false,
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

fn html_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_names() {
        assert_eq!(
            html_escape("<script>\"x\"&'y'</script>"),
            "&lt;script&gt;&quot;x&quot;&amp;&#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn hidden_extension_matching() {
        let hidden = vec!["lnk".to_string(), "db".to_string()];
        assert!(is_hidden("shortcut.LNK", &hidden));
        assert!(is_hidden("Thumbs.db", &hidden));
        assert!(!is_hidden("report.pdf", &hidden));
        // A dotfile has no extension of its own.
        assert!(!is_hidden(".db", &hidden));
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn renders_listing_with_upload_form() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("skip.lnk"), b"x").unwrap();

        let hidden = vec!["lnk".to_string()];
        let html = render_directory(dir.path(), "/files/", &hidden).unwrap();

        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("a.txt"));
        assert!(html.contains("sub/"));
        assert!(!html.contains("skip.lnk"));
        assert!(html.contains("<a href=\"../\">"));
        // Directories sort before files.
        assert!(html.find("sub/").unwrap() < html.find("a.txt").unwrap());
    }

    #[test]
    fn root_listing_has_no_parent_link() {
        let dir = tempfile::tempdir().unwrap();
        let html = render_directory(dir.path(), "/", &[]).unwrap();
        assert!(!html.contains("../"));
    }
}
