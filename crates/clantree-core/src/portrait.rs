//! Portrait path normalisation for the renderer boundary.

const PASSTHROUGH_PREFIXES: [&str; 3] = ["http", "data:", "file:"];

/// Turn a stored portrait path into something a renderer can load.
///
/// - network, data and file URLs are returned unchanged
/// - backslashes become forward slashes
/// - `C:/...` style paths become `file:///C:/...`
/// - everything else becomes `file://<path>`
///
/// Returns `None` for an empty or whitespace-only path.
pub fn normalize_portrait_path(path: &str) -> Option<String> {
    if path.trim().is_empty() {
        return None;
    }
    if PASSTHROUGH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        return Some(path.to_string());
    }

    let normalized = path.replace('\\', "/");
    if has_drive_letter(&normalized) {
        Some(format!("file:///{normalized}"))
    } else {
        Some(format!("file://{normalized}"))
    }
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
