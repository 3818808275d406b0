//! Sidecar metadata for code files.
//!
//! A code file can carry a link to an externally hosted copy of itself (a
//! GitHub gist) through a sidecar text file with the same stem:
//!
//! ```text
//! Arrays/
//! ├── two_sum_easy.dart
//! └── two_sum_easy.txt      # https://gist.github.com/someone/abc123
//! ```
//!
//! The last path segment of the URL (`abc123`) is the external reference id
//! used to embed the gist next to the rendered source.
//!
//! Both the tree builder and the renderer resolve ids through
//! [`resolve_external_ref`] so the two never disagree.

use crate::tree::ContentError;
use std::io;
use std::path::Path;

/// Read the sidecar file of `file` with the given extension.
///
/// Returns `Ok(None)` when no sidecar exists and the trimmed contents
/// otherwise. Any other read failure is an error.
pub fn read_sidecar(file: &Path, extension: &str) -> Result<Option<String>, ContentError> {
    let sidecar = file.with_extension(extension);
    match std::fs::read_to_string(&sidecar) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ContentError::from_io(&sidecar, e)),
    }
}

/// Extract the final path segment of a URL.
///
/// - `https://gist.github.com/user/abc123` → `abc123`
/// - `https://gist.github.com/user/abc123/` → `abc123`
/// - `https://gist.github.com/user/abc123#file-x` → `abc123`
///
/// Returns `None` for empty input, a URL with no path (`https://host/`), or a
/// segment containing whitespace (which means the file held something other
/// than a single URL). Input without a scheme is taken as a bare id or path.
pub fn external_ref_id(url: &str) -> Option<String> {
    let url = url.trim();
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_suffix.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => without_suffix,
    };
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() || segment.contains(char::is_whitespace) {
        return None;
    }
    Some(segment.to_string())
}

/// Resolve the external reference id of a code file from its sidecar.
///
/// - No sidecar → `Ok(None)`
/// - Sidecar that isn't a single URL → `Err(MalformedMetadata)`
pub fn resolve_external_ref(file: &Path, extension: &str) -> Result<Option<String>, ContentError> {
    let Some(url) = read_sidecar(file, extension)? else {
        return Ok(None);
    };
    external_ref_id(&url)
        .map(Some)
        .ok_or_else(|| ContentError::MalformedMetadata(file.with_extension(extension)))
}
