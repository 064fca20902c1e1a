use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

const MAX_SEGMENT_LEN: usize = 255;
const INVALID_CHARS: &[char] = &['\0', '\n', '\r'];

/// Resolves a caller-supplied relative path against `root`.
///
/// The path is normalized lexically: `.` segments and repeated or leading
/// slashes are dropped and `..` pops the previous segment. Popping past
/// `root` is a traversal error. An empty path resolves to `root` itself.
/// The result is always `root` or a component-wise descendant of it.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf> {
    if relative.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::BadRequest(
            "Path contains invalid characters".to_string(),
        ));
    }

    let mut segments: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => {
                if segment.len() > MAX_SEGMENT_LEN {
                    return Err(Error::BadRequest(format!(
                        "Path segment cannot exceed {MAX_SEGMENT_LEN} characters"
                    )));
                }
                segments.push(segment);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(Error::PathTraversal);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(Error::PathTraversal),
        }
    }

    let resolved: PathBuf = segments.iter().fold(root.to_path_buf(), |p, s| p.join(s));

    if !resolved.starts_with(root) {
        return Err(Error::PathTraversal);
    }

    Ok(resolved)
}

/// Validates a single file name as supplied with an upload.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest("File name cannot be empty".to_string()));
    }
    if name.len() > MAX_SEGMENT_LEN {
        return Err(Error::BadRequest(format!(
            "File name cannot exceed {MAX_SEGMENT_LEN} characters"
        )));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::PathTraversal);
    }
    if name.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::BadRequest(
            "File name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
