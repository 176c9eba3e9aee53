use crate::VfsError;

/// Normalize an asset path into its canonical spelling.
///
/// Separators become single forward slashes (backslashes included), `.`
/// segments and leading/trailing slashes disappear, and `..` is rejected so
/// a path can never climb out of its source. Empty results are rejected
/// too.
///
/// Resource caches key entries by the normalized form, so every spelling of
/// the same asset resolves to one cache entry.
pub fn normalize(path: &str) -> Result<String, VfsError> {
    let mut canonical = String::with_capacity(path.len());
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(VfsError::InvalidPath(format!(
                    "'{path}' climbs out of its source"
                )));
            }
            _ => {
                if !canonical.is_empty() {
                    canonical.push('/');
                }
                canonical.push_str(segment);
            }
        }
    }
    if canonical.is_empty() {
        return Err(VfsError::InvalidPath(format!("'{path}' names nothing")));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_paths_pass_through() {
        assert_eq!(
            normalize("textures/brick.png").unwrap(),
            "textures/brick.png"
        );
        assert_eq!(normalize("file.txt").unwrap(), "file.txt");
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(normalize("/textures/brick.png").unwrap(), "textures/brick.png");
        assert_eq!(normalize("textures///brick.png").unwrap(), "textures/brick.png");
        assert_eq!(normalize("textures/").unwrap(), "textures");
        assert_eq!(normalize("textures\\brick.png").unwrap(), "textures/brick.png");
    }

    #[test]
    fn dot_segments_disappear() {
        assert_eq!(
            normalize("./textures/./brick.png").unwrap(),
            "textures/brick.png"
        );
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(normalize("textures/../secret.txt").is_err());
        assert!(normalize("..").is_err());
    }

    #[test]
    fn nothing_left_is_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("///").is_err());
        assert!(normalize("././.").is_err());
    }

    #[test]
    fn spellings_collapse_to_one_identity() {
        let a = normalize("a//b.png").unwrap();
        let b = normalize("./a/b.png").unwrap();
        let c = normalize("a\\b.png").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
