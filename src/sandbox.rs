//! Path allow-list enforced at every boundary that accepts a folder path.
//!
//! A submitted path is accepted only if it resolves under the configured
//! sandbox root. Resolution is lexical first (`.`/`..` folded, relative
//! paths joined onto a base directory) so traversal attempts are rejected
//! before anything touches the filesystem. When the target exists, its
//! canonical form must also stay under the canonical root, which closes
//! symlink escapes.

use std::path::{Component, Path, PathBuf};

use crate::error::ValidationError;

#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Root as configured, used in error messages.
    label: String,
    root: PathBuf,
    base: PathBuf,
}

impl Sandbox {
    /// Sandbox whose relative paths resolve against the working directory.
    pub fn new(root: &Path) -> Self {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::with_base(root, &base)
    }

    pub fn with_base(root: &Path, base: &Path) -> Self {
        Self {
            label: root.display().to_string(),
            root: resolve(base, root),
            base: base.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a raw path string and return its resolved absolute form.
    pub fn check(&self, raw: &str) -> Result<PathBuf, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyPath);
        }

        let candidate = resolve(&self.base, Path::new(&raw.replace('\\', "/")));
        if !candidate.starts_with(&self.root) {
            return Err(self.outside());
        }

        if let (Ok(real_root), Ok(real_candidate)) =
            (self.root.canonicalize(), candidate.canonicalize())
        {
            if !real_candidate.starts_with(&real_root) {
                return Err(self.outside());
            }
        }

        Ok(candidate)
    }

    fn outside(&self) -> ValidationError {
        ValidationError::OutsideSandbox {
            root: self.label.clone(),
        }
    }
}

/// Shorthand for `Sandbox::new(root).check(raw)`.
pub fn validate_path_request(raw: &str, root: &Path) -> Result<PathBuf, ValidationError> {
    Sandbox::new(root).check(raw)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize_lexically(&joined)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, so `/..` stays `/`.
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox(base: &Path) -> Sandbox {
        Sandbox::with_base(Path::new("./test-data"), base)
    }

    #[test]
    fn accepts_paths_under_root() {
        let base = Path::new("/srv/app");
        let sb = sandbox(base);
        assert_eq!(sb.check("test-data").unwrap(), PathBuf::from("/srv/app/test-data"));
        assert_eq!(
            sb.check("./test-data/q1").unwrap(),
            PathBuf::from("/srv/app/test-data/q1")
        );
        assert_eq!(
            sb.check("/srv/app/test-data/q1/../q2").unwrap(),
            PathBuf::from("/srv/app/test-data/q2")
        );
    }

    #[test]
    fn backslashes_are_normalized() {
        let sb = sandbox(Path::new("/srv/app"));
        assert_eq!(
            sb.check(r".\test-data\q1").unwrap(),
            PathBuf::from("/srv/app/test-data/q1")
        );
    }

    #[test]
    fn traversal_is_rejected() {
        let sb = sandbox(Path::new("/srv/app"));
        for raw in ["../../etc", "test-data/../../etc", "/etc", "./test-data-evil", "."] {
            let err = sb.check(raw).unwrap_err();
            assert_eq!(
                err,
                ValidationError::OutsideSandbox {
                    root: "./test-data".into()
                },
                "{}",
                raw
            );
            assert!(err.to_string().contains("sandbox"));
        }
    }

    #[test]
    fn empty_path_is_rejected() {
        let sb = sandbox(Path::new("/srv/app"));
        assert_eq!(sb.check("").unwrap_err(), ValidationError::EmptyPath);
        assert_eq!(sb.check("   ").unwrap_err(), ValidationError::EmptyPath);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("test-data");
        let outside = tmp.path().join("secret");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let sb = Sandbox::with_base(&root, tmp.path());
        assert!(sb.check(&root.join("link").display().to_string()).is_err());

        std::fs::create_dir_all(root.join("real")).unwrap();
        assert!(sb.check(&root.join("real").display().to_string()).is_ok());
    }
}
