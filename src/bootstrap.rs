use std::path::{Path, PathBuf};

use crate::error::{PipeError, Result};

/// Create `dir` if it does not exist yet. Parents are never created:
/// a missing parent is reported as an error.
///
/// # Returns
///
/// `true` if the directory was created by this call.
///
/// # Example
///
/// ``` rust, ignore
/// ensure_dir(Path::new("/data/qorts/brain_s1_qorts"))?;
/// ```
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }

    match std::fs::create_dir(dir) {
        Ok(()) => {
            log::debug!("DEBUG [BOOTSTRAP]: created {}", dir.display());
            Ok(true)
        }
        // INFO: lost a race against another creator, same end state
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(false),
        Err(e) => Err(PipeError::io(e, dir)),
    }
}

/// Create every missing directory in `dirs`.
///
/// # Returns
///
/// How many directories were created.
pub fn ensure_dirs(dirs: &[PathBuf]) -> Result<usize> {
    let mut created = 0;

    for dir in dirs {
        if ensure_dir(dir)? {
            created += 1;
        }
    }

    if created > 0 {
        log::info!(
            "INFO [BOOTSTRAP]: created {} of {} per-sample directories",
            created,
            dirs.len()
        );
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let dirs = vec![
            root.path().join("brain_s1_qorts"),
            root.path().join("liver_s2_qorts"),
        ];

        assert_eq!(ensure_dirs(&dirs).unwrap(), 2);
        assert_eq!(ensure_dirs(&dirs).unwrap(), 0);
        assert!(dirs.iter().all(|d| d.is_dir()));
    }

    #[test]
    fn parents_are_not_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("missing").join("brain_s1");

        assert!(matches!(ensure_dir(&nested), Err(PipeError::Io { .. })));
        assert!(!root.path().join("missing").exists());
    }

    #[test]
    fn existing_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("brain_s1");
        std::fs::write(&file, "").unwrap();

        assert!(ensure_dir(&file).is_err());
    }
}
