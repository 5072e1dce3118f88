//! Path existence check and touch.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::debug;

use crate::spec::{EnumFsOperation, FsError, MODE_DIR_DEFAULT};
use crate::util::{create_dir_all_with_mode, resolve_parent};

/// Report whether `path` exists.
///
/// Symlinks are followed, so a dangling link reports `false`. Only a
/// not-found stat result maps to `Ok(false)`; every other failure is
/// returned.
pub fn path_exists<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FsError::io_failure(path, EnumFsOperation::Stat, e)),
    }
}

/// Create `path` if absent, creating missing parent directories with mode
/// `0o755`.
///
/// An existing file keeps its content; its access and modification times
/// are set to now. A directory at `path` is an open failure.
pub fn touch<P: AsRef<Path>>(path: P) -> Result<(), FsError> {
    let path = path.as_ref();
    create_dir_all_with_mode(&resolve_parent(path), MODE_DIR_DEFAULT)?;

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| FsError::io_failure(path, EnumFsOperation::OpenDestination, e))?;
    let file_time_now = FileTime::now();
    filetime::set_file_handle_times(&file, Some(file_time_now), Some(file_time_now))
        .map_err(|e| FsError::io_failure(path, EnumFsOperation::SetTimes, e))?;
    debug!(path = %path.display(), "touched file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use filetime::FileTime;

    use super::{path_exists, touch};
    use crate::spec::{EnumFsOperation, FsError};

    #[test]
    fn path_exists_reports_files_and_dirs() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "x").expect("write");

        assert!(path_exists(tmp.path()).expect("dir"));
        assert!(path_exists(&path_file).expect("file"));
        assert!(!path_exists(tmp.path().join("missing")).expect("missing"));
        assert!(!path_exists(tmp.path().join("missing/deeper")).expect("missing parent"));
    }

    #[cfg(unix)]
    #[test]
    fn path_exists_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "x").expect("write");
        symlink(&path_file, tmp.path().join("good")).expect("symlink");
        symlink(tmp.path().join("gone"), tmp.path().join("dangling")).expect("symlink");

        assert!(path_exists(tmp.path().join("good")).expect("good link"));
        assert!(!path_exists(tmp.path().join("dangling")).expect("dangling link"));
    }

    #[cfg(unix)]
    #[test]
    fn path_exists_propagates_non_not_found_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "x").expect("write");

        // A regular file used as a directory component fails with ENOTDIR.
        let err = path_exists(path_file.join("child")).expect_err("must fail");
        assert!(matches!(
            err,
            FsError::IoFailure {
                operation: EnumFsOperation::Stat,
                ..
            }
        ));
    }

    #[test]
    fn touch_creates_parents_and_empty_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("a/b/c/file.ext");

        touch(&path_file).expect("touch");
        assert!(tmp.path().join("a").is_dir());
        assert!(tmp.path().join("a/b").is_dir());
        assert!(tmp.path().join("a/b/c").is_dir());
        assert_eq!(std::fs::metadata(&path_file).expect("metadata").len(), 0);

        touch(&path_file).expect("touch again");
        assert_eq!(std::fs::metadata(&path_file).expect("metadata").len(), 0);
    }

    #[test]
    fn touch_keeps_content_and_refreshes_mtime() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "keep me").expect("write");
        let file_time_old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_times(&path_file, file_time_old, file_time_old).expect("set times");

        touch(&path_file).expect("touch");
        let meta = std::fs::metadata(&path_file).expect("metadata");
        assert_eq!(std::fs::read_to_string(&path_file).expect("read"), "keep me");
        assert!(FileTime::from_last_modification_time(&meta) > file_time_old);
    }

    #[cfg(unix)]
    #[test]
    fn touch_creates_parents_with_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        touch(tmp.path().join("made/file")).expect("touch");
        let mode = std::fs::metadata(tmp.path().join("made"))
            .expect("metadata")
            .permissions()
            .mode();
        // Requested 0o755; umask can only remove bits.
        assert_eq!(mode & !0o755 & 0o777, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[test]
    fn touch_on_directory_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("dir");
        std::fs::create_dir_all(&path_dir).expect("mkdir");

        let err = touch(&path_dir).expect_err("must fail");
        assert!(matches!(
            err,
            FsError::IoFailure {
                operation: EnumFsOperation::OpenDestination,
                ..
            }
        ));
        assert!(path_dir.is_dir());
    }

    #[test]
    fn touch_under_regular_file_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "x").expect("write");

        let err = touch(path_file.join("child.txt")).expect_err("must fail");
        assert!(matches!(
            err,
            FsError::IoFailure {
                operation: EnumFsOperation::CreateDir,
                ..
            }
        ));
    }
}
