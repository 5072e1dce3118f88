use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io;
use std::path::{Path, PathBuf};

use crate::spec::{EnumFsOperation, FsError};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// What currently occupies a destination path, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumDestinationKind {
    Missing,
    Directory,
    File,
    Symlink,
    Other,
}

pub(crate) fn inspect_destination(path_dst: &Path) -> Result<EnumDestinationKind, FsError> {
    match fs::symlink_metadata(path_dst) {
        Ok(meta_dst) => {
            let cfg_file_type = meta_dst.file_type();
            if cfg_file_type.is_symlink() {
                Ok(EnumDestinationKind::Symlink)
            } else if cfg_file_type.is_dir() {
                Ok(EnumDestinationKind::Directory)
            } else if cfg_file_type.is_file() {
                Ok(EnumDestinationKind::File)
            } else {
                Ok(EnumDestinationKind::Other)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EnumDestinationKind::Missing),
        Err(e) => Err(FsError::io_failure(
            path_dst,
            EnumFsOperation::StatDestination,
            e,
        )),
    }
}

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonical form of `path`; missing trailing components are appended to
/// the canonical form of their deepest existing ancestor.
fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    match path.file_name() {
        Some(name) => _normalize_path(&resolve_parent(path)).join(name),
        None => _absolutize_path(path),
    }
}

/// Normalized `(source, destination)` when one contains the other or both
/// name the same entry.
pub(crate) fn find_overlap(path_src: &Path, path_dst: &Path) -> Option<(PathBuf, PathBuf)> {
    let path_src_resolved = _normalize_path(path_src);
    let path_dst_resolved = _normalize_path(path_dst);
    if path_dst_resolved.starts_with(&path_src_resolved)
        || path_src_resolved.starts_with(&path_dst_resolved)
    {
        return Some((path_src_resolved, path_dst_resolved));
    }
    None
}

/// Parent directory of `path`, with a bare file name resolving to `.`.
pub(crate) fn resolve_parent(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Permissions

#[cfg(unix)]
pub(crate) fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub(crate) fn mode_of(_meta: &Metadata) -> u32 {
    crate::spec::MODE_DIR_DEFAULT
}

/// Create `path` and any missing ancestors, requesting `mode` for each.
///
/// The process umask still applies; callers needing exact bits follow up
/// with [`apply_permissions`].
pub(crate) fn create_dir_all_with_mode(path: &Path, mode: u32) -> Result<(), FsError> {
    #[cfg(unix)]
    let res_create = {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)
    };
    #[cfg(not(unix))]
    let res_create = {
        let _ = mode;
        fs::create_dir_all(path)
    };
    res_create.map_err(|e| FsError::io_failure(path, EnumFsOperation::CreateDir, e))
}

/// Set exactly `mode` on `path`.
pub(crate) fn apply_mode(path: &Path, mode: u32) -> Result<(), FsError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        apply_permissions(path, Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}

pub(crate) fn apply_permissions(path: &Path, permissions: Permissions) -> Result<(), FsError> {
    fs::set_permissions(path, permissions)
        .map_err(|e| FsError::io_failure(path, EnumFsOperation::SetPermissions, e))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileStreaming

fn open_destination(path_dst: &Path, meta_src: &Metadata, if_overwrite: bool) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true);
    if if_overwrite {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode_of(meta_src));
    }
    #[cfg(not(unix))]
    {
        let _ = meta_src;
    }
    opts.open(path_dst)
}

/// Stream `path_src` into `path_dst` and stamp the source permissions on it.
///
/// Returns the number of bytes written. Both handles are dropped before
/// returning, on success and on every error path.
pub(crate) fn stream_file(
    path_src: &Path,
    path_dst: &Path,
    meta_src: &Metadata,
    if_overwrite: bool,
) -> Result<u64, FsError> {
    let mut file_src = File::open(path_src)
        .map_err(|e| FsError::io_failure(path_src, EnumFsOperation::OpenSource, e))?;
    let mut file_dst = open_destination(path_dst, meta_src, if_overwrite).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            FsError::AlreadyExists {
                path: path_dst.to_path_buf(),
                source: e,
            }
        } else {
            FsError::io_failure(path_dst, EnumFsOperation::OpenDestination, e)
        }
    })?;

    let n_bytes = io::copy(&mut file_src, &mut file_dst)
        .map_err(|e| FsError::io_failure(path_dst, EnumFsOperation::Stream, e))?;
    file_dst
        .set_permissions(meta_src.permissions())
        .map_err(|e| FsError::io_failure(path_dst, EnumFsOperation::SetPermissions, e))?;
    Ok(n_bytes)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{EnumDestinationKind, find_overlap, inspect_destination, resolve_parent};

    #[test]
    fn resolve_parent_handles_bare_names() {
        assert_eq!(resolve_parent(Path::new("file.txt")), PathBuf::from("."));
        assert_eq!(resolve_parent(Path::new("a/b/file.txt")), PathBuf::from("a/b"));
        assert_eq!(resolve_parent(Path::new("/")), PathBuf::from("."));
    }

    #[test]
    fn find_overlap_detects_nesting_and_identity() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir src");
        std::fs::write(src.join("f.txt"), "x").expect("write");

        assert!(find_overlap(&src, &src.join("out/deeper")).is_some());
        assert!(find_overlap(&src, tmp.path()).is_some());
        assert!(find_overlap(&src.join("f.txt"), &src.join("f.txt")).is_some());
        assert!(find_overlap(&src.join("f.txt"), &src.join("./f.txt")).is_some());
        assert!(find_overlap(&src.join("f.txt"), &src.join("g.txt")).is_none());
        assert!(find_overlap(&src, &tmp.path().join("src2")).is_none());
    }

    #[test]
    fn inspect_destination_classifies_entries() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        std::fs::write(&path_file, "x").expect("write");

        assert_eq!(
            inspect_destination(tmp.path()).expect("inspect dir"),
            EnumDestinationKind::Directory
        );
        assert_eq!(
            inspect_destination(&path_file).expect("inspect file"),
            EnumDestinationKind::File
        );
        assert_eq!(
            inspect_destination(&tmp.path().join("missing")).expect("inspect missing"),
            EnumDestinationKind::Missing
        );

        #[cfg(unix)]
        {
            let path_link = tmp.path().join("link");
            std::os::unix::fs::symlink(&path_file, &path_link).expect("symlink");
            assert_eq!(
                inspect_destination(&path_link).expect("inspect link"),
                EnumDestinationKind::Symlink
            );
        }
    }
}
