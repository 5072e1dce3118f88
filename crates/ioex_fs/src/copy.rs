//! Recursive file/directory copy.

use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use tracing::{debug, trace};

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{EnumFsOperation, FsError, SpecCopyOptions};
use crate::util::{
    EnumDestinationKind, apply_mode, apply_permissions, create_dir_all_with_mode, find_overlap,
    inspect_destination, mode_of, resolve_parent, stream_file,
};

#[derive(Debug)]
struct SpecCopyContext<'a> {
    spec_cp_options: &'a SpecCopyOptions,
    builder_cp_report: ReportCopyBuilder,
}

/// Copy `source` to `destination`, recursing into directories.
///
/// - A file source is copied to `destination`; missing parents are created
///   with the mode of the source's parent directory.
/// - A directory source is mirrored into `destination`, creating it if
///   needed and merging into it if it already is a directory. Children are
///   visited in name order.
/// - Symbolic links are never followed or copied. A symlink source (at any
///   depth) is a silent no-op.
/// - With `overwrite == false` the first destination file that already
///   exists aborts the call with [`FsError::AlreadyExists`].
/// - Permission bits of copied files and created directories match the
///   source.
///
/// Source and destination that are the same entry, or where one contains
/// the other, are rejected with [`FsError::SourceDestinationOverlap`] before
/// anything is written.
///
/// The first failure is returned as-is; files copied before it are left in
/// place.
pub fn copy_tree<P, Q>(destination: P, source: Q, overwrite: bool) -> Result<ReportCopy, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_tree_with_options(
        destination,
        source,
        &SpecCopyOptions::from_overwrite(overwrite),
    )
}

/// [`copy_tree`] driven by a full [`SpecCopyOptions`].
pub fn copy_tree_with_options<P, Q>(
    destination: P,
    source: Q,
    spec_cp_options: &SpecCopyOptions,
) -> Result<ReportCopy, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dst = destination.as_ref();
    let path_src = source.as_ref();
    let mut spec_cp_ctx = SpecCopyContext {
        spec_cp_options,
        builder_cp_report: ReportCopyBuilder::default(),
    };

    let meta_src = stat_source(path_src)?;
    if !meta_src.file_type().is_symlink() {
        reject_overlap(path_src, path_dst)?;
    }
    copy_stat_entry(path_dst, path_src, &meta_src, &mut spec_cp_ctx)?;
    Ok(spec_cp_ctx.builder_cp_report.build())
}

/// Copy a single file `source` to `destination`.
///
/// Symlinks are skipped and succeed. Directories are rejected with
/// [`FsError::SourceIsDirectory`].
pub fn copy_file<P, Q>(destination: P, source: Q, overwrite: bool) -> Result<ReportCopy, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dst = destination.as_ref();
    let path_src = source.as_ref();
    let spec_cp_options = SpecCopyOptions::from_overwrite(overwrite);
    let mut spec_cp_ctx = SpecCopyContext {
        spec_cp_options: &spec_cp_options,
        builder_cp_report: ReportCopyBuilder::default(),
    };

    let meta_src = stat_source(path_src)?;
    if meta_src.file_type().is_symlink() {
        skip_symlink(path_src, &mut spec_cp_ctx);
    } else if meta_src.is_dir() {
        return Err(FsError::SourceIsDirectory {
            path: path_src.to_path_buf(),
        });
    } else {
        reject_overlap(path_src, path_dst)?;
        copy_regular_file(path_dst, path_src, &meta_src, &mut spec_cp_ctx)?;
    }
    Ok(spec_cp_ctx.builder_cp_report.build())
}

fn reject_overlap(path_src: &Path, path_dst: &Path) -> Result<(), FsError> {
    match find_overlap(path_src, path_dst) {
        Some((source, destination)) => Err(FsError::SourceDestinationOverlap {
            source,
            destination,
        }),
        None => Ok(()),
    }
}

fn stat_source(path_src: &Path) -> Result<Metadata, FsError> {
    fs::symlink_metadata(path_src).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            FsError::NotFound {
                path: path_src.to_path_buf(),
                source: e,
            }
        } else {
            FsError::io_failure(path_src, EnumFsOperation::StatSource, e)
        }
    })
}

fn skip_symlink(path_src: &Path, spec_cp_ctx: &mut SpecCopyContext<'_>) {
    debug!(path = %path_src.display(), "skipping symlink");
    spec_cp_ctx.builder_cp_report.add_symlink_skipped();
}

fn copy_entry(
    path_dst: &Path,
    path_src: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), FsError> {
    let meta_src = stat_source(path_src)?;
    copy_stat_entry(path_dst, path_src, &meta_src, spec_cp_ctx)
}

fn copy_stat_entry(
    path_dst: &Path,
    path_src: &Path,
    meta_src: &Metadata,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), FsError> {
    if meta_src.file_type().is_symlink() {
        skip_symlink(path_src, spec_cp_ctx);
        return Ok(());
    }
    if meta_src.is_dir() {
        copy_directory(path_dst, path_src, meta_src, spec_cp_ctx)
    } else {
        copy_regular_file(path_dst, path_src, meta_src, spec_cp_ctx)
    }
}

fn copy_regular_file(
    path_dst: &Path,
    path_src: &Path,
    meta_src: &Metadata,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), FsError> {
    let path_parent_dst = resolve_parent(path_dst);
    let mode_parent_created = match inspect_destination(&path_parent_dst)? {
        EnumDestinationKind::Directory => None,
        EnumDestinationKind::Missing => {
            let mode_parent = fs::symlink_metadata(resolve_parent(path_src))
                .map(|meta_parent_src| mode_of(&meta_parent_src))
                .unwrap_or(spec_cp_ctx.spec_cp_options.mode_dir_fallback);
            create_dir_all_with_mode(&path_parent_dst, mode_parent | 0o700)?;
            let c_mode = format!("{mode_parent:o}");
            debug!(path = %path_parent_dst.display(), mode = %c_mode, "created parent directory");
            spec_cp_ctx.builder_cp_report.add_dir_created();
            Some(mode_parent)
        }
        EnumDestinationKind::File | EnumDestinationKind::Symlink | EnumDestinationKind::Other => {
            return Err(FsError::DestinationConflict {
                path: path_parent_dst,
            });
        }
    };

    // Opening through a symlink would write outside the destination tree.
    match inspect_destination(path_dst)? {
        EnumDestinationKind::Missing | EnumDestinationKind::File => {}
        EnumDestinationKind::Directory
        | EnumDestinationKind::Symlink
        | EnumDestinationKind::Other => {
            return Err(FsError::DestinationConflict {
                path: path_dst.to_path_buf(),
            });
        }
    }

    let n_bytes = stream_file(
        path_src,
        path_dst,
        meta_src,
        spec_cp_ctx.spec_cp_options.if_overwrite(),
    )?;
    debug!(
        src = %path_src.display(),
        dst = %path_dst.display(),
        bytes = n_bytes,
        "copied file"
    );
    spec_cp_ctx.builder_cp_report.add_file_copied(n_bytes);

    if let Some(mode_parent) = mode_parent_created {
        apply_mode(&path_parent_dst, mode_parent)?;
    }
    Ok(())
}

fn copy_directory(
    path_dst: &Path,
    path_src: &Path,
    meta_src: &Metadata,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), FsError> {
    let if_created = match inspect_destination(path_dst)? {
        EnumDestinationKind::Directory => false,
        EnumDestinationKind::Missing => {
            // Owner bits stay open until the children are written; the exact
            // source mode is applied afterwards.
            create_dir_all_with_mode(path_dst, mode_of(meta_src) | 0o700)?;
            debug!(path = %path_dst.display(), "created directory");
            spec_cp_ctx.builder_cp_report.add_dir_created();
            true
        }
        EnumDestinationKind::File | EnumDestinationKind::Symlink | EnumDestinationKind::Other => {
            return Err(FsError::DestinationConflict {
                path: path_dst.to_path_buf(),
            });
        }
    };

    trace!(src = %path_src.display(), dst = %path_dst.display(), "entering directory");
    for name in read_dir_sorted(path_src)? {
        copy_entry(&path_dst.join(&name), &path_src.join(&name), spec_cp_ctx)?;
    }

    if if_created {
        apply_permissions(path_dst, meta_src.permissions())?;
    }
    Ok(())
}

fn read_dir_sorted(path_dir: &Path) -> Result<Vec<OsString>, FsError> {
    let iter_entries = fs::read_dir(path_dir)
        .map_err(|e| FsError::io_failure(path_dir, EnumFsOperation::ReadDir, e))?;
    let mut l_names = iter_entries
        .map(|entry_res| entry_res.map(|entry| entry.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FsError::io_failure(path_dir, EnumFsOperation::ReadDir, e))?;
    l_names.sort();
    Ok(l_names)
}
