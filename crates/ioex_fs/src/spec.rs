//! Copy options and the error type shared by every operation.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Mode used for directories created by `touch`, and for copy parents whose
/// source-side mode cannot be read.
pub const MODE_DIR_DEFAULT: u32 = 0o755;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileConflictStrategy {
    /// Truncate and replace the destination file.
    Overwrite,
    /// Fail with [`FsError::AlreadyExists`] and stop the copy.
    Error,
}

impl From<bool> for EnumCopyFileConflictStrategy {
    fn from(if_overwrite: bool) -> Self {
        if if_overwrite {
            Self::Overwrite
        } else {
            Self::Error
        }
    }
}

/// Filesystem step that produced an [`FsError::IoFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsOperation {
    Stat,
    StatSource,
    StatDestination,
    CreateDir,
    ReadDir,
    OpenSource,
    OpenDestination,
    Stream,
    SetPermissions,
    SetTimes,
}

impl EnumFsOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::StatSource => "stat source",
            Self::StatDestination => "stat destination",
            Self::CreateDir => "create directory",
            Self::ReadDir => "read directory",
            Self::OpenSource => "open source",
            Self::OpenDestination => "open destination",
            Self::Stream => "copy bytes",
            Self::SetPermissions => "set permissions",
            Self::SetTimes => "set file times",
        }
    }
}

impl fmt::Display for EnumFsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_tree_with_options`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Conflict behavior for destination files.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Mode for destination parents when the source parent cannot be statted.
    pub mode_dir_fallback: u32,
}

impl SpecCopyOptions {
    /// Options equivalent to the plain `overwrite` flag.
    pub fn from_overwrite(if_overwrite: bool) -> Self {
        Self {
            rule_conflict_file: EnumCopyFileConflictStrategy::from(if_overwrite),
            ..Self::default()
        }
    }

    pub fn if_overwrite(&self) -> bool {
        self.rule_conflict_file == EnumCopyFileConflictStrategy::Overwrite
    }
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            rule_conflict_file: EnumCopyFileConflictStrategy::Error,
            mode_dir_fallback: MODE_DIR_DEFAULT,
        }
    }
}

/// Failure of `path_exists`, `touch` or one of the copy routines.
///
/// Copy failures are fail-fast: whatever was written before the error stays
/// in place and nothing is rolled back.
#[derive(Debug)]
pub enum FsError {
    /// Source path does not exist.
    NotFound {
        /// Missing path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Overwrite is disabled and the destination file is already present.
    AlreadyExists {
        /// Existing destination path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// A destination position needed as a directory (or as a plain file) is
    /// occupied by something else, symlinks included.
    DestinationConflict {
        /// Occupied destination path.
        path: PathBuf,
    },
    /// Source and destination resolve to the same path or one contains the
    /// other.
    SourceDestinationOverlap {
        /// Normalized source path.
        source: PathBuf,
        /// Normalized destination path.
        destination: PathBuf,
    },
    /// `copy_file` was handed a directory.
    SourceIsDirectory {
        /// Offending source path.
        path: PathBuf,
    },
    /// Any other filesystem failure.
    IoFailure {
        /// Path the failed operation targeted.
        path: PathBuf,
        /// Step that failed.
        operation: EnumFsOperation,
        /// Underlying OS error.
        source: io::Error,
    },
}

impl FsError {
    pub(crate) fn io_failure(path: &Path, operation: EnumFsOperation, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::AlreadyExists { path, .. }
            | Self::DestinationConflict { path }
            | Self::SourceIsDirectory { path }
            | Self::IoFailure { path, .. } => path,
            Self::SourceDestinationOverlap { destination, .. } => destination,
        }
    }

    /// Wrapped OS error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::NotFound { source, .. }
            | Self::AlreadyExists { source, .. }
            | Self::IoFailure { source, .. } => Some(source),
            Self::DestinationConflict { .. }
            | Self::SourceDestinationOverlap { .. }
            | Self::SourceIsDirectory { .. } => None,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path, source } => {
                write!(f, "Source not found: {} ({source})", path.display())
            }
            Self::AlreadyExists { path, .. } => {
                write!(f, "Destination exists: {}", path.display())
            }
            Self::DestinationConflict { path } => write!(
                f,
                "Destination is occupied by a non-directory or symlink: {}",
                path.display()
            ),
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination overlap: {} <-> {}",
                source.display(),
                destination.display()
            ),
            Self::SourceIsDirectory { path } => {
                write!(f, "Source is a directory: {}", path.display())
            }
            Self::IoFailure {
                path,
                operation,
                source,
            } => write!(f, "Failed to {operation} {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { source, .. }
            | Self::AlreadyExists { source, .. }
            | Self::IoFailure { source, .. } => Some(source),
            Self::DestinationConflict { .. }
            | Self::SourceDestinationOverlap { .. }
            | Self::SourceIsDirectory { .. } => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
