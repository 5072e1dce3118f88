//! `ioex_fs`:
//! small filesystem helpers.
//!
//! - `path`   : existence check and touch
//! - `copy`   : recursive copy of files and directory trees
//! - `spec`   : options/errors
//! - `report` : copy counters
//! - `util`   : shared helper functions

pub mod copy;
pub mod path;
pub mod report;
pub mod spec;
mod util;

pub use copy::{copy_file, copy_tree, copy_tree_with_options};
pub use path::{path_exists, touch};
pub use report::ReportCopy;
pub use spec::{
    EnumCopyFileConflictStrategy, EnumFsOperation, FsError, MODE_DIR_DEFAULT, SpecCopyOptions,
};
