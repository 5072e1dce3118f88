//! Copy report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Counters for one successful `copy_tree` / `copy_file` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportCopy {
    /// Regular files written to the destination.
    pub cnt_files_copied: u64,
    /// Directories created by this run (merged ones are not counted).
    pub cnt_dirs_created: u64,
    /// Symbolic links skipped.
    pub cnt_symlinks_skipped: u64,
    /// Total bytes streamed into destination files.
    pub n_bytes_copied: u64,
}

impl ReportCopy {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_symlinks_skipped".to_string(), self.cnt_symlinks_skipped);
        dict_counts.insert("n_bytes_copied".to_string(), self.n_bytes_copied);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} files={} dirs={} symlinks_skipped={} bytes={}",
            self.cnt_files_copied,
            self.cnt_dirs_created,
            self.cnt_symlinks_skipped,
            self.n_bytes_copied
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator threaded through the recursion.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReportCopyBuilder {
    cnt_files_copied: u64,
    cnt_dirs_created: u64,
    cnt_symlinks_skipped: u64,
    n_bytes_copied: u64,
}

impl ReportCopyBuilder {
    pub(crate) fn add_file_copied(&mut self, n_bytes: u64) {
        self.cnt_files_copied += 1;
        self.n_bytes_copied += n_bytes;
    }

    pub(crate) fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    pub(crate) fn add_symlink_skipped(&mut self) {
        self.cnt_symlinks_skipped += 1;
    }

    pub(crate) fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_files_copied: self.cnt_files_copied,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_symlinks_skipped: self.cnt_symlinks_skipped,
            n_bytes_copied: self.n_bytes_copied,
        }
    }
}
