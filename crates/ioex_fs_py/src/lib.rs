use std::collections::BTreeMap;

use ioex_fs::{FsError, ReportCopy, copy_file, copy_tree, path_exists, touch};
use pyo3::exceptions::{
    PyFileExistsError, PyFileNotFoundError, PyIsADirectoryError, PyOSError, PyValueError,
};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "ioex.fs.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportCopy")]
#[derive(Debug, Clone)]
struct PyReportCopy {
    #[pyo3(get)]
    cnt_files_copied: u64,
    #[pyo3(get)]
    cnt_dirs_created: u64,
    #[pyo3(get)]
    cnt_symlinks_skipped: u64,
    #[pyo3(get)]
    n_bytes_copied: u64,
}

impl From<ReportCopy> for PyReportCopy {
    fn from(report_copy: ReportCopy) -> Self {
        Self {
            cnt_files_copied: report_copy.cnt_files_copied,
            cnt_dirs_created: report_copy.cnt_dirs_created,
            cnt_symlinks_skipped: report_copy.cnt_symlinks_skipped,
            n_bytes_copied: report_copy.n_bytes_copied,
        }
    }
}

impl PyReportCopy {
    fn as_report(&self) -> ReportCopy {
        ReportCopy {
            cnt_files_copied: self.cnt_files_copied,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_symlinks_skipped: self.cnt_symlinks_skipped,
            n_bytes_copied: self.n_bytes_copied,
        }
    }
}

#[pymethods]
impl PyReportCopy {
    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.as_report().to_dict()
    }

    #[pyo3(signature = (prefix = "[COPY]"))]
    fn format(&self, prefix: &str) -> String {
        self.as_report().format(prefix)
    }

    fn __str__(&self) -> String {
        self.as_report().to_string()
    }
}

fn map_fs_error(exception: FsError) -> PyErr {
    let message = exception.to_string();
    match exception {
        FsError::NotFound { .. } => PyFileNotFoundError::new_err(message),
        FsError::AlreadyExists { .. } | FsError::DestinationConflict { .. } => {
            PyFileExistsError::new_err(message)
        }
        FsError::SourceIsDirectory { .. } => PyIsADirectoryError::new_err(message),
        FsError::SourceDestinationOverlap { .. } => PyValueError::new_err(message),
        FsError::IoFailure { .. } => PyOSError::new_err(message),
    }
}

#[pyfunction(name = "path_exists")]
fn path_exists_py(py: Python<'_>, path: String) -> PyResult<bool> {
    py.allow_threads(|| path_exists(path)).map_err(map_fs_error)
}

#[pyfunction(name = "touch")]
fn touch_py(py: Python<'_>, path: String) -> PyResult<()> {
    py.allow_threads(|| touch(path)).map_err(map_fs_error)
}

#[pyfunction(name = "copy_tree")]
#[pyo3(signature = (destination, source, overwrite = false))]
fn copy_tree_py(
    py: Python<'_>,
    destination: String,
    source: String,
    overwrite: bool,
) -> PyResult<PyReportCopy> {
    let report_copy = py.allow_threads(|| copy_tree(destination, source, overwrite));
    let report_copy = report_copy.map_err(map_fs_error)?;
    Ok(PyReportCopy::from(report_copy))
}

#[pyfunction(name = "copy_file")]
#[pyo3(signature = (destination, source, overwrite = false))]
fn copy_file_py(
    py: Python<'_>,
    destination: String,
    source: String,
    overwrite: bool,
) -> PyResult<PyReportCopy> {
    let report_copy = py.allow_threads(|| copy_file(destination, source, overwrite));
    let report_copy = report_copy.map_err(map_fs_error)?;
    Ok(PyReportCopy::from(report_copy))
}

#[pymodule]
fn _ioex_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportCopy>()?;
    module.add_function(wrap_pyfunction!(path_exists_py, module)?)?;
    module.add_function(wrap_pyfunction!(touch_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_file_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
