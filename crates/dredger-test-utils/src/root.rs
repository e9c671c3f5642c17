//! [`TestRoot`] for reconciler test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use dredger_fs::ConfigManager;
use tempfile::TempDir;

/// A temporary directory holding a config root (`files/`) and a record
/// store directory (`records/`), with assertion helpers.
///
/// # Example
///
/// ```rust,no_run
/// use dredger_test_utils::TestRoot;
///
/// let root = TestRoot::new();
/// let manager = root.manager();
/// root.assert_file_not_exists("app.conf");
/// ```
pub struct TestRoot {
    temp_dir: TempDir,
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// The scratch directory itself.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory the config manager owns.
    pub fn files_dir(&self) -> PathBuf {
        self.path().join("files")
    }

    /// Directory of the file-backed record store.
    pub fn records_dir(&self) -> PathBuf {
        self.path().join("records")
    }

    /// Open a manager on [`files_dir`](Self::files_dir).
    ///
    /// # Panics
    /// Panics if another manager already owns the directory.
    pub fn manager(&self) -> ConfigManager {
        ConfigManager::open(self.files_dir()).expect("TestRoot::manager: cannot open root")
    }

    /// Write `content` to a file relative to the scratch directory.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Content of the target file in the config root.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_target(&self, target: &str) -> String {
        let path = self.files_dir().join(target);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Assert that `target` exists in the config root.
    pub fn assert_file_exists(&self, target: &str) {
        let path = self.files_dir().join(target);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that `target` does **not** exist in the config root.
    pub fn assert_file_not_exists(&self, target: &str) {
        let path = self.files_dir().join(target);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }

    /// Assert the config root holds no leftover temporary files.
    pub fn assert_no_temp_files(&self) {
        let leftovers: Vec<_> = fs::read_dir(self.files_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "Leftover temp files: {leftovers:?}");
    }
}
