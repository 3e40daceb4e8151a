//! Test discovery
//!
//! Walks the configured directories for test files. Siblings are visited in
//! file name order so identical trees always yield the same order (and the
//! same instance identities). Symlinks below a test directory are not
//! followed, so a link back up the tree never loads a test twice.

use crate::config::DiscoveryConfig;
use crate::error::RunnerError;
use common::Test;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

fn find(dir: &Path, file_name: &str) -> Result<Vec<PathBuf>, RunnerError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| RunnerError::Discovery {
            path: e.path().unwrap_or(dir).to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Load one test file; its directory becomes the test's base path
pub fn load(path: &Path) -> Result<Test, RunnerError> {
    let discovery_err = |message: String| RunnerError::Discovery {
        path: path.to_path_buf(),
        message,
    };
    let contents = fs::read_to_string(path).map_err(|e| discovery_err(e.to_string()))?;
    let mut test: Test = serde_json::from_str(&contents).map_err(|e| discovery_err(e.to_string()))?;
    test.base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(test)
}

/// Discover every test under the configured directories, in directory order
pub fn discover(config: &DiscoveryConfig) -> Result<Vec<Test>, RunnerError> {
    let mut tests = Vec::new();
    for dir in &config.test_dirs {
        for path in find(dir, &config.test_file)? {
            debug!(path = %path.display(), "Loading test");
            tests.push(load(&path)?);
        }
    }
    Ok(tests)
}
