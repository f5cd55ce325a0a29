//! Discovery of test case directories.

use crate::testcase::TEST_FILE;
use std::path::{Path, PathBuf};

/// Lazy sequence of test case directories, as produced by [`find_test_dirs`].
pub struct TestDirs {
    walker: walkdir::IntoIter,
}

impl Iterator for TestDirs {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(target: "discovery", "skipping unreadable entry: {err}");
                    continue;
                }
            };

            // Symlinked test files count; anything that resolves to a directory doesn't.
            if entry.file_name() == TEST_FILE && !entry.path().is_dir() {
                let dir = entry
                    .path()
                    .parent()
                    .map_or_else(PathBuf::new, Path::to_path_buf);

                tracing::debug!(target: "discovery", "found test case: {}", dir.display());
                return Some(dir);
            }
        }
    }
}

/// Finds all directories under `root/category` that contain a `main.k` file.
///
/// An empty `category` scans `root` itself. A missing root yields no directories.
pub fn find_test_dirs(root: &Path, category: &str) -> TestDirs {
    let scan_root = if category.is_empty() {
        root.to_path_buf()
    } else {
        root.join(category)
    };

    tracing::debug!(target: "discovery", "scanning {}", scan_root.display());

    TestDirs {
        walker: walkdir::WalkDir::new(scan_root).into_iter(),
    }
}
