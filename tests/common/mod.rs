/*!
 * Common test utilities for the doctrans test suite
 */

use std::path::PathBuf;
use std::fs;
use anyhow::Result;
use tempfile::TempDir;


/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Builds a document of numbered sentences.
///
/// Every sentence is unique, so the reassembler's overlap search can never
/// anchor on the wrong occurrence the way it could in periodic text.
pub fn sample_document(sentences: usize) -> String {
    let mut text = String::new();
    for i in 0..sentences {
        text.push_str(&format!(
            "This is sentence number {} in the test document, and it talks about topic {}. ",
            i,
            i % 7
        ));
    }
    text
}
