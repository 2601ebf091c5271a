//! Workspace Context
//!
//! Builds the system prompt sent ahead of the conversation: a static
//! environment header plus an `ls -R` style listing of the working
//! directory, regenerated every turn so the model sees current file state.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Placeholder replaced by the user's input in prompt templates
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

const LISTING_HEADER: &str = "File system listing (ls -R):\n";

pub struct WorkspaceContext {
    root: PathBuf,
    ignore: HashSet<String>,
    header: String,
}

impl WorkspaceContext {
    pub fn new(root: impl Into<PathBuf>, ignore_dirs: &[String]) -> Self {
        let root = root.into();
        let header = format!(
            "Environment:\nOS: {}\nWorking directory: {}\nIgnore directories: {}\n",
            std::env::consts::OS,
            root.display(),
            ignore_dirs.join(", ")
        );

        Self {
            root,
            ignore: ignore_dirs.iter().cloned().collect(),
            header,
        }
    }

    /// Static environment description
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Recursive listing of non-ignored directories and their entries.
    ///
    /// Unreadable directories are listed without entries.
    pub fn listing(&self) -> String {
        let mut dirs: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_ignored(&e.file_name().to_string_lossy()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| self.relative(e.path()))
            .collect();
        dirs.sort();

        let mut listing = String::from(LISTING_HEADER);
        for dir in &dirs {
            listing.push_str(dir);
            listing.push_str(":\n");

            let mut names: Vec<String> = match fs::read_dir(self.root.join(dir)) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| !self.is_ignored(name))
                    .collect(),
                Err(e) => {
                    debug!("Skipping unreadable directory {}: {}", dir, e);
                    continue;
                }
            };
            names.sort();

            for name in names {
                listing.push_str("  ");
                listing.push_str(&name);
                listing.push('\n');
            }
            listing.push('\n');
        }
        listing
    }

    /// Header plus a fresh listing. The listing is also saved to
    /// `snapshot_path`; a failed save is logged and otherwise ignored.
    pub fn system_prompt(&self, snapshot_path: &Path) -> String {
        let listing = self.listing();
        if let Err(e) = fs::write(snapshot_path, &listing) {
            warn!("Failed to write file system snapshot: {}", e);
        }
        format!("{}{}", self.header, listing)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Substitute the user's input into a prompt template.
pub fn render_prompt(template: &str, input: &str) -> String {
    template.replace(INPUT_PLACEHOLDER, input)
}
