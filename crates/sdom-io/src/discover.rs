//! Case-directory scanning and logical-name resolution.
//!
//! Input files are matched by *logical* name: matching is case-insensitive
//! and ignores spaces, hyphens and underscores, and a file stem may carry a
//! suffix after the logical name (cases in the wild ship `Load_hourly_2050.csv`
//! for logical `Load_hourly`).

use sdom_core::{SdomError, SdomResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Collapse a name for comparison: lowercase, separators removed.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// All CSV files found under a case directory, indexed by normalized stem.
#[derive(Debug)]
pub struct CaseDirectory {
    dir: PathBuf,
    files: Vec<(String, PathBuf)>,
}

impl CaseDirectory {
    pub fn scan(dir: &Path) -> SdomResult<Self> {
        if !dir.is_dir() {
            return Err(SdomError::Config(format!(
                "input directory {} does not exist",
                dir.display()
            )));
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((normalize(stem), path.clone()));
            }
        }
        // Deterministic resolution regardless of directory iteration order.
        files.sort();
        debug!(dir = %dir.display(), count = files.len(), "scanned case directory");
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Resolve a logical file name. Exact normalized matches win; otherwise
    /// a unique prefix match (suffix-tolerant) is accepted.
    pub fn find(&self, logical: &str) -> SdomResult<Option<PathBuf>> {
        let wanted = normalize(logical);
        if let Some((_, path)) = self.files.iter().find(|(stem, _)| *stem == wanted) {
            return Ok(Some(path.clone()));
        }
        let matches: Vec<&PathBuf> = self
            .files
            .iter()
            .filter(|(stem, _)| stem.starts_with(&wanted))
            .map(|(_, p)| p)
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].clone())),
            _ => Err(SdomError::Config(format!(
                "ambiguous match for '{logical}' in {}: {}",
                self.dir.display(),
                matches
                    .iter()
                    .map(|p| {
                        p.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Resolve a logical file name or fail with a descriptive ConfigError.
    pub fn require(&self, logical: &str, description: &str) -> SdomResult<PathBuf> {
        self.find(logical)?.ok_or_else(|| {
            SdomError::Config(format!(
                "missing {description}: no file matching '{logical}' in {}",
                self.dir.display()
            ))
        })
    }
}
