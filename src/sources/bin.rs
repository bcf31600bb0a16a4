use crate::sources::Source;
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Executable names that may be launched straight from the top level.
#[derive(Debug, Clone, Default)]
pub struct Executables {
    names: BTreeSet<String>,
}

impl Executables {
    /// `configured` names plus every executable file found directly in `dirs`.
    pub fn new(configured: &[String], dirs: &[PathBuf]) -> Self {
        let mut names: BTreeSet<String> = configured.iter().cloned().collect();
        for dir in dirs {
            names.extend(scan_dir(dir));
        }
        info!("Executables: {} names", names.len());
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl Source for Executables {
    fn items(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

fn scan_dir(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    debug!("Scanning executables in {:?}", dir);
    let Ok(read_dir) = fs::read_dir(dir) else {
        return found;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if metadata.permissions().mode() & 0o111 != 0 {
            if let Some(file_name) = path.file_name().and_then(|s| s.to_str()) {
                found.push(file_name.to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn merges_configured_and_scanned_names_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "backup", 0o755);
        touch(dir.path(), "README", 0o644);
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let exes = Executables::new(
            &["vim".to_string(), "firefox".to_string(), "vim".to_string()],
            &[dir.path().to_path_buf(), PathBuf::from("/nonexistent/bin")],
        );

        assert_eq!(exes.items(), vec!["backup", "firefox", "vim"]);
        assert!(exes.contains("backup"));
        assert!(!exes.contains("README"));
        assert!(!exes.contains("subdir"));
    }
}
