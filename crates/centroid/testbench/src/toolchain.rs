//! Toolchain support files.
//!
//! Every tool call sources the vendor settings scripts, and timing
//! simulation links Vivado's `glbl.v`. Both are cached in the lib
//! directory; when absent they are searched for under the search root
//! and copied in.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::BenchConfig;
use crate::error::{TestbenchError, TestbenchResult};
use crate::script::SimulationMode;
use crate::shell::ShellFlavor;

/// File name Vivado ships the global-signal module under.
pub const GLBL_FILE: &str = "glbl.v";

/// Local cache of toolchain support files.
#[derive(Clone, Debug)]
pub struct ToolchainLibrary {
    lib_dir: PathBuf,
    search_root: PathBuf,
    settings_scripts: Vec<String>,
    glbl_marker: PathBuf,
    shell: ShellFlavor,
}

impl ToolchainLibrary {
    /// Resolve the library against the project `root`.
    pub fn new(config: &BenchConfig, root: &Path) -> Self {
        Self {
            lib_dir: root.join(&config.lib_dir),
            search_root: config.search_root.clone(),
            settings_scripts: config.settings_scripts.clone(),
            glbl_marker: config.glbl_marker.clone(),
            shell: config.shell,
        }
    }

    pub fn lib_dir(&self) -> &Path {
        &self.lib_dir
    }

    pub fn glbl_path(&self) -> PathBuf {
        self.lib_dir.join(GLBL_FILE)
    }

    /// Cached settings scripts, in sourcing order.
    pub fn settings_paths(&self) -> Vec<PathBuf> {
        self.settings_scripts
            .iter()
            .map(|name| self.lib_dir.join(name))
            .collect()
    }

    /// Settings scripts not yet in the lib directory.
    pub fn missing_settings(&self) -> Vec<String> {
        self.settings_scripts
            .iter()
            .filter(|name| !self.lib_dir.join(name).is_file())
            .cloned()
            .collect()
    }

    /// Make sure everything `mode` needs is cached.
    pub fn prepare(&self, mode: SimulationMode) -> TestbenchResult<()> {
        std::fs::create_dir_all(&self.lib_dir)?;
        self.ensure_settings()?;
        if mode == SimulationMode::Timing {
            self.ensure_glbl()?;
        }
        Ok(())
    }

    /// Copy any missing settings scripts in from the search root.
    pub fn ensure_settings(&self) -> TestbenchResult<()> {
        let mut missing: BTreeSet<String> = self.missing_settings().into_iter().collect();
        if missing.is_empty() {
            return Ok(());
        }

        info!(
            root = %self.search_root.display(),
            count = missing.len(),
            "settings scripts not cached, searching"
        );
        std::fs::create_dir_all(&self.lib_dir)?;

        for path in self.walk_files() {
            let path = path?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if missing.remove(name) {
                self.cache(&path, name)?;
                if missing.is_empty() {
                    break;
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TestbenchError::ToolchainNotFound {
                root: self.search_root.clone(),
                missing: missing.into_iter().collect(),
            })
        }
    }

    /// Copy `glbl.v` in from the search root if it is not cached.
    pub fn ensure_glbl(&self) -> TestbenchResult<()> {
        if self.glbl_path().is_file() {
            return Ok(());
        }

        info!(
            root = %self.search_root.display(),
            marker = %self.glbl_marker.display(),
            "glbl.v not cached, searching"
        );
        std::fs::create_dir_all(&self.lib_dir)?;

        for path in self.walk_files() {
            let path = path?;
            if path.file_name().is_some_and(|n| n == GLBL_FILE) && path.ends_with(&self.glbl_marker) {
                return self.cache(&path, GLBL_FILE);
            }
        }

        Err(TestbenchError::ToolchainNotFound {
            root: self.search_root.clone(),
            missing: vec![self.glbl_marker.display().to_string()],
        })
    }

    /// Shell statements that source every settings script.
    pub fn settings_prelude(&self) -> Vec<String> {
        self.settings_paths()
            .iter()
            .map(|path| self.shell.source(path))
            .collect()
    }

    /// Files under the search root. Unreadable entries below the root are
    /// skipped; a missing or unreadable root is an error.
    fn walk_files(&self) -> impl Iterator<Item = TestbenchResult<PathBuf>> {
        WalkDir::new(&self.search_root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(err) if err.depth() == 0 => Some(Err(err.into())),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
    }

    fn cache(&self, source: &Path, name: &str) -> TestbenchResult<()> {
        let target = self.lib_dir.join(name);
        if target.exists() {
            warn!(target = %target.display(), "already cached, leaving in place");
            return Ok(());
        }
        std::fs::copy(source, &target)?;
        info!(from = %source.display(), to = %target.display(), "cached toolchain file");
        Ok(())
    }
}
