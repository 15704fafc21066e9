//! Testbench configuration.
//!
//! Loaded from an optional TOML file; every field has a default matching
//! the stock project layout (`vhd/`, `lib/`, `log/`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TestbenchError, TestbenchResult};
use crate::shell::ShellFlavor;

/// Vivado environment scripts sourced before every tool call.
pub const DEFAULT_SETTINGS_SCRIPTS: [&str; 3] = [
    ".settings64-Vivado.bat",
    ".settings64-DocNav.bat",
    ".settings64-SDK_Core_Tools.bat",
];

/// Testbench configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Testbench template with `$NAME` placeholders
    pub template: PathBuf,

    /// XDC constraints read before synthesis
    pub constraints: PathBuf,

    /// Top-level entity passed to `synth_design`
    pub top_module: String,

    /// FPGA part passed to `synth_design`
    pub part: String,

    /// Testbench entity name, also the generated file stem
    pub testbench: String,

    /// Cache for toolchain support files
    pub lib_dir: PathBuf,

    /// Working directory for generated files and tool runs
    pub log_dir: PathBuf,

    /// Keep the working directory after the run
    pub keep_logs: bool,

    /// Where to search for missing support files
    pub search_root: PathBuf,

    /// Environment scripts, by file name
    pub settings_scripts: Vec<String>,

    /// Path suffix that identifies the right `glbl.v`
    pub glbl_marker: PathBuf,

    /// How tool commands are chained
    pub shell: ShellFlavor,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("vhd/template_tb.vhd"),
            constraints: PathBuf::from("vhd/constraints.xdc"),
            top_module: "project_reti_logiche".into(),
            part: "xc7a200tfbg484-1".into(),
            testbench: "project_tb".into(),
            lib_dir: PathBuf::from("lib"),
            log_dir: PathBuf::from("log"),
            keep_logs: false,
            search_root: default_search_root(),
            settings_scripts: DEFAULT_SETTINGS_SCRIPTS.iter().map(|s| s.to_string()).collect(),
            glbl_marker: ["data", "verilog", "src", "glbl.v"].iter().collect(),
            shell: ShellFlavor::native(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from file, falling back to defaults when absent.
    pub fn load(path: Option<&Path>) -> TestbenchResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> TestbenchResult<Self> {
        let config: BenchConfig =
            toml::from_str(contents).map_err(|e| TestbenchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce unusable tool scripts.
    pub fn validate(&self) -> TestbenchResult<()> {
        if self.settings_scripts.is_empty() {
            return Err(TestbenchError::Config(
                "settings_scripts must name at least one script".into(),
            ));
        }
        if self.top_module.trim().is_empty() {
            return Err(TestbenchError::Config("top_module is empty".into()));
        }
        if self.part.trim().is_empty() {
            return Err(TestbenchError::Config("part is empty".into()));
        }
        if self.testbench.trim().is_empty() {
            return Err(TestbenchError::Config("testbench is empty".into()));
        }
        Ok(())
    }

    /// Generated testbench file name.
    pub fn testbench_file(&self) -> String {
        format!("{}.vhd", self.testbench)
    }
}

fn default_search_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\")
    } else {
        PathBuf::from("/")
    }
}
