#![deny(unsafe_code)]
//! # centroid-testbench
//!
//! Randomized verification of the nearest-centroid hardware block with
//! the Vivado simulator.
//!
//! Each iteration draws a uniform stimulus, predicts the expected result
//! with [`centroid_selector`], renders the testbench template and runs
//! `xvhdl`/`xelab`/`xsim`. Post-synthesis modes run Vivado in batch mode
//! first and simulate the netlist it writes.
//!
//! ## Key Types
//!
//! - [`BenchConfig`] - project layout and toolchain settings (TOML)
//! - [`StimulusGenerator`] / [`Stimulus`] - uniform inputs plus the prediction
//! - [`Template`] - `$NAME` testbench rendering
//! - [`ToolchainLibrary`] - cached settings scripts and `glbl.v`
//! - [`CommandRunner`] / [`ShellRunner`] / [`SimulatedRunner`] - tool invocation
//! - [`TestbenchRunner`] - the run loop

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod script;
pub mod shell;
pub mod stimulus;
pub mod template;
pub mod toolchain;

pub use config::BenchConfig;
pub use error::{TestbenchError, TestbenchResult};
pub use report::{SimulationOutcome, SynthesisReport};
pub use runner::{RunEvent, RunRequest, RunSummary, SimulationRecord, TestbenchRunner};
pub use script::SimulationMode;
pub use shell::{CommandRunner, ShellFlavor, ShellRunner, SimulatedRunner};
pub use stimulus::{Stimulus, StimulusGenerator};
pub use template::Template;
pub use toolchain::ToolchainLibrary;
