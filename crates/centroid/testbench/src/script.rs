//! Vivado batch scripts and `xsim` command sequences.
//!
//! Behavioural runs elaborate the VHDL source directly. Functional and
//! timing runs synthesize first and simulate the netlist Vivado writes out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::BenchConfig;

/// Name of the generated Vivado batch script.
pub const TCL_SCRIPT: &str = "run.tcl";

const CHECKPOINT: &str = "post_synth";
const FUNCTIONAL_NETLIST: &str = "functional_simulation.vhd";
const TIMING_NETLIST: &str = "timing_simulation.v";
const TIMING_SDF: &str = "timing_simulation.sdf";

/// Which netlist the testbench is simulated against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Behavioural,
    Functional,
    Timing,
}

impl SimulationMode {
    /// Whether synthesis must run before simulating.
    pub fn needs_synthesis(self) -> bool {
        !matches!(self, Self::Behavioural)
    }
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Behavioural => write!(f, "behavioural"),
            Self::Functional => write!(f, "post-synthesis functional"),
            Self::Timing => write!(f, "post-synthesis timing"),
        }
    }
}

/// Render `run.tcl` for a post-synthesis mode.
///
/// `design` and `constraints` are written as given; callers pass absolute
/// paths so the script works from the log directory.
pub fn synthesis_tcl(
    config: &BenchConfig,
    design: &Path,
    constraints: &Path,
    mode: SimulationMode,
) -> String {
    let mut tcl = format!(
        "read_vhdl {design}\n\
         read_xdc {constraints}\n\n\
         synth_design -top {top} -part {part}\n\
         write_checkpoint -force {CHECKPOINT}\n\n\
         open_checkpoint {CHECKPOINT}.dcp\n",
        design = tcl_path(design),
        constraints = tcl_path(constraints),
        top = config.top_module,
        part = config.part,
    );

    match mode {
        SimulationMode::Functional => {
            tcl.push_str(&format!(
                "write_vhdl -mode funcsim -force {FUNCTIONAL_NETLIST}\n"
            ));
        }
        SimulationMode::Timing => {
            tcl.push_str(&format!(
                "write_verilog -mode timesim -sdf_anno true -force {TIMING_NETLIST}\n"
            ));
            tcl.push_str(&format!("write_sdf -force {TIMING_SDF}\n"));
        }
        SimulationMode::Behavioural => {}
    }

    tcl
}

/// The single synthesis step.
pub fn synthesis_steps() -> Vec<String> {
    vec![format!("vivado -mode batch -source {TCL_SCRIPT}")]
}

/// Ordered compile, elaborate and simulate steps.
pub fn simulation_steps(
    config: &BenchConfig,
    design: &Path,
    glbl: &Path,
    mode: SimulationMode,
    gui: bool,
) -> Vec<String> {
    let tb = &config.testbench;
    let quote = |path: &Path| config.shell.quote(&path.display().to_string());
    let mut steps = vec![format!("xvhdl {}", config.testbench_file())];

    match mode {
        SimulationMode::Behavioural => steps.push(format!("xvhdl {}", quote(design))),
        SimulationMode::Functional => steps.push(format!("xvhdl {FUNCTIONAL_NETLIST}")),
        SimulationMode::Timing => {
            steps.push(format!("xvlog {TIMING_NETLIST}"));
            steps.push(format!("xvlog {}", quote(glbl)));
        }
    }

    let mut elaborate = vec!["xelab".to_string()];
    if gui {
        elaborate.push("-debug all".into());
    }
    match mode {
        SimulationMode::Timing => {
            elaborate.push("-L simprims_ver -L unisims_ver".into());
            elaborate.push(format!("{tb} glbl"));
        }
        _ => elaborate.push(tb.clone()),
    }
    steps.push(elaborate.join(" "));

    let snapshot = match mode {
        SimulationMode::Timing => format!("work.{tb}#work.glbl"),
        _ => format!("work.{tb}"),
    };
    let run_flag = if gui { "-gui" } else { "-runall" };
    steps.push(format!("xsim {snapshot} {run_flag}"));

    steps
}

/// Braced Tcl word with forward slashes, which Vivado wants even on Windows.
fn tcl_path(path: &Path) -> String {
    format!("{{{}}}", path.display().to_string().replace('\\', "/"))
}
