//! `run`: randomized testbench simulations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use centroid_testbench::{
    BenchConfig, CommandRunner, RunEvent, RunRequest, RunSummary, ShellRunner, SimulatedRunner,
    SimulationMode, SimulationOutcome, TestbenchRunner,
};
use clap::{Args, ValueEnum};

use crate::output::{
    print_detail, print_failure, print_json, print_success, print_tool_error, print_tool_warning,
    OutputFormat,
};

/// RAM address the testbench reads the result back from
const RESULT_ADDRESS: u16 = 0b0001_0011;

/// Post-synthesis simulation flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SynthArg {
    /// Simulate the functional netlist
    Functional,
    /// Simulate the timing netlist with SDF back-annotation
    Timing,
}

impl From<SynthArg> for SimulationMode {
    fn from(arg: SynthArg) -> Self {
        match arg {
            SynthArg::Functional => SimulationMode::Functional,
            SynthArg::Timing => SimulationMode::Timing,
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// VHDL design to simulate, relative to the project root [vhd/filename.vhd]
    pub design: PathBuf,

    /// Number of simulations
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Post-synthesis simulation [default: behavioural]
    #[arg(long, value_enum)]
    pub synth: Option<SynthArg>,

    /// Open the waveform viewer
    #[arg(long)]
    pub gui: bool,

    /// Seed for reproducible stimulus
    #[arg(long, env = "CENTROID_BENCH_SEED")]
    pub seed: Option<u64>,

    /// Keep the log directory after the run
    #[arg(long)]
    pub keep_logs: bool,

    /// Skip the toolchain and print the commands that would run
    #[arg(long)]
    pub dry_run: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl RunArgs {
    fn request(&self) -> RunRequest {
        RunRequest {
            design: self.design.clone(),
            count: self.count as usize,
            mode: self.synth.map(SimulationMode::from).unwrap_or_default(),
            gui: self.gui,
            seed: self.seed,
            dry_run: self.dry_run,
        }
    }
}

/// Execute the run command
pub fn execute(args: RunArgs, mut config: BenchConfig, root: &Path) -> anyhow::Result<()> {
    config.keep_logs |= args.keep_logs;
    let request = args.request();

    let recorder = Arc::new(SimulatedRunner::new());
    let runner: Box<dyn CommandRunner> = if request.dry_run {
        Box::new(Arc::clone(&recorder))
    } else {
        Box::new(ShellRunner::new(config.shell))
    };
    let bench = TestbenchRunner::new(config, root, runner)
        .with_context(|| format!("cannot resolve project root {}", root.display()))?;

    let text = args.output == OutputFormat::Text;
    let summary = bench
        .run(&request, |event| {
            if text {
                print_event(&event, &request);
            }
        })
        .with_context(|| format!("{} run of {} failed", request.mode, request.design.display()))?;

    match args.output {
        OutputFormat::Text => {
            if request.dry_run {
                print_commands(&recorder.scripts());
            }
            print_summary(&summary);
        }
        OutputFormat::Json => print_json(&summary)?,
    }
    Ok(())
}

fn print_commands(scripts: &[String]) {
    let mut distinct: Vec<&String> = scripts.iter().collect();
    distinct.dedup();
    println!();
    println!("Commands:");
    for script in distinct {
        print_detail(script);
    }
}

fn print_event(event: &RunEvent<'_>, request: &RunRequest) {
    match event {
        RunEvent::SynthesisStarted => {
            println!("Post-synthesis simulation selected, running synthesis");
        }
        RunEvent::SynthesisFinished(report) => {
            report.warnings.iter().for_each(|w| print_tool_warning(w));
            report.errors.iter().for_each(|e| print_tool_error(e));
            if report.failed() {
                print_failure("Synthesis failed.");
            } else {
                print_success("Synthesis completed.");
            }
        }
        RunEvent::SimulationStarted { id, stimulus } => {
            println!();
            println!("Simulation ID: {}", id);
            print_detail(&format!("Expected return value: {}", stimulus.expected));
            print_detail("Running simulation");
        }
        RunEvent::SimulationFinished(record) => match &record.outcome {
            SimulationOutcome::Passed { observed } => {
                print_detail(&format!("RAM address {:#010b}: {}", RESULT_ADDRESS, observed));
                print_success("Simulation passed.");
            }
            SimulationOutcome::Failed { observed, errors } => {
                errors.iter().for_each(|e| print_tool_error(e));
                if let Some(observed) = observed {
                    print_detail(&format!("RAM address {:#010b}: {}", RESULT_ADDRESS, observed));
                }
                print_failure("Simulation failed.");
            }
            SimulationOutcome::Unchecked if request.dry_run => {
                print_detail("Dry run, simulation not executed.");
            }
            SimulationOutcome::Unchecked => {}
        },
    }
}

fn print_summary(summary: &RunSummary) {
    if !summary.checked {
        return;
    }
    println!();
    println!(
        "Number of passed simulations: {}/{} ({:.1}%)",
        summary.passed,
        summary.total,
        summary.pass_rate()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synth_arg_maps_to_mode() {
        assert_eq!(SimulationMode::from(SynthArg::Functional), SimulationMode::Functional);
        assert_eq!(SimulationMode::from(SynthArg::Timing), SimulationMode::Timing);
    }

    #[test]
    fn result_address_label() {
        assert_eq!(format!("{:#010b}", RESULT_ADDRESS), "0b00010011");
    }
}
