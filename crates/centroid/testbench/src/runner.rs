//! The testbench run loop.
//!
//! Prepares the toolchain cache, optionally synthesizes, then renders and
//! simulates one random testbench per iteration. The log directory is the
//! working directory for every tool call and is removed afterwards unless
//! the configuration keeps it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::error::{TestbenchError, TestbenchResult};
use crate::report::{SimulationOutcome, SynthesisReport};
use crate::script::{self, SimulationMode, TCL_SCRIPT};
use crate::shell::CommandRunner;
use crate::stimulus::{Stimulus, StimulusGenerator};
use crate::template::Template;
use crate::toolchain::ToolchainLibrary;

// ── Request / Results ───────────────────────────────────────────────

/// What to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Design source, relative to the project root.
    pub design: PathBuf,
    /// Number of simulations.
    pub count: usize,
    pub mode: SimulationMode,
    /// Open the waveform viewer instead of running to completion.
    pub gui: bool,
    /// Seed for reproducible stimulus.
    pub seed: Option<u64>,
    /// Skip toolchain discovery and leave outcomes unchecked.
    pub dry_run: bool,
}

impl RunRequest {
    pub fn new(design: impl Into<PathBuf>) -> Self {
        Self {
            design: design.into(),
            count: 1,
            mode: SimulationMode::Behavioural,
            gui: false,
            seed: None,
            dry_run: false,
        }
    }

    /// Whether outcomes are parsed from tool output.
    pub fn checks_output(&self) -> bool {
        !self.gui && !self.dry_run
    }
}

/// One simulated testbench.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// One-based simulation number.
    pub id: usize,
    pub stimulus: Stimulus,
    pub outcome: SimulationOutcome,
}

/// Totals for a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// False for GUI and dry runs, where nothing was checked.
    pub checked: bool,
    pub synthesis: Option<SynthesisReport>,
}

impl RunSummary {
    /// Passed simulations as a percentage of the total.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 * 100.0 / self.total as f64
    }
}

/// Progress notifications, in order.
#[derive(Debug)]
pub enum RunEvent<'a> {
    SynthesisStarted,
    SynthesisFinished(&'a SynthesisReport),
    SimulationStarted { id: usize, stimulus: &'a Stimulus },
    SimulationFinished(&'a SimulationRecord),
}

// ── Runner ──────────────────────────────────────────────────────────

/// Drives synthesis and simulation through a [`CommandRunner`].
pub struct TestbenchRunner {
    config: BenchConfig,
    root: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl TestbenchRunner {
    /// `root` is the project directory all configured paths are relative to.
    ///
    /// Tools run inside the log directory, so the root is made absolute here
    /// and every path handed to them resolves from there.
    pub fn new(
        config: BenchConfig,
        root: impl AsRef<Path>,
        runner: Box<dyn CommandRunner>,
    ) -> TestbenchResult<Self> {
        let root = std::path::absolute(root.as_ref())?;
        debug!(root = %root.display(), "resolved project root");
        Ok(Self {
            config,
            root,
            runner,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(&self.config.log_dir)
    }

    /// Run `request`, reporting progress to `observe`.
    pub fn run<F>(&self, request: &RunRequest, mut observe: F) -> TestbenchResult<RunSummary>
    where
        F: FnMut(RunEvent<'_>),
    {
        info!(
            runner = self.runner.name(),
            mode = %request.mode,
            count = request.count,
            "starting testbench run"
        );

        let library = ToolchainLibrary::new(&self.config, &self.root);
        if !request.dry_run {
            library.prepare(request.mode)?;
        }

        let log_dir = self.log_dir();
        fs::create_dir_all(&log_dir)?;

        let result = self.run_in(&log_dir, &library, request, &mut observe);

        if self.config.keep_logs {
            debug!(log_dir = %log_dir.display(), "keeping log directory");
        } else if let Err(err) = fs::remove_dir_all(&log_dir) {
            warn!(log_dir = %log_dir.display(), error = %err, "failed to remove log directory");
        }

        result
    }

    fn run_in<F>(
        &self,
        log_dir: &Path,
        library: &ToolchainLibrary,
        request: &RunRequest,
        observe: &mut F,
    ) -> TestbenchResult<RunSummary>
    where
        F: FnMut(RunEvent<'_>),
    {
        let design = self.input(&request.design, request.dry_run)?;
        let template_path = self.input(&self.config.template, false)?;
        let template = Template::load(&template_path)?;
        let prelude = library.settings_prelude();

        let synthesis = if request.mode.needs_synthesis() {
            Some(self.synthesize(log_dir, &design, &prelude, request.mode, observe)?)
        } else {
            None
        };

        let mut steps = prelude.clone();
        steps.extend(script::simulation_steps(
            &self.config,
            &design,
            &library.glbl_path(),
            request.mode,
            request.gui,
        ));
        let simulate = self.config.shell.chain(&steps);

        let mut generator = match request.seed {
            Some(seed) => StimulusGenerator::seeded(seed),
            None => StimulusGenerator::from_entropy(),
        };
        let testbench_path = log_dir.join(self.config.testbench_file());
        let mut summary = RunSummary {
            checked: request.checks_output(),
            synthesis,
            ..RunSummary::default()
        };

        for id in 1..=request.count {
            let stimulus = generator.generate();
            fs::write(&testbench_path, template.substitute(&stimulus.substitutions())?)?;
            observe(RunEvent::SimulationStarted {
                id,
                stimulus: &stimulus,
            });

            let output = self.runner.run(&simulate, log_dir)?;
            let outcome = if request.checks_output() {
                SimulationOutcome::parse(&output)
            } else {
                SimulationOutcome::Unchecked
            };
            debug!(id, expected = %stimulus.expected, observed = ?outcome.observed(), "simulation finished");

            let record = SimulationRecord {
                id,
                stimulus,
                outcome,
            };
            summary.total += 1;
            if record.outcome.passed() {
                summary.passed += 1;
            }
            observe(RunEvent::SimulationFinished(&record));
        }

        info!(
            passed = summary.passed,
            total = summary.total,
            "testbench run complete"
        );
        Ok(summary)
    }

    fn synthesize<F>(
        &self,
        log_dir: &Path,
        design: &Path,
        prelude: &[String],
        mode: SimulationMode,
        observe: &mut F,
    ) -> TestbenchResult<SynthesisReport>
    where
        F: FnMut(RunEvent<'_>),
    {
        let constraints = self.root.join(&self.config.constraints);
        let tcl = script::synthesis_tcl(&self.config, design, &constraints, mode);
        fs::write(log_dir.join(TCL_SCRIPT), tcl)?;

        let mut steps = prelude.to_vec();
        steps.extend(script::synthesis_steps());

        observe(RunEvent::SynthesisStarted);
        let output = self.runner.run(&self.config.shell.chain(&steps), log_dir)?;
        let report = SynthesisReport::parse(&output);
        observe(RunEvent::SynthesisFinished(&report));

        if report.failed() {
            return Err(TestbenchError::SynthesisFailed(report.errors.len()));
        }
        Ok(report)
    }

    /// Resolve an input against the root, requiring it to exist unless `lenient`.
    fn input(&self, relative: &Path, lenient: bool) -> TestbenchResult<PathBuf> {
        let path = self.root.join(relative);
        if !lenient && !path.is_file() {
            return Err(TestbenchError::MissingInput(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{ShellFlavor, SimulatedRunner};
    use std::sync::Arc;
    use tempfile::TempDir;

    const TEMPLATE: &str = "mask=$BITMASK q=($X,$Y) c1=($XC1,$YC1) c8=($XC8,$YC8) expect=$RESULT\n";

    fn write_project(root: &Path) {
        fs::create_dir_all(root.join("vhd")).unwrap();
        fs::write(root.join("vhd/template_tb.vhd"), TEMPLATE).unwrap();
        fs::write(root.join("vhd/design.vhd"), "-- design").unwrap();
        fs::write(root.join("vhd/constraints.xdc"), "").unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        for name in crate::config::DEFAULT_SETTINGS_SCRIPTS {
            fs::write(root.join("lib").join(name), "").unwrap();
        }
    }

    fn project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        dir
    }

    fn config() -> BenchConfig {
        BenchConfig {
            search_root: PathBuf::from("/definitely/not/here"),
            shell: ShellFlavor::Posix,
            ..BenchConfig::default()
        }
    }

    fn runner(dir: &TempDir, config: BenchConfig, sim: &Arc<SimulatedRunner>) -> TestbenchRunner {
        TestbenchRunner::new(config, dir.path(), Box::new(Arc::clone(sim))).unwrap()
    }

    #[test]
    fn behavioural_run_counts_passes() {
        let dir = project();
        let sim = Arc::new(
            SimulatedRunner::new()
                .with_output("passed12")
                .with_output("ERROR: mismatch\nfailed3")
                .with_fallback("passed1"),
        );
        let request = RunRequest {
            count: 3,
            seed: Some(1),
            ..RunRequest::new("vhd/design.vhd")
        };

        let mut finished = Vec::new();
        let summary = runner(&dir, config(), &sim)
            .run(&request, |event| {
                if let RunEvent::SimulationFinished(record) = event {
                    finished.push(record.clone());
                }
            })
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert!(summary.checked);
        assert!(summary.synthesis.is_none());
        assert!((summary.pass_rate() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(finished.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(finished[1].outcome.observed().map(|m| m.bits()), Some(3));

        let scripts = sim.scripts();
        assert_eq!(scripts.len(), 3);
        assert!(scripts[0].contains("xelab project_tb"));
        assert!(scripts[0].starts_with(". '"));
        assert!(!dir.path().join("log").exists());
    }

    #[test]
    fn rendered_testbench_carries_expected_result() {
        let dir = project();
        let sim = Arc::new(SimulatedRunner::new().with_fallback("passed0"));
        let config = BenchConfig {
            keep_logs: true,
            ..config()
        };
        let request = RunRequest {
            seed: Some(99),
            ..RunRequest::new("vhd/design.vhd")
        };

        let mut seen = None;
        runner(&dir, config, &sim)
            .run(&request, |event| {
                if let RunEvent::SimulationStarted { stimulus, .. } = event {
                    seen = Some(*stimulus);
                }
            })
            .unwrap();

        let stimulus = seen.unwrap();
        let rendered = fs::read_to_string(dir.path().join("log/project_tb.vhd")).unwrap();
        let expected = format!(
            "mask={} q=({},{}) c1=({},{}) c8=({},{}) expect={}\n",
            stimulus.mask.bits(),
            stimulus.query.x,
            stimulus.query.y,
            stimulus.centroids[0].x,
            stimulus.centroids[0].y,
            stimulus.centroids[7].x,
            stimulus.centroids[7].y,
            stimulus.expected.bits(),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn functional_run_synthesizes_first() {
        let dir = project();
        let sim = Arc::new(
            SimulatedRunner::new()
                .with_output("WARNING: [Synth 8-3331] unconnected port\n")
                .with_fallback("passed0"),
        );
        let config = BenchConfig {
            keep_logs: true,
            ..config()
        };
        let request = RunRequest {
            mode: SimulationMode::Functional,
            ..RunRequest::new("vhd/design.vhd")
        };

        let mut events = Vec::new();
        let summary = runner(&dir, config, &sim)
            .run(&request, |event| {
                events.push(match event {
                    RunEvent::SynthesisStarted => "synth-start",
                    RunEvent::SynthesisFinished(_) => "synth-done",
                    RunEvent::SimulationStarted { .. } => "sim-start",
                    RunEvent::SimulationFinished(_) => "sim-done",
                })
            })
            .unwrap();

        assert_eq!(events, vec!["synth-start", "synth-done", "sim-start", "sim-done"]);
        assert_eq!(summary.synthesis.unwrap().warnings.len(), 1);
        let scripts = sim.scripts();
        assert!(scripts[0].ends_with("vivado -mode batch -source run.tcl"));
        assert!(scripts[1].contains("xvhdl functional_simulation.vhd"));
        let tcl = fs::read_to_string(dir.path().join("log/run.tcl")).unwrap();
        assert!(tcl.contains("write_vhdl -mode funcsim"));
    }

    #[test]
    fn synthesis_errors_abort_and_clean_up() {
        let dir = project();
        let sim = Arc::new(SimulatedRunner::new().with_output("ERROR: [Synth 8-439] bad\n"));
        let request = RunRequest {
            mode: SimulationMode::Functional,
            count: 5,
            ..RunRequest::new("vhd/design.vhd")
        };

        let err = runner(&dir, config(), &sim).run(&request, |_| {}).unwrap_err();
        assert!(matches!(err, TestbenchError::SynthesisFailed(1)));
        assert_eq!(sim.scripts().len(), 1);
        assert!(!dir.path().join("log").exists());
    }

    #[test]
    fn missing_toolchain_aborts_before_simulating() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("lib")).unwrap();
        let sim = Arc::new(SimulatedRunner::new());
        let err = runner(&dir, config(), &sim)
            .run(&RunRequest::new("vhd/design.vhd"), |_| {})
            .unwrap_err();
        assert!(matches!(err, TestbenchError::Walk(_)));
        assert!(sim.scripts().is_empty());
    }

    #[test]
    fn missing_design_is_reported() {
        let dir = project();
        let sim = Arc::new(SimulatedRunner::new());
        let err = runner(&dir, config(), &sim)
            .run(&RunRequest::new("vhd/absent.vhd"), |_| {})
            .unwrap_err();
        assert!(matches!(err, TestbenchError::MissingInput(ref p) if p.ends_with("vhd/absent.vhd")));
    }

    #[test]
    fn dry_run_and_gui_leave_outcomes_unchecked() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("lib")).unwrap();
        let sim = Arc::new(SimulatedRunner::new().with_fallback("passed0"));
        let request = RunRequest {
            count: 2,
            dry_run: true,
            gui: true,
            ..RunRequest::new("vhd/design.vhd")
        };

        let summary = runner(&dir, config(), &sim).run(&request, |_| {}).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 0);
        assert!(!summary.checked);
        assert!(sim.scripts()[0].contains("xsim work.project_tb -gui"));
    }

    #[test]
    fn seeded_runs_repeat() {
        let collect = |seed| {
            let dir = project();
            let sim = Arc::new(SimulatedRunner::new().with_fallback("passed0"));
            let request = RunRequest {
                count: 4,
                seed: Some(seed),
                ..RunRequest::new("vhd/design.vhd")
            };
            let mut stimuli = Vec::new();
            runner(&dir, config(), &sim)
                .run(&request, |event| {
                    if let RunEvent::SimulationStarted { stimulus, .. } = event {
                        stimuli.push(*stimulus);
                    }
                })
                .unwrap();
            stimuli
        };
        assert_eq!(collect(5), collect(5));
    }

    #[test]
    fn pass_rate_of_empty_run() {
        assert_eq!(RunSummary::default().pass_rate(), 0.0);
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let sim = Arc::new(SimulatedRunner::new());
        let bench = TestbenchRunner::new(config(), "project", Box::new(Arc::clone(&sim))).unwrap();
        assert!(bench.root().is_absolute());
        assert!(bench.root().ends_with("project"));
        assert!(bench.log_dir().is_absolute());
    }

    #[test]
    fn commands_use_absolute_paths() {
        let dir = tempfile::tempdir_in(".").unwrap();
        let relative = dir.path().to_path_buf();
        assert!(relative.is_relative());
        write_project(&relative);

        let sim = Arc::new(SimulatedRunner::new().with_fallback("passed0"));
        let bench = TestbenchRunner::new(config(), &relative, Box::new(Arc::clone(&sim))).unwrap();
        bench.run(&RunRequest::new("vhd/design.vhd"), |_| {}).unwrap();

        let absolute = std::path::absolute(&relative).unwrap();
        let script = &sim.scripts()[0];
        assert!(script.contains(&absolute.join("lib").display().to_string()));
        assert!(script.contains(&absolute.join("vhd/design.vhd").display().to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn settings_scripts_are_sourced_from_log_dir() {
        // a relative root must still reach lib/ once the shell runs inside log/
        let dir = tempfile::tempdir_in(".").unwrap();
        let relative = dir.path().to_path_buf();
        write_project(&relative);
        fs::write(
            relative.join("lib").join(crate::config::DEFAULT_SETTINGS_SCRIPTS[0]),
            "echo passed0\n",
        )
        .unwrap();

        let bench = TestbenchRunner::new(
            config(),
            &relative,
            Box::new(crate::shell::ShellRunner::new(ShellFlavor::Posix)),
        )
        .unwrap();
        let summary = bench
            .run(&RunRequest::new("vhd/design.vhd"), |_| {})
            .unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.passed, 1);
        assert!(!relative.join("log").exists());
    }
}
