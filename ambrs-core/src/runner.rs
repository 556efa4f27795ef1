//! Running an external simulator once per ensemble member
//!
//! [`PoolRunner`] writes each input bundle into its own job directory and
//! runs the executable there, with at most `max_workers` processes alive at
//! once. Jobs are independent: a failing job is recorded in its
//! [`JobResult`] and the remaining jobs carry on. Results are returned in
//! member order regardless of the order in which jobs finish.
//!
//! The command line is built from an invocation template in which `{exe}` is
//! replaced by the executable path and `{prefix}` by the job's file prefix,
//! e.g. `"{exe} {prefix}.nl"`. The template is split on whitespace before
//! substitution, so paths containing spaces are passed as single arguments.

use crate::config::RunnerConfig;
use crate::errors::{AmbrsError, AmbrsResult};
use crate::input::InputBundle;
use rayon::ThreadPoolBuilder;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File prefix used when a bundle does not ask for one.
pub const DEFAULT_PREFIX: &str = "ambrs_input";

const EXE_TOKEN: &str = "{exe}";
const PREFIX_TOKEN: &str = "{prefix}";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shared flag used to stop a run early.
///
/// Cancelling stops new jobs from starting and kills running ones. Clones
/// share the same flag, and a cancelled token stays cancelled; pass a fresh
/// token to each [`PoolRunner::run_with_cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a single job failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("failed to write job inputs: {0}")]
    InputWrite(String),
    #[error("failed to start process: {0}")]
    Spawn(String),
    #[error("process exited with code {code}")]
    NonZeroExit { code: i32 },
    #[error("process terminated abnormally ({status})")]
    Crashed { status: String },
    #[error("process exceeded the job timeout of {seconds}s")]
    TimedOut { seconds: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded,
    Failed(ExecutionError),
    /// The run was cancelled or timed out before this job finished
    Cancelled,
}

/// The record of a single job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    /// Member index
    pub index: usize,
    pub prefix: String,
    pub working_directory: PathBuf,
    pub outcome: JobOutcome,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Succeeded
    }
}

/// Counts of job outcomes across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunSummary {
    pub fn from_results(results: &[JobResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result.outcome {
                    JobOutcome::Succeeded => summary.succeeded += 1,
                    JobOutcome::Failed(_) => summary.failed += 1,
                    JobOutcome::Cancelled => summary.cancelled += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} cancelled",
            self.succeeded, self.failed, self.cancelled
        )
    }
}

/// Runs an executable over a sequence of input bundles with bounded parallelism.
#[derive(Debug, Clone)]
pub struct PoolRunner {
    executable: PathBuf,
    invocation: String,
    root: PathBuf,
    max_workers: usize,
    job_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl PoolRunner {
    /// Create a runner writing job directories under `root`.
    ///
    /// `invocation` must contain both `{exe}` and `{prefix}`. The worker
    /// count defaults to the number of available threads.
    pub fn new(
        executable: impl Into<PathBuf>,
        invocation: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> AmbrsResult<Self> {
        let invocation = invocation.into();
        for token in [EXE_TOKEN, PREFIX_TOKEN] {
            if !invocation.contains(token) {
                return Err(AmbrsError::Config(format!(
                    "invocation '{}' does not contain '{}'",
                    invocation, token
                )));
            }
        }

        Ok(Self {
            executable: executable.into(),
            invocation,
            root: root.into(),
            max_workers: rayon::current_num_threads(),
            job_timeout: None,
            timeout: None,
        })
    }

    pub fn from_config(config: &RunnerConfig) -> AmbrsResult<Self> {
        if config.executable.as_os_str().is_empty() {
            return Err(AmbrsError::Config(
                "runner configuration does not name an executable".to_string(),
            ));
        }
        let mut runner = Self::new(&config.executable, &config.invocation, &config.root)?;
        if let Some(max_workers) = config.max_workers {
            runner = runner.with_max_workers(max_workers);
        }
        if let Some(seconds) = config.job_timeout_secs {
            runner = runner.with_job_timeout(seconds_to_duration("job_timeout_secs", seconds)?);
        }
        if let Some(seconds) = config.timeout_secs {
            runner = runner.with_timeout(seconds_to_duration("timeout_secs", seconds)?);
        }
        Ok(runner)
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Kill any single job that runs longer than `timeout`.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    /// Cancel the whole run once `timeout` has elapsed since it started.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run one job per bundle and return the results in bundle order.
    ///
    /// Only setup problems (an unusable root directory or worker count) are
    /// returned as errors. Everything that goes wrong inside a job is
    /// reported in that job's result.
    pub fn run<B: InputBundle>(&self, jobs: &[B]) -> AmbrsResult<Vec<JobResult>> {
        self.run_with_cancel(jobs, &CancelToken::new())
    }

    /// As [`PoolRunner::run`], stopping early once `cancel` is cancelled.
    pub fn run_with_cancel<B: InputBundle>(
        &self,
        jobs: &[B],
        cancel: &CancelToken,
    ) -> AmbrsResult<Vec<JobResult>> {
        if self.max_workers == 0 {
            return Err(AmbrsError::Config(
                "runner needs at least one worker".to_string(),
            ));
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        fs::create_dir_all(&self.root)?;

        let executable = self.resolved_executable()?;
        let width = jobs.len().to_string().len();
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| AmbrsError::Config(format!("failed to build worker pool: {}", e)))?;

        info!(
            executable = %executable.display(),
            root = %self.root.display(),
            jobs = jobs.len(),
            workers = self.max_workers,
            "Starting run"
        );

        let (sender, receiver) = mpsc::channel();
        pool.scope(|scope| {
            for (index, bundle) in jobs.iter().enumerate() {
                let sender = sender.clone();
                let executable = &executable;
                scope.spawn(move |_| {
                    let stop = Stop { cancel, deadline };
                    let result = self.run_job(executable, index, width, bundle, &stop);
                    // The receiver outlives the scope
                    let _ = sender.send(result);
                });
            }
        });
        drop(sender);

        let mut slots: Vec<Option<JobResult>> = (0..jobs.len()).map(|_| None).collect();
        for result in receiver {
            let index = result.index;
            slots[index] = Some(result);
        }
        let results: Vec<JobResult> = slots.into_iter().flatten().collect();

        let summary = RunSummary::from_results(&results);
        info!(%summary, "Run finished");
        Ok(results)
    }

    /// Relative paths are resolved now because jobs run inside their own directory.
    fn resolved_executable(&self) -> AmbrsResult<PathBuf> {
        if self.executable.is_relative() && self.executable.components().count() > 1 {
            Ok(std::env::current_dir()?.join(&self.executable))
        } else {
            Ok(self.executable.clone())
        }
    }

    fn command_line(&self, executable: &Path, prefix: &str) -> Vec<String> {
        let executable = executable.to_string_lossy();
        self.invocation
            .split_whitespace()
            .map(|word| {
                word.replace(EXE_TOKEN, &executable)
                    .replace(PREFIX_TOKEN, prefix)
            })
            .collect()
    }

    fn run_job<B: InputBundle>(
        &self,
        executable: &Path,
        index: usize,
        width: usize,
        bundle: &B,
        stop: &Stop<'_>,
    ) -> JobResult {
        let prefix = bundle.prefix().unwrap_or(DEFAULT_PREFIX).to_string();
        let working_directory = self.root.join(format!("{:0width$}", index, width = width));
        let mut result = JobResult {
            index,
            prefix,
            working_directory,
            outcome: JobOutcome::Cancelled,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };

        if stop.now() {
            debug!(index, "Job cancelled before starting");
            return result;
        }

        let prepared = fs::create_dir_all(&result.working_directory)
            .map_err(AmbrsError::from)
            .and_then(|_| bundle.write(&result.working_directory, &result.prefix));
        if let Err(e) = prepared {
            warn!(index, error = %e, "Failed to write job inputs");
            result.outcome = JobOutcome::Failed(ExecutionError::InputWrite(e.to_string()));
            return result;
        }

        debug!(index, dir = %result.working_directory.display(), "Starting job");
        let mut child = match self.spawn(executable, &result.working_directory, &result.prefix) {
            Ok(child) => child,
            Err(e) => {
                warn!(index, error = %e, "Failed to start job");
                result.outcome = JobOutcome::Failed(e);
                return result;
            }
        };

        let waited = self.wait(&mut child, stop);

        result.stdout = read_capture(&result.working_directory, &result.prefix, "stdout");
        result.stderr = read_capture(&result.working_directory, &result.prefix, "stderr");

        result.outcome = match waited {
            Wait::Exited(status) => {
                result.exit_code = status.code();
                status_outcome(status)
            }
            Wait::Cancelled => JobOutcome::Cancelled,
            Wait::TimedOut(limit) => JobOutcome::Failed(ExecutionError::TimedOut {
                seconds: limit.as_secs_f64(),
            }),
            Wait::Failed(e) => JobOutcome::Failed(e),
        };

        match &result.outcome {
            JobOutcome::Succeeded => debug!(index, "Job succeeded"),
            JobOutcome::Failed(e) => warn!(index, error = %e, "Job failed"),
            JobOutcome::Cancelled => warn!(index, "Job cancelled while running"),
        }
        result
    }

    fn spawn(&self, executable: &Path, dir: &Path, prefix: &str) -> Result<Child, ExecutionError> {
        let command_line = self.command_line(executable, prefix);
        let (program, args) = command_line
            .split_first()
            .ok_or_else(|| ExecutionError::Spawn("empty command line".to_string()))?;

        let capture = |extension: &str| {
            File::create(dir.join(format!("{}.{}", prefix, extension)))
                .map_err(|e| ExecutionError::Spawn(format!("cannot capture {}: {}", extension, e)))
        };

        Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(capture("stdout")?)
            .stderr(capture("stderr")?)
            .spawn()
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", program, e)))
    }

    fn wait(&self, child: &mut Child, stop: &Stop<'_>) -> Wait {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Wait::Exited(status),
                Ok(None) => {}
                Err(e) => {
                    kill(child);
                    return Wait::Failed(ExecutionError::Spawn(e.to_string()));
                }
            }

            if stop.now() {
                kill(child);
                return Wait::Cancelled;
            }
            if let Some(limit) = self.job_timeout {
                if started.elapsed() >= limit {
                    kill(child);
                    return Wait::TimedOut(limit);
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// A run stops once it is cancelled or its deadline passes.
struct Stop<'a> {
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
}

impl Stop<'_> {
    fn now(&self) -> bool {
        self.cancel.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

enum Wait {
    Exited(ExitStatus),
    Cancelled,
    TimedOut(Duration),
    Failed(ExecutionError),
}

fn kill(child: &mut Child) {
    // The process may already have exited
    let _ = child.kill();
    let _ = child.wait();
}

/// Captured output of a job; missing or unreadable captures read as empty.
fn read_capture(dir: &Path, prefix: &str, extension: &str) -> String {
    fs::read_to_string(dir.join(format!("{}.{}", prefix, extension))).unwrap_or_default()
}

fn status_outcome(status: ExitStatus) -> JobOutcome {
    if status.success() {
        JobOutcome::Succeeded
    } else if let Some(code) = status.code() {
        JobOutcome::Failed(ExecutionError::NonZeroExit { code })
    } else {
        JobOutcome::Failed(ExecutionError::Crashed {
            status: status.to_string(),
        })
    }
}

fn seconds_to_duration(field: &str, seconds: f64) -> AmbrsResult<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        AmbrsError::Config(format!("invalid {} = {}: {}", field, seconds, e))
    })
}

/// Run `executable` once per bundle in `jobs` with at most `max_workers` at a time.
pub fn run<B: InputBundle>(
    executable: impl Into<PathBuf>,
    invocation: &str,
    root: impl Into<PathBuf>,
    jobs: &[B],
    max_workers: usize,
) -> AmbrsResult<Vec<JobResult>> {
    PoolRunner::new(executable, invocation, root)?
        .with_max_workers(max_workers)
        .run(jobs)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Writes `<prefix>.in` containing the behaviour the test script should follow.
    struct ScriptedJob {
        behaviour: &'static str,
        prefix: Option<&'static str>,
    }

    impl ScriptedJob {
        fn new(behaviour: &'static str) -> Self {
            Self {
                behaviour,
                prefix: None,
            }
        }
    }

    impl InputBundle for ScriptedJob {
        fn prefix(&self) -> Option<&str> {
            self.prefix
        }

        fn write(&self, dir: &Path, prefix: &str) -> AmbrsResult<()> {
            fs::write(dir.join(format!("{}.in", prefix)), self.behaviour)?;
            Ok(())
        }
    }

    const SCRIPT: &str = r#"#!/bin/sh
mode=$(cat "$1.in")
echo "running $1"
case "$mode" in
  fail) echo "boom" >&2; exit 3 ;;
  sleep) exec sleep 5 ;;
  crash) kill -9 $$ ;;
  overlap)
    echo start >> ../events.log
    sleep 0.3
    echo end >> ../events.log
    ;;
esac
"#;

    fn script(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("simulator.sh");
        fs::write(&path, SCRIPT).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn runner(dir: &TempDir) -> PoolRunner {
        PoolRunner::new(script(dir), "{exe} {prefix}", dir.path().join("runs")).unwrap()
    }

    #[test]
    fn failing_job_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<ScriptedJob> = (0..12)
            .map(|i| ScriptedJob::new(if i == 5 { "fail" } else { "ok" }))
            .collect();

        let results = runner(&dir).with_max_workers(3).run(&jobs).unwrap();

        assert_eq!(results.len(), 12);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert_eq!(
                result.working_directory,
                dir.path().join("runs").join(format!("{:02}", i))
            );
            assert!(result.stdout.contains("running ambrs_input"));
            assert!(result.working_directory.join("ambrs_input.in").exists());
        }

        let failed = &results[5];
        assert_eq!(
            failed.outcome,
            JobOutcome::Failed(ExecutionError::NonZeroExit { code: 3 })
        );
        assert_eq!(failed.exit_code, Some(3));
        assert!(failed.stderr.contains("boom"));

        let summary = RunSummary::from_results(&results);
        assert_eq!(summary.succeeded, 11);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn free_function_runs_every_job() {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<ScriptedJob> = (0..4).map(|_| ScriptedJob::new("ok")).collect();

        let results = run(script(&dir), "{exe} {prefix}", dir.path().join("runs"), &jobs, 2).unwrap();
        assert!(results.iter().all(JobResult::is_success));
        assert_eq!(results[3].working_directory, dir.path().join("runs").join("3"));
    }

    #[test]
    fn bundle_prefix_is_used() {
        let dir = TempDir::new().unwrap();
        let jobs = [ScriptedJob {
            behaviour: "ok",
            prefix: Some("box"),
        }];

        let results = runner(&dir).run(&jobs).unwrap();
        assert_eq!(results[0].prefix, "box");
        assert!(results[0].stdout.contains("running box"));
        assert!(results[0].working_directory.join("box.stdout").exists());
    }

    #[test]
    fn job_timeout_kills_slow_jobs() {
        let dir = TempDir::new().unwrap();
        let jobs = [ScriptedJob::new("ok"), ScriptedJob::new("sleep")];

        let started = Instant::now();
        let results = runner(&dir)
            .with_job_timeout(Duration::from_millis(300))
            .run(&jobs)
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(results[0].is_success());
        assert!(matches!(
            results[1].outcome,
            JobOutcome::Failed(ExecutionError::TimedOut { .. })
        ));
    }

    #[test]
    fn overall_timeout_cancels_remaining_jobs() {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<ScriptedJob> = (0..3).map(|_| ScriptedJob::new("sleep")).collect();

        let started = Instant::now();
        let results = runner(&dir)
            .with_max_workers(1)
            .with_timeout(Duration::from_millis(300))
            .run(&jobs)
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.outcome == JobOutcome::Cancelled));
    }

    #[test]
    fn cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let cancel = CancelToken::new();
        cancel.cancel();

        let results = runner
            .run_with_cancel(&[ScriptedJob::new("ok")], &cancel)
            .unwrap();
        assert_eq!(results[0].outcome, JobOutcome::Cancelled);
        assert!(!results[0].working_directory.exists());
        assert_eq!(RunSummary::from_results(&results).cancelled, 1);

        // Later runs are unaffected
        let results = runner.run(&[ScriptedJob::new("ok")]).unwrap();
        assert!(results[0].is_success());
    }

    #[test]
    fn cancel_while_running() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let cancel = CancelToken::new();

        let started = Instant::now();
        let results = thread::scope(|scope| {
            let handle = cancel.clone();
            scope.spawn(move || {
                thread::sleep(Duration::from_millis(300));
                handle.cancel();
            });
            runner
                .run_with_cancel(&[ScriptedJob::new("sleep")], &cancel)
                .unwrap()
        });

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(results[0].outcome, JobOutcome::Cancelled);
        assert!(results[0].working_directory.join("ambrs_input.in").exists());
    }

    #[test]
    fn killed_job_is_a_crash() {
        let dir = TempDir::new().unwrap();
        let results = runner(&dir).run(&[ScriptedJob::new("crash")]).unwrap();

        assert!(matches!(
            results[0].outcome,
            JobOutcome::Failed(ExecutionError::Crashed { .. })
        ));
        assert_eq!(results[0].exit_code, None);
    }

    #[test]
    fn at_most_max_workers_run_at_once() {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<ScriptedJob> = (0..9).map(|_| ScriptedJob::new("overlap")).collect();

        let results = runner(&dir).with_max_workers(2).run(&jobs).unwrap();
        assert!(results.iter().all(JobResult::is_success));

        let events = fs::read_to_string(dir.path().join("runs").join("events.log")).unwrap();
        let mut running = 0_i32;
        let mut peak = 0;
        let mut starts = 0;
        for event in events.lines() {
            match event {
                "start" => {
                    running += 1;
                    starts += 1;
                }
                "end" => running -= 1,
                other => panic!("unexpected event {:?}", other),
            }
            peak = peak.max(running);
        }
        assert_eq!(starts, 9);
        assert_eq!(running, 0);
        assert!((1..=2).contains(&peak), "peak concurrency {}", peak);
    }

    #[test]
    fn missing_executable_is_a_job_failure() {
        let dir = TempDir::new().unwrap();
        let runner = PoolRunner::new(
            dir.path().join("does-not-exist"),
            "{exe} {prefix}",
            dir.path().join("runs"),
        )
        .unwrap();

        let results = runner.run(&[ScriptedJob::new("ok")]).unwrap();
        assert!(matches!(
            results[0].outcome,
            JobOutcome::Failed(ExecutionError::Spawn(_))
        ));
    }

    #[test]
    fn invocation_must_use_both_tokens() {
        assert!(matches!(
            PoolRunner::new("sim", "{exe} input.nl", "runs"),
            Err(AmbrsError::Config(_))
        ));
        assert!(matches!(
            PoolRunner::new("sim", "sim {prefix}", "runs"),
            Err(AmbrsError::Config(_))
        ));
    }

    #[test]
    fn from_config() {
        let config = RunnerConfig {
            executable: PathBuf::from("/opt/partmc/partmc"),
            invocation: "{exe} {prefix}.spec".to_string(),
            max_workers: Some(2),
            timeout_secs: Some(60.0),
            ..Default::default()
        };
        let runner = PoolRunner::from_config(&config).unwrap();
        assert_eq!(runner.max_workers(), 2);
        assert_eq!(runner.root(), Path::new("runs"));

        assert!(matches!(
            PoolRunner::from_config(&RunnerConfig::default()),
            Err(AmbrsError::Config(_))
        ));
        let negative = RunnerConfig {
            job_timeout_secs: Some(-1.0),
            ..config
        };
        assert!(matches!(
            PoolRunner::from_config(&negative),
            Err(AmbrsError::Config(_))
        ));
    }

    #[test]
    fn zero_workers_rejected() {
        let dir = TempDir::new().unwrap();
        let result = runner(&dir).with_max_workers(0).run(&[ScriptedJob::new("ok")]);
        assert!(matches!(result, Err(AmbrsError::Config(_))));
    }

    #[test]
    fn command_line_substitution() {
        let runner = PoolRunner::new("/opt/box model", "{exe} {prefix}.nl --quiet", "runs").unwrap();
        assert_eq!(
            runner.command_line(Path::new("/opt/box model"), "ambrs_input"),
            vec!["/opt/box model", "ambrs_input.nl", "--quiet"]
        );
    }
}
