//! Running a materialized script and streaming its output.
//!
//! A [`ScriptSession`] moves through [`SessionState`] in order:
//! `Created → Started → Streaming → Completed → CleanedUp`. A non-zero exit
//! code is a normal completion. The script file is deleted on every path,
//! including a failed launch and a dropped (cancelled) run future.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::config::{RunnerConfig, DEFAULT_LINE_BUFFER};
use crate::error::{Error, Result};
use crate::file_handling::MaterializedScript;
use crate::sink::OutputSink;

/// Exit code reported when the process ended without one (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

const SPAWN_ATTEMPTS: u32 = 5;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// The final line delivered to the sink for every completed session.
pub fn exit_message(exit_code: i32) -> String {
    format!("Script exited with exit code: {exit_code}.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Started,
    Streaming,
    Completed,
    CleanedUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct ScriptSession {
    script: Option<MaterializedScript>,
    working_directory: PathBuf,
    interpreter: Option<String>,
    interpreter_args: Vec<String>,
    environment: HashMap<String, String>,
    line_buffer: usize,
    state: SessionState,
}

impl ScriptSession {
    pub fn new(script: MaterializedScript, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            script: Some(script),
            working_directory: working_directory.into(),
            interpreter: None,
            interpreter_args: Vec::new(),
            environment: HashMap::new(),
            line_buffer: DEFAULT_LINE_BUFFER,
            state: SessionState::Created,
        }
    }

    /// Applies the interpreter, environment and buffer settings from `config`.
    pub fn with_config(mut self, config: &RunnerConfig) -> Self {
        self.interpreter = config.interpreter.clone();
        self.interpreter_args = config.interpreter_args.clone();
        self.environment = config.environment.clone();
        self.line_buffer = config.line_buffer();
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Path of the script this session will run, until the run starts.
    pub fn script_path(&self) -> Option<&Path> {
        self.script.as_ref().map(MaterializedScript::path)
    }

    /// Runs the script to completion, streaming every output line to `sink`
    /// and finishing with [`exit_message`].
    ///
    /// The script file is deleted before this returns, whatever the outcome.
    /// If the returned future is dropped early the child is killed and the
    /// file is deleted as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`] if the process cannot be started, or an error
    /// if waiting on it fails. A non-zero exit code is not an error.
    pub async fn run(&mut self, sink: Arc<dyn OutputSink>) -> Result<ExecutionResult> {
        let script = self
            .script
            .take()
            .ok_or_else(|| Error::Misc("script session has already run".to_string()))?;

        let outcome = self.execute(script.path(), &sink).await;
        self.clean_up(script);

        outcome.map(|exit_code| ExecutionResult { exit_code })
    }

    async fn execute(&mut self, script_path: &Path, sink: &Arc<dyn OutputSink>) -> Result<i32> {
        let mut command = self.build_command(script_path);
        info!(
            "Launching `{}` in `{}`",
            script_path.display(),
            self.working_directory.display()
        );

        let mut child = spawn_with_retry(&mut command)
            .await
            .map_err(|e| Error::launch_error(script_path.display().to_string(), e))?;
        self.transition(SessionState::Started);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Misc("script stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Misc("script stderr was not captured".to_string()))?;

        let (sender, receiver) = mpsc::channel(self.line_buffer);
        let consumer = tokio::spawn(deliver_lines(receiver, Arc::clone(sink)));
        let stdout_reader =
            tokio::spawn(forward_lines(stdout, StreamSource::Stdout, sender.clone()));
        let stderr_reader = tokio::spawn(forward_lines(stderr, StreamSource::Stderr, sender));
        self.transition(SessionState::Streaming);

        let status = child.wait().await?;

        // Both readers hold a sender; the consumer finishes once they reach EOF.
        let (stdout_result, stderr_result) = tokio::join!(stdout_reader, stderr_reader);
        stdout_result?;
        stderr_result?;
        if let Err(e) = consumer.await {
            warn!("Output delivery task failed: {e}");
        }

        let exit_code = status.code().unwrap_or(NO_EXIT_CODE);
        deliver(&**sink, &exit_message(exit_code));
        self.transition(SessionState::Completed);

        Ok(exit_code)
    }

    fn build_command(&self, script_path: &Path) -> Command {
        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.args(&self.interpreter_args).arg(script_path);
                command
            }
            None => Command::new(script_path),
        };

        command
            .current_dir(&self.working_directory)
            .envs(&self.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        command
    }

    fn clean_up(&mut self, script: MaterializedScript) {
        let path = script.path().display().to_string();
        if let Err(e) = script.close() {
            warn!("Failed to delete materialized script `{path}`: {e}");
        }
        self.transition(SessionState::CleanedUp);
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Script session {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Runs an existing script file and deletes it afterwards.
///
/// # Errors
///
/// See [`ScriptSession::run`].
pub async fn run_script(
    script_path: impl Into<PathBuf>,
    working_directory: impl Into<PathBuf>,
    sink: Arc<dyn OutputSink>,
) -> Result<ExecutionResult> {
    let script = MaterializedScript::adopt(script_path)?;
    ScriptSession::new(script, working_directory).run(sink).await
}

// A script that was just written can still be open in a child forked
// concurrently by another thread, which makes exec fail with ETXTBSY.
async fn spawn_with_retry(command: &mut Command) -> io::Result<Child> {
    let mut attempt = 1;
    loop {
        match command.spawn() {
            Err(e) if attempt < SPAWN_ATTEMPTS && is_text_file_busy(&e) => {
                debug!("Script busy on spawn attempt {attempt}, retrying");
                tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn is_text_file_busy(error: &io::Error) -> bool {
    // ETXTBSY on Linux and macOS
    cfg!(unix) && error.raw_os_error() == Some(26)
}

async fn forward_lines(
    stream: impl AsyncRead + Unpin,
    source: StreamSource,
    sender: mpsc::Sender<String>,
) {
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    let mut delivering = true;

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_ending(&buffer)).into_owned();
                // Keep draining after the consumer is gone so the child never blocks on a full pipe.
                if delivering && sender.send(line).await.is_err() {
                    warn!("Output consumer stopped, discarding further {source:?} lines");
                    delivering = false;
                }
            }
            Err(e) => {
                warn!("Failed reading script {source:?}: {e}");
                break;
            }
        }
    }
}

async fn deliver_lines(mut receiver: mpsc::Receiver<String>, sink: Arc<dyn OutputSink>) {
    while let Some(line) = receiver.recv().await {
        deliver(&*sink, &line);
    }
}

fn deliver(sink: &dyn OutputSink, line: &str) {
    if let Err(e) = sink.accept(line) {
        warn!("Output sink rejected a line: {e}");
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_exit_message_format() {
        assert_eq!(exit_message(3), "Script exited with exit code: 3.");
        assert_eq!(exit_message(-1), "Script exited with exit code: -1.");
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"line\n"), b"line");
        assert_eq!(trim_line_ending(b"line\r\n"), b"line");
        assert_eq!(trim_line_ending(b"last"), b"last");
        assert_eq!(trim_line_ending(b"\n"), b"");
    }

    #[test]
    fn test_execution_result_success() {
        assert!(ExecutionResult { exit_code: 0 }.success());
        assert!(!ExecutionResult { exit_code: 3 }.success());
    }

    #[test]
    fn test_new_session_is_created() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("pending.sh");
        std::fs::write(&path, "true").unwrap();

        let script = MaterializedScript::adopt(&path).unwrap();
        let session = ScriptSession::new(script, directory.path());
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.script_path(), Some(path.as_path()));
    }

    #[test]
    fn test_with_config_copies_settings() {
        let directory = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            interpreter: Some("sh".to_string()),
            interpreter_args: vec!["-e".to_string()],
            line_buffer: 0,
            ..RunnerConfig::default()
        };

        let session = ScriptSession::new(
            MaterializedScript::adopt(directory.path().join("s.sh")).unwrap(),
            directory.path(),
        )
        .with_config(&config);
        assert_eq!(session.interpreter.as_deref(), Some("sh"));
        assert_eq!(session.interpreter_args, vec!["-e"]);
        assert_eq!(session.line_buffer, 1);
    }

    #[tokio::test]
    async fn test_run_twice_is_rejected() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing.sh");
        let script = MaterializedScript::adopt(&path).unwrap();
        let mut session = ScriptSession::new(script, directory.path());
        let sink = Arc::new(MemorySink::new());

        // The file does not exist, so the first run fails to launch.
        assert!(matches!(
            session.run(sink.clone()).await,
            Err(Error::Launch { .. })
        ));
        assert_eq!(session.state(), SessionState::CleanedUp);
        assert!(matches!(session.run(sink.clone()).await, Err(Error::Misc(_))));
        assert!(sink.lines().is_empty());
    }
}
