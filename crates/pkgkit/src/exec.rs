//! Running external commands.
//!
//! Backends never spawn processes themselves; they hand a finished argument
//! vector to a [`CommandRunner`]. [`SystemRunner`] executes it for real,
//! [`ScriptedRunner`] replays canned replies so command construction and
//! output parsing can be tested without touching the system.

use crate::types::{Captured, CommandStatus};
use std::collections::VecDeque;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Exit status
    pub status: CommandStatus,
    /// Output, present when the command was run with capture enabled
    pub captured: Option<Captured>,
}

/// Something that can run an argument vector.
pub trait CommandRunner: Send {
    /// Run `argv` synchronously, inheriting the environment.
    ///
    /// When `capture` is true stdout and stderr are collected, otherwise the
    /// command writes straight to the terminal. Failures are reported through
    /// the returned status, never as a panic or error.
    fn run(&self, argv: &[String], capture: bool) -> Execution;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Create a runner that kills commands after `timeout`, if given.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, program: &str) -> CommandStatus {
        let waited = match self.timeout {
            Some(limit) => match child.wait_timeout(limit) {
                Ok(Some(status)) => Ok(status),
                Ok(None) => {
                    log::error!(
                        "{program} did not finish within {}s, killing it",
                        limit.as_secs()
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill {program}: {e}");
                    }
                    let _ = child.wait();
                    return CommandStatus::timeout();
                }
                Err(e) => Err(e),
            },
            None => child.wait(),
        };

        match waited {
            Ok(status) => status
                .code()
                .map_or_else(CommandStatus::abnormal, CommandStatus::exited),
            Err(e) => {
                log::error!("Failed to wait for {program}: {e}");
                CommandStatus::abnormal()
            }
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], capture: bool) -> Execution {
        let Some((program, args)) = argv.split_first() else {
            log::error!("Refusing to run an empty command");
            return Execution {
                status: CommandStatus::abnormal(),
                captured: capture.then(Captured::default),
            };
        };

        log::debug!("Running: {}", argv.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to execute {program}: {e}");
                return Execution {
                    status: CommandStatus::abnormal(),
                    captured: capture.then(Captured::default),
                };
            }
        };

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
        let readers = capture.then(|| (drain(child.stdout.take()), drain(child.stderr.take())));
        let status = self.wait(&mut child, program);

        let captured = readers.map(|(stdout, stderr)| {
            if status.timed_out {
                // Reader threads are detached. Descendants of the killed child
                // may keep the pipes open; each thread ends when the last
                // writer closes. The child stays in our process group so
                // elevation prompts keep the terminal.
                drop(stdout);
                drop(stderr);
                Captured::default()
            } else {
                Captured {
                    stdout: collect(stdout),
                    stderr: collect(stderr),
                }
            }
        });

        if !status.success && !status.timed_out {
            match &captured {
                Some(out) if !out.stderr.trim().is_empty() => log::error!(
                    "{program} failed with exit code {}: {}",
                    status.exit_code,
                    out.stderr.trim()
                ),
                _ => log::error!("{program} failed with exit code {}", status.exit_code),
            }
        }

        Execution { status, captured }
    }
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Runner that records every command and answers with queued replies.
///
/// Clones share state, so a test can keep one handle while the backend owns
/// another. Once the queue is empty every command succeeds with no output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    replies: Arc<Mutex<VecDeque<(CommandStatus, Captured)>>>,
}

impl ScriptedRunner {
    /// Create a runner with no queued replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply with the given exit code and stdout.
    pub fn reply(self, exit_code: i32, stdout: &str) -> Self {
        self.reply_with(
            CommandStatus::exited(exit_code),
            Captured {
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    /// Queue an arbitrary reply.
    pub fn reply_with(self, status: CommandStatus, captured: Captured) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((status, captured));
        self
    }

    /// Every argument vector run so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent argument vector, if any.
    pub fn last_call(&self) -> Option<Vec<String>> {
        self.calls().pop()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[String], capture: bool) -> Execution {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(argv.to_vec());

        let (status, captured) = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| (CommandStatus::exited(0), Captured::default()));

        Execution {
            status,
            captured: capture.then_some(captured),
        }
    }
}
