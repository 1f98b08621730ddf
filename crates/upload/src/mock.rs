//! In-memory transport for tests.
//!
//! Remote paths are mapped onto a local directory standing in for the
//! remote filesystem (`/srv/x` becomes `<root>/srv/x`).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pushdeck_protocol::ConnectionCredentials;

use crate::error::TransportError;
use crate::remote::{RemoteFuture, RemoteShell, RemoteWriter, SessionConnector, StepCallback};
use crate::types::ExecOutput;

/// Failure switches.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    pub fail_connect: bool,
    pub hang_connect: bool,
    /// Fails `put_file` (the batch primary strategy).
    pub fail_put: bool,
    /// Fails `fast_put`.
    pub fail_fast_put: bool,
    /// Fails `fast_put` only for remote paths ending with this suffix.
    pub fail_fast_put_suffix: Option<String>,
    /// Fails `open_write` (the fallback strategy).
    pub fail_fallback: bool,
    /// Exit code returned by `mkdir`.
    pub mkdir_exit_code: u32,
    /// Stores only half of every put, so sizes mismatch.
    pub truncate_puts: bool,
}

/// Counters shared between the connector and every shell it opened.
#[derive(Debug, Default)]
pub struct MockState {
    connects: AtomicUsize,
    disposes: AtomicUsize,
    puts: AtomicUsize,
    fast_puts: AtomicUsize,
    fallbacks: AtomicUsize,
    fast_puts_in_flight: AtomicUsize,
    peak_fast_puts_in_flight: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl MockState {
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn dispose_count(&self) -> usize {
        self.disposes.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn fast_put_count(&self) -> usize {
        self.fast_puts.load(Ordering::SeqCst)
    }

    /// Highest number of `fast_put` calls observed running at once.
    pub fn peak_fast_puts_in_flight(&self) -> usize {
        self.peak_fast_puts_in_flight.load(Ordering::SeqCst)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

pub struct MockConnector {
    root: PathBuf,
    behavior: MockBehavior,
    state: Arc<MockState>,
}

impl MockConnector {
    pub fn new(root: &Path, behavior: MockBehavior) -> Self {
        Self {
            root: root.to_path_buf(),
            behavior,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn state(&self) -> &MockState {
        &self.state
    }

    /// Local location of a remote path.
    pub fn remote(&self, path: &str) -> PathBuf {
        map_remote(&self.root, path)
    }
}

impl SessionConnector for MockConnector {
    fn connect<'a>(
        &'a self,
        _credentials: &'a ConnectionCredentials,
    ) -> RemoteFuture<'a, Box<dyn RemoteShell>> {
        Box::pin(async move {
            if self.behavior.hang_connect {
                std::future::pending::<()>().await;
            }
            if self.behavior.fail_connect {
                return Err(TransportError::new("connection refused"));
            }
            self.state.connects.fetch_add(1, Ordering::SeqCst);
            let shell: Box<dyn RemoteShell> = Box::new(MockShell {
                root: self.root.clone(),
                behavior: self.behavior.clone(),
                state: Arc::clone(&self.state),
            });
            Ok(shell)
        })
    }
}

struct MockShell {
    root: PathBuf,
    behavior: MockBehavior,
    state: Arc<MockState>,
}

impl MockShell {
    async fn copy(&self, local: &Path, remote: &str) -> Result<u64, TransportError> {
        let target = map_remote(&self.root, remote);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let size = tokio::fs::copy(local, &target).await.map_err(io_err)?;
        if self.behavior.truncate_puts {
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .open(&target)
                .await
                .map_err(io_err)?;
            file.set_len(size / 2).await.map_err(io_err)?;
        }
        Ok(size)
    }
}

impl RemoteShell for MockShell {
    fn exec<'a>(&'a self, command: &'a str) -> RemoteFuture<'a, ExecOutput> {
        Box::pin(async move {
            self.state.commands.lock().unwrap().push(command.to_string());
            let words = split_quoted(command);
            if words.first().map(String::as_str) == Some("mkdir") {
                if self.behavior.mkdir_exit_code != 0 {
                    return Ok(ExecOutput {
                        exit_code: Some(self.behavior.mkdir_exit_code),
                        stdout: String::new(),
                        stderr: "mkdir: Permission denied".into(),
                    });
                }
                for dir in words.iter().skip(1).filter(|w| !w.starts_with('-')) {
                    tokio::fs::create_dir_all(map_remote(&self.root, dir))
                        .await
                        .map_err(io_err)?;
                }
            }
            Ok(ExecOutput {
                exit_code: Some(0),
                ..Default::default()
            })
        })
    }

    fn fast_put<'a>(
        &'a self,
        local: &'a Path,
        remote: &'a str,
        step: StepCallback<'a>,
    ) -> RemoteFuture<'a, u64> {
        Box::pin(async move {
            self.state.fast_puts.fetch_add(1, Ordering::SeqCst);
            let suffix_hit = self
                .behavior
                .fail_fast_put_suffix
                .as_deref()
                .is_some_and(|s| remote.ends_with(s));
            if self.behavior.fail_fast_put || suffix_hit {
                return Err(TransportError::new("fast put failed"));
            }
            let running = self.state.fast_puts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.state
                .peak_fast_puts_in_flight
                .fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let copied = self.copy(local, remote).await;
            self.state.fast_puts_in_flight.fetch_sub(1, Ordering::SeqCst);
            let size = copied?;
            step(size / 2, size);
            step(size, size);
            Ok(size)
        })
    }

    fn put_file<'a>(&'a self, local: &'a Path, remote: &'a str) -> RemoteFuture<'a, u64> {
        Box::pin(async move {
            self.state.puts.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail_put {
                return Err(TransportError::new("put rejected by server"));
            }
            self.copy(local, remote).await
        })
    }

    fn open_write<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, RemoteWriter> {
        Box::pin(async move {
            self.state.fallbacks.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail_fallback {
                return Err(TransportError::new("cannot open remote file"));
            }
            let target = map_remote(&self.root, remote);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            let file = tokio::fs::File::create(&target).await.map_err(io_err)?;
            let writer: RemoteWriter = Box::new(file);
            Ok(writer)
        })
    }

    fn stat_size<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, Option<u64>> {
        Box::pin(async move {
            match tokio::fs::metadata(map_remote(&self.root, remote)).await {
                Ok(m) => Ok(Some(m.len())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_err(e)),
            }
        })
    }

    fn close(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.state.disposes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

fn io_err(e: std::io::Error) -> TransportError {
    TransportError::new(e.to_string())
}

fn map_remote(root: &Path, remote: &str) -> PathBuf {
    root.join(remote.trim_start_matches('/'))
}

/// Splits a command line honouring POSIX single quotes and backslashes.
fn split_quoted(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quote = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == '\'' {
                in_quote = false;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '\'' => {
                in_quote = true;
                in_word = true;
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[test]
fn split_quoted_handles_escaped_quotes() {
    assert_eq!(
        split_quoted("mkdir -p '/srv/it'\\''s here' '/b'"),
        vec!["mkdir", "-p", "/srv/it's here", "/b"]
    );
}
