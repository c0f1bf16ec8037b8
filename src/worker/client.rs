//! NDJSON client for an OLAP bridge process.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::error::{WorkerError, WorkerResult};
use super::protocol::{RequestEnvelope, ResponseEnvelope};

/// In-flight requests by id.
type Waiters = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Owns one bridge process. Requests may overlap: each carries a fresh
/// id and the reader task hands every response line to whoever waits on
/// that id. Dropping the client kills the bridge.
pub struct BridgeClient {
    stdin: Mutex<BufWriter<ChildStdin>>,
    waiters: Waiters,
    timeout: Duration,
    _child: Child,
    _reader: JoinHandle<()>,
}

impl BridgeClient {
    /// Start `path` with `args`; stderr passes through to ours.
    pub async fn spawn<P: AsRef<Path>>(
        path: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let mut child = Command::new(path.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let stdin = child.stdin.take().ok_or_else(|| pipe_missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| pipe_missing("stdout"))?;

        let waiters = Waiters::default();
        let reader = tokio::spawn(read_responses(stdout, waiters.clone()));

        Ok(Self {
            stdin: Mutex::new(BufWriter::new(stdin)),
            waiters,
            timeout,
            _child: child,
            _reader: reader,
        })
    }

    /// Call `method` and decode its result.
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let envelope = RequestEnvelope {
            id: uuid::Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };
        let mut line = serde_json::to_string(&envelope).map_err(WorkerError::SerializeFailed)?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        self.waiters.lock().await.insert(envelope.id.clone(), tx);

        if let Err(e) = self.write_line(&line).await {
            self.waiters.lock().await.remove(&envelope.id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            // The reader dropped every waiter on its way out.
            Ok(Err(_)) => return Err(WorkerError::WorkerExited),
            Err(_) => {
                self.waiters.lock().await.remove(&envelope.id);
                return Err(WorkerError::Timeout(self.timeout.as_secs()));
            }
        };

        match (response.success, response.error) {
            (false, Some(error)) => Err(error.into_error()),
            (false, None) => Err(WorkerError::remote("UNKNOWN", "bridge reported failure")),
            (true, _) => {
                let result = response.result.unwrap_or(serde_json::Value::Null);
                serde_json::from_value(result).map_err(WorkerError::DeserializeFailed)
            }
        }
    }

    async fn write_line(&self, line: &str) -> WorkerResult<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::WriteFailed)?;
        stdin.flush().await.map_err(WorkerError::WriteFailed)
    }
}

/// Route response lines to their waiters until the bridge closes stdout.
async fn read_responses(stdout: ChildStdout, waiters: Waiters) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                Ok(response) => match waiters.lock().await.remove(&response.id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("bridge: no waiter for response {}", response.id),
                },
                Err(e) => warn!("bridge: unreadable response line: {}", e),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("bridge: read error: {}", e);
                break;
            }
        }
    }

    let mut waiters = waiters.lock().await;
    warn!("bridge: process exited with {} request(s) pending", waiters.len());
    waiters.clear();
}

fn pipe_missing(which: &str) -> WorkerError {
    WorkerError::SpawnFailed(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("{} not captured", which),
    ))
}
