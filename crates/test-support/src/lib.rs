//! Helpers for the server's process-level integration tests.

use anyhow::Context as _;
use futures::TryStreamExt as _;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt as _, AsyncReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; another process may still bind it first.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Start the server binary on the HTTP transport.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub fn spawn_http_server(bin: &Path, port: u16, extra_args: &[&str]) -> anyhow::Result<KillOnDrop> {
    let child = Command::new(bin)
        .arg("--transport")
        .arg("http")
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("info")
        .args(extra_args)
        .stdin(Stdio::null())
        .spawn()
        .with_context(|| format!("spawn {}", bin.display()))?;
    Ok(KillOnDrop(child))
}

/// Poll an HTTP URL until it returns a success status.
///
/// # Errors
///
/// Returns an error if the timeout elapses first.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// One initialized MCP session against a streamable HTTP endpoint (`{base}/mcp`).
pub struct McpHttpSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
    next_id: std::sync::atomic::AtomicU64,
}

impl McpHttpSession {
    /// Run the `initialize` handshake and send `notifications/initialized`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the handshake or omits the session header.
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let endpoint = format!("{}/mcp", base_url.trim_end_matches('/'));

        let init = post(
            &client,
            &endpoint,
            None,
            &json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "animal-rescue-integration-tests", "version": "0" }
                }
            }),
        )
        .await?;

        let session_id = init
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|h| h.to_str().ok())
            .context("missing Mcp-Session-Id header")?
            .to_string();

        let init_msg = first_sse_json(init).await?;
        anyhow::ensure!(
            init_msg.pointer("/result/serverInfo").is_some(),
            "initialize result missing serverInfo: {init_msg}"
        );

        let ack = post(
            &client,
            &endpoint,
            Some(&session_id),
            &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await?;
        anyhow::ensure!(
            ack.status().as_u16() == 202,
            "notifications/initialized returned {}",
            ack.status()
        );

        Ok(Self {
            client,
            endpoint,
            session_id,
            next_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    /// Send a JSON-RPC request and return the full response message.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or if no response arrives within `timeout_dur`.
    pub async fn request(
        &self,
        method: &str,
        params: Value,
        timeout_dur: Duration,
    ) -> anyhow::Result<Value> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let resp = post(
            &self.client,
            &self.endpoint,
            Some(&self.session_id),
            &json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
        )
        .await?;

        tokio::time::timeout(timeout_dur, first_sse_json(resp))
            .await
            .context("timeout waiting for event-stream response")?
    }

    /// Call a tool and return its `result` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response carries a JSON-RPC error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let msg = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
                Duration::from_secs(5),
            )
            .await?;
        if let Some(err) = msg.get("error") {
            anyhow::bail!("tools/call {name} failed: {err}");
        }
        msg.get("result")
            .cloned()
            .with_context(|| format!("tools/call {name} missing result"))
    }
}

/// One initialized MCP session with a server child process speaking newline-delimited
/// JSON-RPC on stdin/stdout.
///
/// Every stdout line is parsed as JSON as it is read, and reading fails on the first line that
/// is not, so a session that completes proves stdout carried nothing but protocol messages.
pub struct McpStdioSession {
    child: tokio::process::Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: JoinHandle<std::io::Result<String>>,
    transcript: Vec<Value>,
    next_id: u64,
}

/// Everything a stdio server wrote, collected after its stdin was closed.
#[derive(Debug)]
pub struct StdioTranscript {
    /// Every stdout message, in order.
    pub stdout: Vec<Value>,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl McpStdioSession {
    /// Spawn `bin` with `extra_args` and run the `initialize` handshake.
    ///
    /// `RUST_LOG` and the server's transport variable are cleared so the child uses its
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or the handshake fails.
    pub async fn spawn(bin: &Path, extra_args: &[&str]) -> anyhow::Result<Self> {
        let mut child = tokio::process::Command::new(bin)
            .args(extra_args)
            .env_remove("RUST_LOG")
            .env_remove("ANIMAL_RESCUE_TRANSPORT")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", bin.display()))?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;
        let mut stderr = child.stderr.take().context("child stderr")?;
        let stderr = tokio::spawn(async move {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        });

        let mut session = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            stderr,
            transcript: Vec::new(),
            next_id: 0,
        };

        let init = session
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "animal-rescue-integration-tests", "version": "0" }
                }),
                Duration::from_secs(20),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/serverInfo").is_some(),
            "initialize result missing serverInfo: {init}"
        );

        session
            .send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await?;
        Ok(session)
    }

    /// Send a JSON-RPC request and return the response carrying the same id.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, on a stdout line that is not JSON, or if no response
    /// arrives within `timeout_dur`.
    pub async fn request(
        &mut self,
        method: &str,
        params: Value,
        timeout_dur: Duration,
    ) -> anyhow::Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;

        tokio::time::timeout(timeout_dur, async {
            loop {
                let msg = self
                    .next_message()
                    .await?
                    .with_context(|| format!("stdout closed before response to {method}"))?;
                if msg.get("id") == Some(&json!(id)) {
                    return anyhow::Ok(msg);
                }
            }
        })
        .await
        .with_context(|| format!("timeout waiting for response to {method}"))?
    }

    /// Call a tool and return its `result` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response carries a JSON-RPC error.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let msg = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
                Duration::from_secs(5),
            )
            .await?;
        if let Some(err) = msg.get("error") {
            anyhow::bail!("tools/call {name} failed: {err}");
        }
        msg.get("result")
            .cloned()
            .with_context(|| format!("tools/call {name} missing result"))
    }

    /// Close stdin, wait for the server to exit, and collect everything it wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not exit in time or writes a non-JSON stdout line.
    pub async fn shutdown(mut self) -> anyhow::Result<StdioTranscript> {
        drop(self.stdin.take());

        tokio::time::timeout(Duration::from_secs(10), async {
            while self.next_message().await?.is_some() {}
            anyhow::Ok(())
        })
        .await
        .context("timeout draining stdout")??;

        let status = tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .context("timeout waiting for server exit")?
            .context("wait for server")?;
        let stderr = self.stderr.await.context("join stderr reader")??;

        Ok(StdioTranscript {
            stdout: std::mem::take(&mut self.transcript),
            stderr,
            status,
        })
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().context("stdin already closed")?;
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');
        stdin.write_all(&line).await.context("write to server stdin")?;
        stdin.flush().await.context("flush server stdin")
    }

    async fn next_message(&mut self) -> anyhow::Result<Option<Value>> {
        let Some(line) = self.stdout.next_line().await.context("read server stdout")? else {
            return Ok(None);
        };
        let msg: Value = serde_json::from_str(&line)
            .with_context(|| format!("stdout line is not JSON: {line:?}"))?;
        self.transcript.push(msg.clone());
        Ok(Some(msg))
    }
}

/// First text block of a tool result.
///
/// # Errors
///
/// Returns an error if the result has no text content.
pub fn result_text(result: &Value) -> anyhow::Result<&str> {
    result
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .context("tool result missing content[0].text")
}

async fn post(
    client: &reqwest::Client,
    endpoint: &str,
    session_id: Option<&str>,
    body: &Value,
) -> anyhow::Result<reqwest::Response> {
    let mut req = client
        .post(endpoint)
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(body);

    if let Some(session_id) = session_id {
        req = req.header("Mcp-Session-Id", session_id);
    }

    req.send()
        .await
        .with_context(|| format!("POST {endpoint}"))?
        .error_for_status()
        .with_context(|| format!("POST {endpoint} status"))
}

/// Read `data:` lines up to the first blank line that closes an event, and parse them as JSON.
async fn first_sse_json(resp: reqwest::Response) -> anyhow::Result<Value> {
    let bytes = Box::pin(resp.bytes_stream().map_err(std::io::Error::other));
    let mut lines = tokio::io::BufReader::new(StreamReader::new(bytes)).lines();

    let mut data = String::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.is_empty() {
            if data.is_empty() {
                continue;
            }
            return serde_json::from_str(&data).context("parse event-stream data as JSON");
        }
        if let Some(chunk) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(chunk.trim_start());
        }
    }

    anyhow::bail!("event-stream ended without a JSON message")
}
