use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

pub fn locate_memshard_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_memshard-mcp") {
        return Ok(PathBuf::from(path));
    }

    // Try to resolve from the current test executable location.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("memshard-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    anyhow::bail!(
        "failed to locate memshard-mcp binary; build with: cargo build -p memshard-mcp --bin memshard-mcp"
    )
}

pub struct McpClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
}

impl McpClient {
    /// Spawn the server against a project root and complete the
    /// initialize handshake.
    pub async fn start(project_root: &Path) -> Result<Self> {
        let bin = locate_memshard_bin()?;

        let mut cmd = Command::new(bin);
        cmd.env("MEMSHARD_ROOT", project_root);
        cmd.env("RUST_LOG", "warn");
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::null());

        let mut child = cmd.spawn().context("spawn memshard-mcp")?;
        let stdin = child.stdin.take().context("stdin")?;
        let stdout = BufReader::new(child.stdout.take().context("stdout")?);

        let mut client = Self {
            child,
            stdin,
            stdout,
            next_id: 1,
        };

        let init = client
            .request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "memshard-tests", "version": "0.1" }
                }),
            )
            .await?;
        anyhow::ensure!(
            init.get("result").is_some(),
            "initialize failed: {init}"
        );
        client
            .notify("notifications/initialized", serde_json::json!({}))
            .await?;
        Ok(client)
    }

    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }))
        .await?;

        loop {
            let msg = self.read_json().await?;
            if msg.get("id").and_then(Value::as_i64) == Some(id) {
                return Ok(msg);
            }
        }
    }

    pub async fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        self.send(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        }))
        .await
    }

    /// Call a tool and parse the JSON payload out of its text content.
    /// Returns `(is_error, payload)`.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<(bool, Value)> {
        let response = self
            .request(
                "tools/call",
                serde_json::json!({ "name": name, "arguments": arguments }),
            )
            .await?;
        let result = response
            .get("result")
            .with_context(|| format!("tools/call {name} returned no result: {response}"))?;
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let text = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let payload = serde_json::from_str(text).unwrap_or(Value::String(text.to_string()));
        Ok((is_error, payload))
    }

    async fn send(&mut self, value: &Value) -> Result<()> {
        let mut json = serde_json::to_vec(value)?;
        json.push(b'\n');
        self.stdin.write_all(&json).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_json(&mut self) -> Result<Value> {
        loop {
            let mut line = String::new();
            let n = tokio::time::timeout(Duration::from_secs(10), self.stdout.read_line(&mut line))
                .await
                .context("timeout reading json line")??;
            if n == 0 {
                anyhow::bail!("EOF while reading json line");
            }
            if line.trim().is_empty() {
                continue;
            }
            return Ok(serde_json::from_str(&line)?);
        }
    }

    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}
