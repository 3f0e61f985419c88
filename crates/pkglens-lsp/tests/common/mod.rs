//! Common test utilities for integration tests.
//!
//! Provides `LspClient`, which drives the `pkglens` binary over stdio.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};

/// A server-to-client message without an id.
#[derive(Debug, Clone)]
pub(crate) struct CapturedNotification {
    pub method: String,
    pub params: Value,
}

/// LSP test client for communicating with the server binary.
pub(crate) struct LspClient {
    process: Child,
    reader: BufReader<std::process::ChildStdout>,
    notifications: Vec<CapturedNotification>,
}

impl LspClient {
    /// Spawn the pkglens binary.
    pub(crate) fn spawn() -> Self {
        let mut process = Command::new(env!("CARGO_BIN_EXE_pkglens"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn pkglens binary");

        let stdout = process.stdout.take().expect("Failed to capture stdout");

        Self {
            process,
            reader: BufReader::new(stdout),
            notifications: Vec::new(),
        }
    }

    /// Notifications received so far.
    #[allow(dead_code)]
    pub(crate) fn notifications(&self) -> &[CapturedNotification] {
        &self.notifications
    }

    /// Send a JSON-RPC message to the server.
    pub(crate) fn send(&mut self, message: &Value) {
        let body = serde_json::to_string(message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let stdin = self.process.stdin.as_mut().expect("stdin not captured");
        stdin.write_all(header.as_bytes()).unwrap();
        stdin.write_all(body.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    /// Read messages until the response with `expected_id` arrives.
    ///
    /// Notifications are captured; server-to-client requests (such as
    /// `workspace/codeLens/refresh`) are answered with a null result.
    pub(crate) fn read_response(&mut self, expected_id: i64) -> Value {
        loop {
            let message = self.read_message();

            let Some(id) = message.get("id").cloned() else {
                if let Some(method) = message.get("method").and_then(|m| m.as_str()) {
                    self.notifications.push(CapturedNotification {
                        method: method.to_string(),
                        params: message.get("params").cloned().unwrap_or(Value::Null),
                    });
                }
                continue;
            };

            if message.get("method").is_some() {
                self.send(&json!({"jsonrpc": "2.0", "id": id, "result": null}));
                continue;
            }

            if id == json!(expected_id) {
                return message;
            }
        }
    }

    fn read_message(&mut self) -> Value {
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .expect("Failed to read header");
            assert!(bytes_read != 0, "Server closed connection unexpectedly");

            if line == "\r\n" || line == "\n" {
                if content_length == 0 {
                    continue;
                }
                break;
            }

            if line.to_lowercase().starts_with("content-length:") {
                content_length = line
                    .split(':')
                    .nth(1)
                    .unwrap()
                    .trim()
                    .parse()
                    .expect("Invalid content length");
            }
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).expect("Failed to read body");

        serde_json::from_slice(&body)
            .unwrap_or_else(|e| panic!("Invalid JSON: {e} in: {:?}", String::from_utf8_lossy(&body)))
    }

    /// Initialize the LSP session with optional initialization options.
    pub(crate) fn initialize_with(&mut self, options: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "processId": null,
                "capabilities": {
                    "workspace": {
                        "codeLens": { "refreshSupport": true }
                    },
                    "textDocument": {
                        "hover": { "contentFormat": ["markdown", "plaintext"] },
                        "codeLens": {}
                    }
                },
                "rootUri": null,
                "workspaceFolders": null,
                "initializationOptions": options
            }
        }));

        let response = self.read_response(1);

        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }));

        response
    }

    pub(crate) fn initialize(&mut self) -> Value {
        self.initialize_with(Value::Null)
    }

    /// Open a text document.
    pub(crate) fn did_open(&mut self, uri: &str, language_id: &str, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text
                }
            }
        }));
    }

    #[allow(dead_code)]
    pub(crate) fn hover(&mut self, id: i64, uri: &str, line: u32, character: u32) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/hover",
            "params": {
                "textDocument": {"uri": uri},
                "position": {"line": line, "character": character}
            }
        }));
        self.read_response(id)
    }

    #[allow(dead_code)]
    pub(crate) fn code_lens(&mut self, id: i64, uri: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/codeLens",
            "params": {
                "textDocument": {"uri": uri}
            }
        }));
        self.read_response(id)
    }

    #[allow(dead_code)]
    pub(crate) fn code_lens_resolve(&mut self, id: i64, lens: &Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "codeLens/resolve",
            "params": lens
        }));
        self.read_response(id)
    }

    #[allow(dead_code)]
    pub(crate) fn execute_command(&mut self, id: i64, command: &str, arguments: &Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "workspace/executeCommand",
            "params": {
                "command": command,
                "arguments": arguments
            }
        }));
        self.read_response(id)
    }

    /// Shutdown the server.
    pub(crate) fn shutdown(&mut self) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 999,
            "method": "shutdown"
        }));
        self.read_response(999)
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
