use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::browser::driver::{Browser, SelectorHint};
use crate::browser::error::BrowserError;

pub const DEFAULT_SERVER_SCRIPT: &str = "node/browser_server.js";
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// One NDJSON command line for the browser server, keyed by `cmd`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate { url: String },
    Action(PageAction),
    CurrentUrl,
    QueryText { selector: String },
    QueryVisible { selector: String },
    QueryCount { selector: String },
    Quit,
}

/// Interaction carried by an `action` command, keyed by `action`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    Click { selector: SelectorHint },
    Fill { selector: SelectorHint, value: String },
    Wait { duration_ms: u64 },
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        Self::Navigate { url: url.to_string() }
    }

    pub fn click(selector: &SelectorHint) -> Self {
        Self::Action(PageAction::Click { selector: selector.clone() })
    }

    pub fn fill(selector: &SelectorHint, value: &str) -> Self {
        Self::Action(PageAction::Fill {
            selector: selector.clone(),
            value: value.to_string(),
        })
    }

    pub fn wait(duration_ms: u64) -> Self {
        Self::Action(PageAction::Wait { duration_ms })
    }

    pub fn current_url() -> Self {
        Self::CurrentUrl
    }

    pub fn query_text(selector: &str) -> Self {
        Self::QueryText { selector: selector.to_string() }
    }

    pub fn query_visible(selector: &str) -> Self {
        Self::QueryVisible { selector: selector.to_string() }
    }

    pub fn query_count(selector: &str) -> Self {
        Self::QueryCount { selector: selector.to_string() }
    }

    pub fn quit() -> Self {
        Self::Quit
    }

    /// Short name used in errors and logs.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Action(PageAction::Click { .. }) => "click",
            Self::Action(PageAction::Fill { .. }) => "fill",
            Self::Action(PageAction::Wait { .. }) => "wait",
            Self::CurrentUrl => "current_url",
            Self::QueryText { .. } => "query_text",
            Self::QueryVisible { .. } => "query_visible",
            Self::QueryCount { .. } => "query_count",
            Self::Quit => "quit",
        }
    }
}

/// Reply line from the browser server. Only the fields relevant to the
/// command that was sent are present.
#[derive(Debug, Default, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl BrowserResponse {
    /// Turn an `ok: false` reply into a protocol error for `command`.
    fn accepted(self, command: &str) -> Result<Self, BrowserError> {
        if self.ok {
            return Ok(self);
        }
        Err(BrowserError::SessionProtocol {
            command: command.to_string(),
            error: self.error.unwrap_or_else(|| "no error message".into()),
        })
    }
}

/// How to start the browser server.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Node.js script implementing the NDJSON protocol
    pub server_script: String,

    /// Pause after each navigation or click, in milliseconds
    pub settle_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            server_script: DEFAULT_SERVER_SCRIPT.to_string(),
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

/// Line-oriented JSON pipe to the server process.
struct ServerPipe {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ServerPipe {
    fn attach(child: &mut Child) -> Result<Self, BrowserError> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BrowserError::SessionIO("browser server has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BrowserError::SessionIO("browser server has no stdout".into()))?;
        Ok(Self {
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn write(&mut self, request: &BrowserRequest) -> Result<(), BrowserError> {
        let line = serde_json::to_string(request).map_err(|e| BrowserError::JsonSerialize {
            context: request.command().to_string(),
            source: e,
        })?;
        trace!(%line, "-> browser server");
        writeln!(self.stdin, "{}", line)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| BrowserError::SessionIO(format!("write {}: {}", request.command(), e)))
    }

    fn read(&mut self, context: &str) -> Result<BrowserResponse, BrowserError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(|e| BrowserError::SessionIO(format!("read {}: {}", context, e)))?;
        let line = line.trim();
        if read == 0 || line.is_empty() {
            return Err(BrowserError::SessionIO(format!(
                "browser server closed its output while waiting for {}",
                context
            )));
        }
        trace!(%line, "<- browser server");
        serde_json::from_str(line).map_err(|e| BrowserError::JsonParse {
            context: context.to_string(),
            source: e,
        })
    }
}

/// Browser driven by a long-lived Node.js server that keeps Chromium open.
pub struct BrowserSession {
    child: Child,
    pipe: ServerPipe,
    settle_ms: u64,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the server and wait for its `{"ok":true,"ready":true}` line.
    pub fn launch(options: &SessionOptions) -> Result<Self, BrowserError> {
        debug!(script = %options.server_script, "launching browser server");
        let mut child = Command::new("node")
            .arg(&options.server_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| BrowserError::SubprocessSpawn {
                script: options.server_script.clone(),
                source: e,
            })?;

        let mut pipe = ServerPipe::attach(&mut child)?;
        let hello = pipe.read("ready signal")?.accepted("launch")?;
        if hello.ready != Some(true) {
            return Err(BrowserError::SessionProtocol {
                command: "launch".into(),
                error: "server did not report ready".into(),
            });
        }

        Ok(Self {
            child,
            pipe,
            settle_ms: options.settle_ms,
            closed: false,
        })
    }

    fn call(&mut self, request: BrowserRequest) -> Result<BrowserResponse, BrowserError> {
        let command = request.command();
        self.pipe.write(&request)?;
        self.pipe.read(command)?.accepted(command)
    }

    /// Ask the server to shut down and reap it. Safe to call twice.
    pub fn quit(&mut self) -> Result<(), BrowserError> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        if let Err(e) = self.call(BrowserRequest::quit()) {
            warn!(error = %e, "browser server did not acknowledge quit");
        }
        if let Err(e) = self.child.wait() {
            warn!(error = %e, "failed to reap browser server");
        }
        Ok(())
    }
}

impl Browser for BrowserSession {
    fn current_url(&mut self) -> Result<String, BrowserError> {
        self.call(BrowserRequest::current_url())?
            .url
            .ok_or_else(|| BrowserError::SessionProtocol {
                command: "current_url".into(),
                error: "reply carried no url".into(),
            })
    }

    fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.call(BrowserRequest::navigate(url))?;
        self.wait_settled()
    }

    fn click(&mut self, selector: &SelectorHint) -> Result<(), BrowserError> {
        self.call(BrowserRequest::click(selector))?;
        self.wait_settled()
    }

    fn fill(&mut self, selector: &SelectorHint, value: &str) -> Result<(), BrowserError> {
        self.call(BrowserRequest::fill(selector, value)).map(|_| ())
    }

    fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let reply = self.call(BrowserRequest::query_visible(selector))?;
        Ok(reply.visible.unwrap_or(false))
    }

    fn text_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.call(BrowserRequest::query_text(selector))?.text)
    }

    fn count(&mut self, selector: &str) -> Result<u32, BrowserError> {
        let reply = self.call(BrowserRequest::query_count(selector))?;
        Ok(reply.count.unwrap_or(0))
    }

    fn wait_settled(&mut self) -> Result<(), BrowserError> {
        if self.settle_ms == 0 {
            return Ok(());
        }
        self.call(BrowserRequest::wait(self.settle_ms)).map(|_| ())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
