use thiserror::Error;

/// Failures raised by the browser-automation layer.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Node.js subprocess failed to spawn (browser_server.js)
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the browser server failed
    #[error("Browser session I/O: {0}")]
    SessionIO(String),

    /// JSON parsing failed (browser server output)
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization failed (request to the browser server)
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The browser server answered with ok=false
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    /// Element could not be located or interacted with
    #[error("Element {selector} not actionable: {reason}")]
    Element { selector: String, reason: String },

    /// A URL the driver could not work with
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
}
