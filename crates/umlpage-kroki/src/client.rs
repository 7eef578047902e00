//! HTTP transport to a Kroki server.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use ureq::Agent;
use umlpage_engine::EngineError;

/// Line reference in a `PlantUML` syntax error, e.g. `(line: 3)`.
static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bline:?\s*(\d+)").unwrap());

/// Create HTTP agent with the specified timeout.
///
/// The agent pools connections, so one agent is shared by every page of
/// every diagram an engine produces.
#[must_use]
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Send a diagram to Kroki and return the response body as bytes.
///
/// Handles HTTP errors by reading the response body for error details.
pub(crate) fn send_diagram_request(
    agent: &Agent,
    url: &str,
    source: &str,
) -> Result<Vec<u8>, EngineError> {
    let response = agent
        .post(url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| EngineError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(status_error(status, &error_body));
    }

    body.read_to_vec()
        .map_err(|e| EngineError::Io(std::io::Error::other(e)))
}

/// Map an error response to an engine error.
///
/// Kroki answers 400 when the diagram source does not parse; the body holds
/// the `PlantUML` message. Every other status is a server or transport problem.
fn status_error(status: u16, body: &str) -> EngineError {
    if status == 400 {
        let message = body.trim();
        let line = ERROR_LINE
            .captures(message)
            .and_then(|caps| caps.get(1)?.as_str().parse().ok());
        return match line {
            Some(line) => EngineError::parse_at(line, message),
            None => EngineError::parse(message),
        };
    }
    EngineError::Http(format!("HTTP {status}: {body}"))
}
