//! Line-delimited JSON host for driving the worker from stdio.
//!
//! Each input line is one fetch event:
//!
//! ```json
//! {"id": 1, "method": "GET", "url": "https://app.example.com/", "accept": "text/html"}
//! ```
//!
//! Each output line is the matching reply: `{"id":1,"handled":false}` when the
//! worker declines, otherwise the status/source/size of the served response
//! or the error that ended retrieval. Events are handled concurrently and
//! replies are written as they finish, so `id` is echoed back for matching.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::classify::InterceptedRequest;
use crate::error::HostError;
use crate::worker::{EventOutcome, IndexWorker, LifecycleEvent};

/// One fetch event as read from stdin.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRequest {
    /// Opaque correlation id, echoed in the reply.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

impl From<HostRequest> for InterceptedRequest {
    fn from(request: HostRequest) -> Self {
        InterceptedRequest { method: request.method, url: request.url, accept: request.accept }
    }
}

/// One reply as written to stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub handled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostReply {
    fn declined(id: Option<Value>) -> Self {
        Self { id, ..Default::default() }
    }

    fn failed(id: Option<Value>, handled: bool, error: &dyn std::fmt::Display) -> Self {
        Self { id, handled, error: Some(error.to_string()), ..Default::default() }
    }
}

/// Parse one input line into a request.
pub fn parse_line(line: &str) -> Result<HostRequest, HostError> {
    let request: HostRequest = serde_json::from_str(line)?;
    if request.url.trim().is_empty() {
        return Err(HostError::InvalidInput("url must not be empty".into()));
    }
    Ok(request)
}

/// Run one input line through the worker and build the reply.
pub async fn handle_line(worker: &IndexWorker, line: &str) -> HostReply {
    let mut request = match parse_line(line) {
        Ok(request) => request,
        Err(e) => return HostReply::failed(salvage_id(line), false, &e),
    };
    let id = request.id.take();

    match worker.dispatch(LifecycleEvent::Fetch(request.into())).await {
        Ok(EventOutcome::Respond(response)) => match response.await {
            Ok(served) => HostReply {
                id,
                handled: true,
                status: Some(served.response.status),
                source: Some(served.source.as_str()),
                content_type: served.response.content_type().map(str::to_string),
                bytes: Some(served.response.body.len()),
                error: None,
            },
            Err(e) => HostReply::failed(id, true, &e),
        },
        Ok(EventOutcome::Declined | EventOutcome::Completed) => HostReply::declined(id),
        Err(e) => HostReply::failed(id, false, &e),
    }
}

/// Best-effort id from a line that did not parse as a request.
fn salvage_id(line: &str) -> Option<Value> {
    serde_json::from_str::<Value>(line).ok()?.get("id").cloned()
}

/// Answer every line of `input` on `output` until `input` closes.
///
/// Each line is handled on its own task, so a slow retrieval never holds up
/// the lines behind it. Returns `output` once every reply has been written.
pub async fn serve<R, W>(worker: &IndexWorker, input: R, mut output: W) -> io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<HostReply>();

    let writer = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            let mut json = serde_json::to_string(&reply).map_err(io::Error::other)?;
            json.push('\n');
            output.write_all(json.as_bytes()).await?;
            output.flush().await?;
        }
        Ok::<_, io::Error>(output)
    });

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let worker = worker.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = handle_line(&worker, &line).await;
            // Only fails once the writer has stopped on an I/O error.
            let _ = tx.send(reply);
        });
    }
    drop(tx);

    writer.await.map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WorkerSettings;
    use crate::testing::{ScriptedNetwork, test_config};
    use shellcache_core::{MemoryCache, Strategy};
    use std::sync::Arc;
    use std::time::Duration;

    fn worker(network: ScriptedNetwork) -> IndexWorker {
        let settings = WorkerSettings::from_config(&test_config(Strategy::CacheFirst)).unwrap();
        IndexWorker::new(settings, Arc::new(network), Arc::new(MemoryCache::new()))
    }

    #[test]
    fn test_parse_line_defaults_method() {
        let request = parse_line(r#"{"url": "https://app.example.com/"}"#).unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.accept, None);
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(matches!(parse_line("not json"), Err(HostError::InvalidInput(_))));
        assert!(matches!(parse_line(r#"{"url": " "}"#), Err(HostError::InvalidInput(_))));
    }

    #[test]
    fn test_declined_reply_serialization() {
        let json = serde_json::to_string(&HostReply::default()).unwrap();
        assert_eq!(json, r#"{"handled":false}"#);
    }

    #[tokio::test]
    async fn test_handle_line_served() {
        let worker = worker(ScriptedNetwork::succeeding(Duration::ZERO, "<html>shell</html>"));
        let reply = handle_line(&worker, r#"{"url": "https://app.example.com/", "accept": "text/html"}"#).await;

        assert_eq!(
            reply,
            HostReply {
                id: None,
                handled: true,
                status: Some(200),
                source: Some("network"),
                content_type: Some("text/html".into()),
                bytes: Some(18),
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn test_handle_line_declined() {
        let worker = worker(ScriptedNetwork::succeeding(Duration::ZERO, "<html>shell</html>"));
        let reply = handle_line(&worker, r#"{"method": "POST", "url": "https://app.example.com/"}"#).await;
        assert_eq!(reply, HostReply::default());
    }

    #[tokio::test]
    async fn test_handle_line_network_failure() {
        let worker = worker(ScriptedNetwork::failing(Duration::ZERO));
        let reply = handle_line(&worker, r#"{"url": "https://app.example.com/"}"#).await;

        assert!(reply.handled);
        assert!(reply.error.unwrap().starts_with("NETWORK_ERROR"));
    }

    #[tokio::test]
    async fn test_handle_line_bad_input() {
        let worker = worker(ScriptedNetwork::failing(Duration::ZERO));
        let reply = handle_line(&worker, "{").await;

        assert!(!reply.handled);
        assert!(reply.error.unwrap().starts_with("INVALID_INPUT"));
    }

    #[tokio::test]
    async fn test_handle_line_echoes_id() {
        let worker = worker(ScriptedNetwork::succeeding(Duration::ZERO, "<html>shell</html>"));

        let reply = handle_line(&worker, r#"{"id": "a-1", "method": "POST", "url": "https://app.example.com/"}"#).await;
        assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"id":"a-1","handled":false}"#);

        let reply = handle_line(&worker, r#"{"id": 7, "url": ""}"#).await;
        assert_eq!(reply.id, Some(Value::from(7)));
        assert!(reply.error.unwrap().starts_with("INVALID_INPUT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serve_does_not_block_on_slow_retrieval() {
        let worker = worker(ScriptedNetwork::succeeding(Duration::from_secs(20), "<html>shell</html>"));
        let input = concat!(
            r#"{"id": 1, "url": "https://app.example.com/"}"#,
            "\n\n",
            r#"{"id": 2, "method": "POST", "url": "https://app.example.com/"}"#,
            "\n",
        );

        let output = serve(&worker, input.as_bytes(), Vec::new()).await.unwrap();
        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 2);
        assert_eq!(replies[0]["handled"], false);
        assert_eq!(replies[1]["id"], 1);
        assert_eq!(replies[1]["handled"], true);
        assert_eq!(replies[1]["source"], "network");
    }
}
