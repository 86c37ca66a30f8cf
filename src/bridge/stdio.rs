//! Newline-delimited JSON session transport.
//!
//! Inbound: one `SessionRequest` object per line.
//! Outbound: `{"topic","id","result"}` or `{"topic","disconnect":{code,message}}`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

use crate::bridge::request::SessionRequest;
use crate::bridge::session::{ErrorReason, SessionTransport};
use crate::error::{Result, TxError};
use crate::runtime::ShutdownSignal;

/// Writes one JSON object per line to `W`.
pub struct JsonLinesTransport<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    async fn write_line(&self, value: &Value) -> Result<()> {
        let mut line = value.to_string();
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TxError::Session(e.to_string()))?;
        writer.flush().await.map_err(|e| TxError::Session(e.to_string()))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> SessionTransport for JsonLinesTransport<W> {
    async fn respond(&self, topic: &str, id: u64, result: Value) -> Result<()> {
        self.write_line(&json!({ "topic": topic, "id": id, "result": result })).await
    }

    async fn disconnect(&self, topic: &str, reason: ErrorReason) -> Result<()> {
        self.write_line(&json!({ "topic": topic, "disconnect": reason })).await
    }
}

/// Read requests from `reader` into `sender` until EOF or shutdown.
///
/// Lines that are not requests but name a topic close that topic; anything
/// else is logged and skipped. Invalid UTF-8 is decoded lossily so one bad
/// line never stops the reader.
pub async fn read_requests<R>(
    mut reader: R,
    sender: mpsc::Sender<SessionRequest>,
    transport: &dyn SessionTransport,
    mut shutdown: ShutdownSignal,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read.map_err(|e| TxError::Session(e.to_string()))?,
            _ = shutdown.triggered() => break,
        };
        if read == 0 {
            tracing::info!("Session input closed");
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<SessionRequest>(line) {
            Ok(request) => {
                if sender.send(request).await.is_err() {
                    tracing::warn!("Bridge listener stopped, no longer reading requests");
                    break;
                }
            }
            Err(e) => {
                let topic = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|v| v.get("topic").and_then(Value::as_str).map(str::to_owned));
                match topic {
                    Some(topic) => {
                        let reason = ErrorReason::internal(format!("Malformed request: {}", e));
                        transport.disconnect(&topic, reason).await?;
                    }
                    None => tracing::warn!(error = %e, "Ignoring malformed session line"),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Shutdown;

    #[tokio::test]
    async fn test_writes_one_line_per_message() {
        let transport = JsonLinesTransport::new(Vec::new());
        transport.respond("t", 3, json!({ "txId": "aa" })).await.unwrap();
        transport.disconnect("t", ErrorReason::internal("nope")).await.unwrap();

        let written = String::from_utf8(transport.writer.into_inner()).unwrap();
        let lines: Vec<Value> = written.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0], json!({ "topic": "t", "id": 3, "result": { "txId": "aa" } }));
        assert_eq!(lines[1], json!({ "topic": "t", "disconnect": { "code": -32000, "message": "nope" } }));
    }

    #[tokio::test]
    async fn test_reader_forwards_requests_and_closes_malformed_topics() {
        let input = concat!(
            r#"{"topic":"a","id":1,"method":"transfer","params":{}}"#,
            "\n\n",
            r#"{"topic":"b","id":"not-a-number"}"#,
            "\n",
            "garbage\n",
        );
        let transport = JsonLinesTransport::new(Vec::new());
        let (tx, mut rx) = mpsc::channel(4);
        let shutdown = Shutdown::new();

        read_requests(input.as_bytes(), tx, &transport, shutdown.signal()).await.unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.topic, "a");
        assert!(rx.recv().await.is_none());

        let written = String::from_utf8(transport.writer.into_inner()).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains(r#""topic":"b""#));
    }

    #[tokio::test]
    async fn test_reader_survives_invalid_utf8() {
        use crate::bridge::session::INTERNAL_ERROR_CODE;

        let mut input = Vec::new();
        input.extend_from_slice(b"{\"topic\":\"a\",\"id\":\"\xff\"}\n");
        input.extend_from_slice(b"\xfe\xff\n");
        input.extend_from_slice(br#"{"topic":"b","id":2,"method":"transfer","params":{}}"#);
        input.push(b'\n');
        let transport = JsonLinesTransport::new(Vec::new());
        let (tx, mut rx) = mpsc::channel(4);
        let shutdown = Shutdown::new();

        read_requests(input.as_slice(), tx, &transport, shutdown.signal()).await.unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.topic, "b");
        assert_eq!(request.id, 2);
        assert!(rx.recv().await.is_none());

        let written = String::from_utf8(transport.writer.into_inner()).unwrap();
        assert_eq!(written.lines().count(), 1);
        let closed: Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(closed["topic"], "a");
        assert_eq!(closed["disconnect"]["code"], INTERNAL_ERROR_CODE);
    }
}
