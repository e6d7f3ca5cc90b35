// Chunked frame streaming - one length-prefixed JSON chunk per dashboard frame
use crate::domain::dashboard::DashboardFrame;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use tokio::sync::{broadcast, watch};

/// Create a chunked streaming response from a stream of frames
pub fn chunked_frame_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = DashboardFrame> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { serialize_chunk(frame, compress).await });

    // Chunks are compressed individually, so no Content-Encoding for the response itself
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single frame to a chunk: 4-byte big-endian length, then the payload
pub async fn serialize_chunk(frame: DashboardFrame, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&frame)?;

    let payload = if compress {
        brotli_compress(json).await?
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream frames published after subscription until the publisher closes or
/// shutdown is signalled. A slow client skips the frames it lagged behind on.
pub fn stream_from_broadcast(
    mut rx: broadcast::Receiver<DashboardFrame>,
    mut shutdown: watch::Receiver<bool>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let received = tokio::select! {
                received = rx.recv() => received,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };
            match received {
                Ok(frame) => yield frame,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Frame stream lagged, skipped {} frames", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    match chunked_frame_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn frame(cycle: usize) -> DashboardFrame {
        let mut fields = BTreeMap::new();
        fields.insert("ram_used".to_string(), "250B".to_string());
        DashboardFrame::new(cycle, 0, fields, BTreeMap::new())
    }

    #[tokio::test]
    async fn test_chunk_is_length_prefixed() {
        let chunk = serialize_chunk(frame(1), false).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);

        let decoded: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(decoded["cycle"], 1);
        assert_eq!(decoded["fields"]["ram_used"], "250B");
    }

    #[tokio::test]
    async fn test_stream_ends_when_publisher_closes() {
        let (tx, rx) = broadcast::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let response = stream_from_broadcast(rx, shutdown_rx, false).into_response();

        tx.send(frame(1)).unwrap();
        tx.send(frame(2)).unwrap();
        drop(tx);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let first_len = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        let second = &body[4 + first_len..];
        let second_len = u32::from_be_bytes([second[0], second[1], second[2], second[3]]) as usize;
        assert_eq!(second.len(), 4 + second_len);

        let decoded: serde_json::Value = serde_json::from_slice(&second[4..]).unwrap();
        assert_eq!(decoded["cycle"], 2);
    }

    #[tokio::test]
    async fn test_stream_ends_on_shutdown() {
        let (_tx, rx) = broadcast::channel::<DashboardFrame>(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let response = stream_from_broadcast(rx, shutdown_rx, false).into_response();

        shutdown_tx.send(true).unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
