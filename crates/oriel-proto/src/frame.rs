//! Length-delimited JSON framing for session connections.
//!
//! Format: 4-byte big-endian length prefix + JSON payload. The session
//! transport carries one request or response object per frame; nothing is
//! split or coalesced above this layer.

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default maximum frame size: 8 MB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Errors from the frame codec.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying transport failed. The session cannot continue.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound frame exceeded the size limit.
    ///
    /// The payload has been read and discarded, so the stream is still
    /// positioned at the next frame — the session may continue after
    /// reporting the oversize to the peer.
    #[error("frame too large: {len} bytes (limit: {max} bytes)")]
    TooLarge {
        /// Declared payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Write one length-delimited JSON frame to an async writer.
pub async fn write_frame<T: Serialize, W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &T,
) -> Result<(), std::io::Error> {
    let payload = serde_json::to_vec(msg)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "frame payload too large: {} bytes (max {} bytes)",
                payload.len(),
                u32::MAX
            ),
        )
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one raw frame payload with the default size limit.
///
/// Returns `None` on EOF between frames (clean close).
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, FrameError> {
    read_frame_with_limit(reader, DEFAULT_MAX_FRAME_SIZE).await
}

/// Read one raw frame payload with a configurable size limit.
///
/// Returns `None` on EOF between frames. An oversized frame is fully
/// drained before [`FrameError::TooLarge`] is returned, so the caller can
/// answer with an error envelope and keep reading.
pub async fn read_frame_with_limit<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_size: usize,
) -> Result<Option<Vec<u8>>, FrameError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;

    if len > max_size {
        // Drain the oversized payload in chunks so the stream stays framed.
        let mut remaining = len;
        let mut chunk = vec![0u8; 64 * 1024];
        while remaining > 0 {
            let take = remaining.min(chunk.len());
            reader.read_exact(&mut chunk[..take]).await?;
            remaining -= take;
        }
        return Err(FrameError::TooLarge { len, max: max_size });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandRequest, Request, Response};
    use std::io::Cursor;

    #[tokio::test]
    async fn roundtrip_request_frame() {
        let req = Request::Command(CommandRequest {
            action: "ls".into(),
            path: Some("src".into()),
        });

        let mut buf = Vec::new();
        write_frame(&mut buf, &req).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let payload = read_frame(&mut cursor).await.unwrap().unwrap();
        let decoded: Request = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, req);
    }

    #[tokio::test]
    async fn multiple_frames_in_stream() {
        let first = Response::Output {
            output: "a\nb\n".into(),
        };
        let second = Response::Error {
            message: "unknown message type".into(),
        };

        let mut buf = Vec::new();
        write_frame(&mut buf, &first).await.unwrap();
        write_frame(&mut buf, &second).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let p1 = read_frame(&mut cursor).await.unwrap().unwrap();
        let p2 = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(serde_json::from_slice::<Response>(&p1).unwrap(), first);
        assert_eq!(serde_json::from_slice::<Response>(&p2).unwrap(), second);

        // EOF after all frames
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_returns_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut cursor).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn oversized_frame_is_drained_and_recoverable() {
        // First frame oversized, second frame normal — after the TooLarge
        // error the reader must still be positioned at the second frame.
        let big_payload = vec![b'x'; 512];
        let mut buf = Vec::new();
        buf.extend_from_slice(&(big_payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(&big_payload);

        let ok = Response::Output { output: "ok".into() };
        write_frame(&mut buf, &ok).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let err = read_frame_with_limit(&mut cursor, 64).await.unwrap_err();
        match err {
            FrameError::TooLarge { len, max } => {
                assert_eq!(len, 512);
                assert_eq!(max, 64);
            }
            other => panic!("expected TooLarge, got: {other:?}"),
        }

        let next = read_frame_with_limit(&mut cursor, 64 * 1024)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(serde_json::from_slice::<Response>(&next).unwrap(), ok);
    }

    #[tokio::test]
    async fn truncated_frame_is_a_transport_error() {
        // Length prefix promises more bytes than the stream holds.
        let mut buf = Vec::new();
        buf.extend_from_slice(&100u32.to_be_bytes());
        buf.extend_from_slice(b"short");

        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FrameError::Io(_)), "got: {err:?}");
    }

    #[test]
    fn u32_try_from_overflow() {
        // Validates that the conversion logic correctly rejects sizes > u32::MAX
        let overflow_size = u32::MAX as usize + 1;
        assert!(u32::try_from(overflow_size).is_err());
    }
}
