//! Dedicated writer task for a session's outbound bytes.
//!
//! All writes to a live stream (codec-driven acks, application commands,
//! the terminate sentinel) funnel through one task fed by an mpsc channel,
//! so outbound frames are never interleaved. This replaces a shared
//! `Arc<Mutex<WriteHalf>>`: senders queue and move on, and only the writer
//! task ever touches the stream.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{LinkError, Result};

/// Default channel capacity for queued outbound frames.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Handle for queueing frames to the writer task.
///
/// Cheaply cloneable; every clone feeds the same serialized writer.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
}

impl WriterHandle {
    /// Queue a frame, waiting for channel capacity if needed.
    pub async fn send(&self, frame: Bytes) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| LinkError::ConnectionClosed)
    }

    /// Queue a frame without waiting. Dropped silently if the channel is
    /// full or the writer is gone; used for best-effort sends during
    /// teardown.
    pub fn try_send(&self, frame: Bytes) {
        let _ = self.tx.try_send(frame);
    }
}

/// Spawn the writer task over the write half of a session's stream.
///
/// The task exits when every [`WriterHandle`] clone has been dropped, after
/// draining whatever was already queued and shutting the stream down.
pub fn spawn_writer_task<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

async fn writer_loop<W>(mut rx: mpsc::Receiver<Bytes>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            tracing::error!("write failed: {}", e);
            return Err(e);
        }
    }
    // All handles dropped: session teardown. Close our half of the stream.
    let _ = writer.shutdown().await;
    Ok(())
}

async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}
