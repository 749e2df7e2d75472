//! Live session over a connected stream.
//!
//! A [`Session`] owns the duplex stream for its whole life: the read half
//! goes to the receive loop task, the write half to the dedicated writer
//! task. The receive loop drives the frame codec and forwards every read
//! upward as a raw payload event. It has no exit of its own other than a
//! failed read; cancellation works by racing the read against a oneshot
//! and dropping the halves, which closes the stream.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::event::{EventSender, LinkEvent};
use crate::protocol::{FrameCodec, READ_BUFFER_SIZE, TERMINATE};
use crate::transport::LinkStream;
use crate::writer::{spawn_writer_task, WriterHandle};

/// Handle to a running session.
///
/// Not restartable: once cancelled or lost, the handle is dropped and a new
/// session is spawned for the next connection.
#[derive(Debug)]
pub struct Session {
    writer: WriterHandle,
    cancel: Option<oneshot::Sender<()>>,
    read_task: JoinHandle<()>,
    _writer_task: JoinHandle<Result<()>>,
}

impl Session {
    /// Split `stream` and start the receive loop and writer task.
    ///
    /// `lost` fires exactly once if the loop exits because the stream
    /// failed; it never fires on cancellation.
    pub fn spawn(stream: LinkStream, events: EventSender, lost: oneshot::Sender<()>) -> Self {
        tracing::debug!("session starting");
        let (reader, write_half) = tokio::io::split(stream);
        let (writer, writer_task) = spawn_writer_task(write_half);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let loop_writer = writer.clone();
        let read_task = tokio::spawn(read_loop(reader, loop_writer, events, cancel_rx, lost));

        Self {
            writer,
            cancel: Some(cancel_tx),
            read_task,
            _writer_task: writer_task,
        }
    }

    /// Clone of the writer handle, for writes that must not hold the
    /// controller's lock.
    pub fn writer(&self) -> WriterHandle {
        self.writer.clone()
    }

    /// Send raw bytes on the stream. Serialized with the receive loop's own
    /// acks by the writer task.
    pub async fn write(&self, bytes: Bytes) -> Result<()> {
        self.writer.send(bytes).await
    }

    /// Best-effort shutdown: queue the terminate sentinel, then stop the
    /// receive loop. Idempotent; also runs on drop.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            tracing::debug!("session cancel");
            self.writer.try_send(Bytes::from_static(&[TERMINATE]));
            let _ = tx.send(());
        }
    }

    /// Whether the receive loop has exited.
    pub fn is_finished(&self) -> bool {
        self.read_task.is_finished()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn read_loop<R>(
    mut reader: R,
    writer: WriterHandle,
    events: EventSender,
    mut cancel: oneshot::Receiver<()>,
    lost: oneshot::Sender<()>,
) where
    R: AsyncRead + Unpin,
{
    tracing::info!("receive loop started");
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut codec = FrameCodec::new();

    loop {
        let n = tokio::select! {
            _ = &mut cancel => {
                tracing::debug!("receive loop cancelled");
                return;
            }
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    tracing::info!("stream closed by peer");
                    let _ = lost.send(());
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("disconnected: {}", e);
                    let _ = lost.send(());
                    return;
                }
            },
        };

        let frame = &buf[..n];
        tracing::trace!(len = n, frame_type = frame.get(1).copied(), "frame in");

        if let Some(ack) = codec.on_frame(frame) {
            if writer.send(ack).await.is_err() {
                tracing::error!("ack write failed, treating as connection loss");
                let _ = lost.send(());
                return;
            }
        }

        let _ = events.send(LinkEvent::RawPayload {
            data: Bytes::copy_from_slice(frame),
            len: n,
        });
    }
}
