//! Producer/consumer plumbing for streamed chat responses.
//!
//! A pump task reads the HTTP body, decodes frames and pushes [`ChatEvent`]s into a bounded channel;
//! the consumer pulls from [`ChatStream`] at its own pace. Dropping the [`ChatStream`] aborts the pump
//! and with it the HTTP body.

use crate::error::ApiError;
use crate::frame::{Frame, FrameDecoder};
use crate::types::ChatEvent;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Item yielded by a [`ChatStream`]. An `Err` is fatal and always the last item.
pub type StreamItem = Result<ChatEvent, ApiError>;

/// Tuning for the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Bounded channel size between pump and consumer.
    pub channel_capacity: usize,
    /// Consecutive malformed frames tolerated before the stream fails.
    pub max_malformed_frames: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            max_malformed_frames: 16,
        }
    }
}

/// Finite, non-restartable sequence of chat events.
pub struct ChatStream {
    rx: mpsc::Receiver<StreamItem>,
    pump: JoinHandle<()>,
}

impl ChatStream {
    /// Starts a pump over `body` and returns the consuming end.
    pub fn spawn<S, E>(body: S, config: StreamConfig) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let pump = tokio::spawn(pump_frames(body, tx, config.max_malformed_frames));
        Self { rx, pump }
    }

    /// Builds a stream from body chunks that were already received (replays and fakes).
    pub fn from_chunks<I>(chunks: I, config: StreamConfig) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        let body = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::convert::Infallible>));
        Self::spawn(body, config)
    }

    /// Next event, or `None` once the remote finished or the connection closed.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump_frames<S, E>(body: S, tx: mpsc::Sender<StreamItem>, max_malformed: usize)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let mut body = Box::pin(body);
    let mut decoder = FrameDecoder::new();
    let mut malformed_run = 0usize;
    let mut skipped = 0usize;

    loop {
        let (frames, ended) = match body.next().await {
            Some(Ok(bytes)) => (decoder.push(&bytes), false),
            Some(Err(e)) => {
                warn!(error = %e, "chat stream: transport error");
                let _ = tx.send(Err(ApiError::Network(e.to_string()))).await;
                return;
            }
            None => (decoder.finish().into_iter().collect(), true),
        };

        for frame in frames {
            let item = match frame {
                Frame::Delta { content, finished } => {
                    malformed_run = 0;
                    if tx.send(Ok(ChatEvent::Delta(content))).await.is_err() {
                        return;
                    }
                    if !finished {
                        continue;
                    }
                    Ok(ChatEvent::Done)
                }
                Frame::Done => Ok(ChatEvent::Done),
                Frame::Heartbeat => {
                    malformed_run = 0;
                    continue;
                }
                Frame::Blank => continue,
                Frame::Malformed(reason) => {
                    malformed_run += 1;
                    skipped += 1;
                    warn!(reason = %reason, malformed_run, "chat stream: skipping malformed frame");
                    if malformed_run <= max_malformed {
                        continue;
                    }
                    Err(ApiError::Stream(format!(
                        "{malformed_run} malformed frames in a row (last: {reason})"
                    )))
                }
            };
            // Done and fatal errors end the stream.
            let _ = tx.send(item).await;
            debug!(skipped, "chat stream: pump finished");
            return;
        }

        if ended {
            debug!(skipped, "chat stream: body closed without end marker");
            return;
        }
    }
}
