use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::EngineError;
use crate::model::FeedbackEvent;

/// Destination for per-finding helpfulness judgments.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn send_feedback(&self, event: &FeedbackEvent) -> Result<(), EngineError>;
}

/// Fire-and-forget notifier wrapping a [`FeedbackSink`].
///
/// Every event is delivered on its own task. Failures are logged and never
/// reach the caller.
#[derive(Clone)]
pub struct FeedbackEmitter {
    sink: Arc<dyn FeedbackSink>,
}

impl FeedbackEmitter {
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self { sink }
    }

    /// Spawn delivery of `event` on the current runtime.
    ///
    /// Dropping the returned handle detaches the task.
    pub fn send(&self, event: FeedbackEvent) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match sink.send_feedback(&event).await {
                Ok(()) => debug!(
                    finding_id = %event.finding_id,
                    is_helpful = event.is_helpful,
                    "feedback delivered"
                ),
                Err(err) => warn!(
                    finding_id = %event.finding_id,
                    error = %err,
                    "failed to send feedback"
                ),
            }
        })
    }
}
