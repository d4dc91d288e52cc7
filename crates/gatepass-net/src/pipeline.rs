//! classify → resolve → deliver.
//!
//! Each classifier event flows through [`run_event`]. [`spawn_pipeline`]
//! runs events behind a clone-safe handle, one task per event, so
//! concurrent events never wait on each other.

use crate::delivery::Deliver;
use gatepass_core::{
    Classification, ClassifierError, CredentialMapping, DeliveryOutcome, ResolutionResult,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;
use uuid::Uuid;

const PIPELINE_QUEUE_DEPTH: usize = 16;

/// What the external classifier produced for one image.
pub type ClassifierEvent = Result<Classification, ClassifierError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline task exited")]
    Closed,
}

/// Terminal state of one classifier event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The label resolved and one delivery attempt was made.
    Delivered(DeliveryOutcome),
    /// The label has no mapping; nothing was sent.
    Unresolved(String),
    /// The classifier failed; nothing was resolved or sent.
    ClassifierFailed(String),
}

/// Run a single event through resolution and, if resolved, delivery.
pub async fn run_event<D: Deliver>(
    mapping: &CredentialMapping,
    delivery: &D,
    event: ClassifierEvent,
) -> PipelineOutcome {
    let classification = match event {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(error = %err, "classification failed; nothing delivered");
            return PipelineOutcome::ClassifierFailed(err.to_string());
        }
    };

    tracing::info!(
        label = %classification.label,
        confidence = ?classification.confidence,
        "person recognized"
    );

    let credentials = match mapping.resolve(&classification.label) {
        ResolutionResult::Resolved(pair) => pair,
        ResolutionResult::Unresolved(label) => {
            tracing::warn!(label = %label, "label not in credential mapping; nothing delivered");
            return PipelineOutcome::Unresolved(label);
        }
    };

    let outcome = delivery.deliver(&credentials).await;
    match &outcome {
        DeliveryOutcome::Success { status } => {
            tracing::info!(identity_id = %credentials.identity_id, status, "credentials delivered");
        }
        DeliveryOutcome::Failure { reason } => {
            tracing::warn!(identity_id = %credentials.identity_id, reason = %reason, "credential delivery failed");
        }
    }
    PipelineOutcome::Delivered(outcome)
}

/// Message sent from handles to the pipeline task.
struct PipelineRequest {
    event: ClassifierEvent,
    reply: oneshot::Sender<PipelineOutcome>,
}

/// Clone-safe handle to the pipeline task.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<PipelineRequest>,
}

impl PipelineHandle {
    /// Submit one classifier event and wait for its outcome.
    pub async fn submit(&self, event: ClassifierEvent) -> Result<PipelineOutcome, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PipelineRequest {
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| PipelineError::Closed)?;
        reply_rx.await.map_err(|_| PipelineError::Closed)
    }
}

/// Spawn the pipeline on the current tokio runtime.
///
/// The mapping is shared read-only. Every request gets its own task and
/// `event_id`; there is no ordering between events and in-flight work is
/// abandoned when the runtime shuts down.
pub fn spawn_pipeline<D: Deliver>(mapping: Arc<CredentialMapping>, delivery: Arc<D>) -> PipelineHandle {
    let (tx, mut rx) = mpsc::channel::<PipelineRequest>(PIPELINE_QUEUE_DEPTH);

    tokio::spawn(async move {
        tracing::info!(labels = mapping.len(), "pipeline started");
        while let Some(req) = rx.recv().await {
            let mapping = Arc::clone(&mapping);
            let delivery = Arc::clone(&delivery);
            let span = tracing::info_span!("event", event_id = %Uuid::new_v4());
            tokio::spawn(
                async move {
                    let outcome = run_event(&mapping, delivery.as_ref(), req.event).await;
                    let _ = req.reply.send(outcome);
                }
                .instrument(span),
            );
        }
        tracing::info!("pipeline exiting");
    });

    PipelineHandle { tx }
}
