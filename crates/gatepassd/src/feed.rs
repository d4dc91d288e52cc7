//! Event loop: classifier lines in, pipeline submissions out.

use crate::input;
use gatepass_net::PipelineHandle;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

/// Counters for one run of [`feed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    /// Events handed to the pipeline.
    pub submitted: usize,
    /// Lines that failed to parse.
    pub malformed: usize,
    /// Events still in flight when `shutdown` fired.
    pub abandoned: usize,
}

/// Read events from `reader` until EOF or `shutdown`.
///
/// Each event is submitted without waiting for earlier ones. On EOF every
/// in-flight event is awaited; on shutdown they are abandoned.
pub async fn feed<R>(
    reader: R,
    pipeline: &PipelineHandle,
    shutdown: impl Future<Output = ()>,
) -> FeedSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut in_flight = JoinSet::new();
    let mut summary = FeedSummary::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => dispatch(pipeline, &mut in_flight, &mut summary, &line),
                Ok(None) => {
                    tracing::info!(pending = in_flight.len(), "input closed; waiting for in-flight deliveries");
                    while in_flight.join_next().await.is_some() {}
                    break;
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to read classifier events");
                    while in_flight.join_next().await.is_some() {}
                    break;
                }
            },
            _ = &mut shutdown => {
                summary.abandoned = in_flight.len();
                tracing::info!(abandoned = summary.abandoned, "interrupted");
                in_flight.abort_all();
                break;
            }
        }

        while in_flight.try_join_next().is_some() {}
    }

    summary
}

fn dispatch(
    pipeline: &PipelineHandle,
    in_flight: &mut JoinSet<()>,
    summary: &mut FeedSummary,
    line: &str,
) {
    let event = match input::parse_line(line) {
        None => return,
        Some(Ok(event)) => event,
        Some(Err(err)) => {
            summary.malformed += 1;
            tracing::warn!(error = %err, "skipping malformed classifier event");
            return;
        }
    };

    summary.submitted += 1;
    let pipeline = pipeline.clone();
    in_flight.spawn(async move {
        match pipeline.submit(event).await {
            Ok(outcome) => tracing::debug!(?outcome, "event finished"),
            Err(err) => tracing::error!(error = %err, "event dropped"),
        }
    });
}
