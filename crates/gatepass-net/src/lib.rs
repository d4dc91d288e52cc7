//! gatepass-net — Credential delivery over HTTPS.
//!
//! Provides the reqwest-backed delivery client and the pipeline that
//! composes classification, resolution and delivery.

pub mod delivery;
pub mod pipeline;

pub use delivery::{encode_payload, Deliver, DeliveryClient, DeliveryError};
pub use pipeline::{run_event, spawn_pipeline, ClassifierEvent, PipelineError, PipelineHandle, PipelineOutcome};
