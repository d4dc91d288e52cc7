//! gatepass-core — Label-to-credential resolution.
//!
//! Holds the immutable credential mapping loaded at startup, the resolver
//! that maps classifier labels onto it, and the configuration shared by
//! the daemon and the CLI.

pub mod classifier;
pub mod config;
pub mod endpoint;
pub mod mapping;
pub mod types;

pub use classifier::{Classifier, ClassifierError, FixedClassifier};
pub use config::{Config, ConfigError, MappingSource};
pub use endpoint::{Endpoint, EndpointError};
pub use mapping::{CredentialMapping, MappingEntry, MappingError};
pub use types::{Classification, CredentialPair, DeliveryOutcome, ResolutionResult};
