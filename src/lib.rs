//! Lifecycle rules for order-to-cash documents: which transitions are legal,
//! which permission each requires and which hooks it triggers.

pub mod catalog;
pub mod document;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod permission;
pub mod registry;
pub mod request;
pub mod service;
mod standard;
pub mod utils;

pub use catalog::{Catalog, CatalogBuilder};
pub use document::{DocumentType, TransitionKey};
pub use engine::{EngineConfig, LifecycleEngine};
pub use error::{LifecycleError, ServiceError};
pub use request::{TransitionRequest, TransitionResult, TransitionValidation};
