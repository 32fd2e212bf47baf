mod types;

pub use types::{DomainError, GatewayError, SourceError, TransformError};
