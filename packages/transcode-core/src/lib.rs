pub mod constants;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod origin;
pub mod request;
pub mod response;
pub mod routing;
pub mod source;
pub mod transform;
pub mod validation;

// 公開API
pub use constants::{FAILURE_MAX_AGE, MAX_DIMENSION, MAX_INPUT_SIZE, MAX_PIXELS};
pub use domain::{
    apex_of, is_subdomain, is_valid_domain, names_to_register, subdomain_label_of, DnsRecord,
    DnsRecordKind, DomainSet,
};
pub use errors::{DomainError, GatewayError, SourceError, TransformError};
pub use gateway::ImageGateway;
pub use origin::{HttpFetcher, HttpResponse, ObjectStore, OriginResolver, StoredObject};
pub use request::ImageRequest;
pub use response::{compose, GatewayResponse};
pub use routing::{Behavior, CachePolicy, OriginKind, QueryForwarding, RoutingPolicy, IMAGE_PATH};
pub use source::{classify, FetchedSource, RawReference, SourceReference};
pub use transform::{
    EngineConfig, OutputFormat, RasterEngine, TranscodeInput, TranscodeResult, TransformEngine,
};
pub use validation::{validate_params, ImagePolicy, RemotePattern, ValidatedParams};
