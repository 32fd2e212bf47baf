pub mod key;
pub mod params;
pub mod policy;

pub use key::validate_key;
pub use params::{validate_params, ValidatedParams};
pub use policy::{ImagePolicy, RemotePattern};
