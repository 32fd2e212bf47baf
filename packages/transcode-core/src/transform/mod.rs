pub mod decode;
pub mod dimensions;
pub mod encode;
pub mod engine;
pub mod negotiate;
pub mod orientation;
pub mod params;
pub mod resize;

pub use decode::{animated_format, decode_image, is_svg};
pub use dimensions::fit_width;
pub use encode::{encodable_format, encode_image};
pub use engine::{EngineConfig, RasterEngine, TransformEngine};
pub use negotiate::{accepted_formats, max_age_from_cache_control};
pub use orientation::{correct_orientation, read_orientation};
pub use params::{OutputFormat, TranscodeInput, TranscodeResult};
pub use resize::resize_image;
