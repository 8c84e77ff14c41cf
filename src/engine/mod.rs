//! Panel aggregation engine

pub mod aggregate;
pub mod extract;
pub mod image;
pub mod resolve;

pub use aggregate::Aggregator;
pub use extract::{apply_legend, extract_values};
pub use image::{build_image_url, RenderWindow};
pub use resolve::resolve_panels;
