//! Image Transform Engine
//!
//! - Filter style rendering and parsing (style)
//! - Pixel-wise filter functions (filters)
//! - Crop + filter + encode (rasterize)
//! - Metadata probing (processor)

pub mod filters;
pub mod processor;
pub mod rasterize;
pub mod style;

pub use filters::ImageFilters;
pub use processor::ImageProcessor;
pub use rasterize::{rasterize, ImageExport, ImageTransformEngine, RasterOptions};
pub use style::{parse_filter_expression, render_filter_style, FilterOp, FilterStyle};
