pub mod band;
pub mod category;
pub mod color;
pub mod color_count;
pub mod habitat;
pub mod percentage;
pub mod raster;
