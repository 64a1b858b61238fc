pub mod composite;
pub mod paint;
pub mod raster;
