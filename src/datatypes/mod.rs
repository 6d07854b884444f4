// src/datatypes/mod.rs
pub mod params;
pub mod type_conversions;
pub mod values;

pub use params::ParamMap;
pub use values::{Point, Value};
