//! Safe SQL builder: identifiers from entity models only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
