//! Three-tier typed parameter store: handler → groups → parameters.
//!
//! - [`value`] - Parameter types and string conversions
//! - [`group`] - `ParameterGroup`, an ordered set of parameters
//! - [`handler`] - `ParameterHandler`, an ordered set of groups

pub mod group;
pub mod handler;
pub mod value;

pub use group::{ParameterGroup, ParameterInfo};
pub use handler::ParameterHandler;
pub use value::{ParameterType, ParameterValue};
