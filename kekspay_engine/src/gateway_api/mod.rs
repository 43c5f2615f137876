pub mod errors;
pub mod gateway_flow_api;
pub mod gateway_objects;
pub mod settings;

pub use settings::{ConfigWarning, GatewaySettings};
