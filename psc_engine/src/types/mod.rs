//! Core engine types: setting values and policies

pub mod policy;
pub mod value;

pub use policy::{platform_from_odata_type, Policy, PolicyPayload, PolicyType};
pub use value::SettingValue;
