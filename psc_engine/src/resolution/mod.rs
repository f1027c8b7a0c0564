//! Path resolution over policy payload documents

pub mod path_resolver;

pub use path_resolver::{resolve, resolve_node};
