pub mod cors;
pub mod registry;
