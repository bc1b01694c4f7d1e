pub mod client;
pub mod source;
pub mod valkey;

pub use client::{RegistryClient, RegistryError};
pub use source::{CachedRegistrySource, DynamicOriginSource, StaticOriginSource};
pub use valkey::ValkeyRegistryClient;
