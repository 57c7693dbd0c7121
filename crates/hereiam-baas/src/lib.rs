pub mod ejson;
pub mod http;
pub mod memory;

pub use http::{BaasClient, BaasSetupError};
pub use memory::{MemoryBaas, Operation};
