// Test Helpers Module - In-Memory Testing Infrastructure
//
// Provides an in-memory enrollment gateway with failure injection and a shared
// roster fixture, used by unit tests and the integration suite alike.

pub mod fixtures;
pub mod in_memory_gateway;

pub use in_memory_gateway::{CallCounts, InMemoryGateway};
