pub mod codec;
pub mod config;
pub mod registry;
pub mod repository;
pub mod sled_store;

pub use codec::StandardPayloadCodec;
pub use config::PropertiesConfig;
pub use registry::{ContentHandlerRegistry, RegistryError};
pub use repository::{InMemoryConceptStore, InMemoryRecordStore};
pub use sled_store::{SledConceptStore, SledRecordStore};
