//! Self-describing content payloads and the handlers that store them in a
//! clinical record store.
//!
//! - [`domain`] holds the [`Content`] envelope and its codec contract.
//! - [`application_service`] holds the [`ContentHandler`] contract, the ports
//!   to the record store, vocabulary and configuration, and the
//!   [`UnstructuredDataHandler`].
//! - [`infrastructure`] holds adapters: in-memory and sled stores, TOML
//!   properties, the payload codec and the handler registry.

pub mod application_service;
pub mod domain;
pub mod infrastructure;

pub use application_service::content_handler::{
    ContentHandler, Discriminator, HandlerContext, HandlerError, UnstructuredDataHandler,
};
pub use domain::{
    CodecError, CodedValue, CompressionFormat, Content, ContentBuilder, ContentError,
    PayloadCodec, Representation,
};
pub use infrastructure::{ContentHandlerRegistry, RegistryError};
