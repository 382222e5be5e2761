//! GraphPipe Protocol Crate
//!
//! Wire format implementation for the GraphPipe binary protocol.
//! Implements the flatbuffer table layout, the tensor codec, and the
//! request/response framing against the schema's fixed field ids and
//! union tags.

mod builder;
mod constants;
mod error;
mod messages;
mod reader;
mod tensor;

pub use constants::{ReqKind, WireType};
pub use error::{ProtocolError, Result};
pub use messages::{IOMetadata, InferRequest, InferResponse, MetadataResponse, Request};
pub use tensor::{ElementType, NdArray};
