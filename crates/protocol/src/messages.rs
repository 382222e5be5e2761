//! Request and response tables of the wire contract.
//!
//! Every message is both encodable and decodable, so the same crate serves
//! client use and in-process test servers.

mod infer;
mod metadata;
mod request;

pub use infer::{InferRequest, InferResponse};
pub use metadata::{IOMetadata, MetadataResponse};
pub use request::Request;

use crate::builder::{Builder, WireOffset};
use crate::error::Result;
use crate::reader::Table;

fn create_string_vector(b: &mut Builder, values: &[String]) -> WireOffset {
    let offsets: Vec<WireOffset> = values.iter().map(|v| b.create_string(v)).collect();
    b.create_offset_vector(&offsets)
}

fn read_string_vector(table: &Table, id: u16) -> Result<Vec<String>> {
    let vector = match table.get_vector(id)? {
        Some(vector) => vector,
        None => return Ok(Vec::new()),
    };
    let mut values = Vec::with_capacity(vector.len());
    for i in 0..vector.len() {
        values.push(vector.string(i)?.to_string());
    }
    Ok(values)
}
