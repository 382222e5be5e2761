//! Infer request and response tables.

use crate::builder::{Builder, WireOffset};
use crate::constants::field;
use crate::error::Result;
use crate::messages::{create_string_vector, read_string_vector};
use crate::reader::Table;
use crate::tensor::{decode_tensor, encode_tensor, NdArray};

/// Payload of an inference call: input tensors plus optional name lists and
/// an opaque config string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferRequest {
    pub input_tensors: Vec<NdArray>,
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
    pub config: String,
}

impl InferRequest {
    pub(crate) fn encode_table(&self, b: &mut Builder) -> WireOffset {
        let tensors: Vec<WireOffset> = self
            .input_tensors
            .iter()
            .map(|t| encode_tensor(b, t))
            .collect();
        let tensors = b.create_offset_vector(&tensors);
        let input_names = create_string_vector(b, &self.input_names);
        let output_names = create_string_vector(b, &self.output_names);
        let config = b.create_string(&self.config);

        b.start_table();
        b.push_slot_offset(field::infer_request::INPUT_TENSORS, tensors);
        b.push_slot_offset(field::infer_request::INPUT_NAMES, input_names);
        b.push_slot_offset(field::infer_request::OUTPUT_NAMES, output_names);
        b.push_slot_offset(field::infer_request::CONFIG, config);
        b.end_table()
    }

    pub(crate) fn decode_table(table: &Table) -> Result<Self> {
        let mut input_tensors = Vec::new();
        if let Some(vector) = table.get_vector(field::infer_request::INPUT_TENSORS)? {
            for i in 0..vector.len() {
                input_tensors.push(decode_tensor(&vector.table(i)?)?);
            }
        }
        let input_names = read_string_vector(table, field::infer_request::INPUT_NAMES)?;
        let output_names = read_string_vector(table, field::infer_request::OUTPUT_NAMES)?;
        let config = table
            .get_str(field::infer_request::CONFIG)?
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            input_tensors,
            input_names,
            output_names,
            config,
        })
    }
}

/// Response to an inference call: output tensors in the service's declared
/// output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferResponse {
    pub output_tensors: Vec<NdArray>,
}

impl InferResponse {
    /// Encodes the response as a root table.
    pub fn encode(&self) -> Vec<u8> {
        let mut b = Builder::new();
        let tensors: Vec<WireOffset> = self
            .output_tensors
            .iter()
            .map(|t| encode_tensor(&mut b, t))
            .collect();
        let tensors = b.create_offset_vector(&tensors);
        b.start_table();
        b.push_slot_offset(field::infer_response::OUTPUT_TENSORS, tensors);
        let root = b.end_table();
        b.finish(root)
    }

    /// Decodes a response buffer, materializing output tensors in index
    /// order. Order is positional and preserved.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let root = Table::root(buf)?;
        let mut output_tensors = Vec::new();
        if let Some(vector) = root.get_vector(field::infer_response::OUTPUT_TENSORS)? {
            for i in 0..vector.len() {
                output_tensors.push(decode_tensor(&vector.table(i)?)?);
            }
        }
        Ok(Self { output_tensors })
    }
}
