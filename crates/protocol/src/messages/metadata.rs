//! Metadata response table and its IOMetadata entries.

use crate::builder::{Builder, WireOffset};
use crate::constants::{field, WireType};
use crate::error::{ProtocolError, Result};
use crate::reader::Table;

/// Description of one declared input or output.
///
/// The element type stays the raw wire code: metadata may describe types
/// (Float16, String) that tensors themselves cannot materialize.
#[derive(Debug, Clone, PartialEq)]
pub struct IOMetadata {
    pub name: String,
    pub description: String,
    pub dtype: WireType,
    pub shape: Vec<u64>,
}

impl IOMetadata {
    fn encode_table(&self, b: &mut Builder) -> WireOffset {
        let name = b.create_string(&self.name);
        let description = b.create_string(&self.description);
        let shape = b.create_dim_vector(&self.shape);
        b.start_table();
        b.push_slot_offset(field::io_metadata::NAME, name);
        b.push_slot_offset(field::io_metadata::DESCRIPTION, description);
        b.push_slot_u8(
            field::io_metadata::TYPE,
            self.dtype.to_u8(),
            WireType::Null.to_u8(),
        );
        b.push_slot_offset(field::io_metadata::SHAPE, shape);
        b.end_table()
    }

    fn decode_table(table: &Table) -> Result<Self> {
        let name = table
            .get_str(field::io_metadata::NAME)?
            .unwrap_or_default()
            .to_string();
        let description = table
            .get_str(field::io_metadata::DESCRIPTION)?
            .unwrap_or_default()
            .to_string();
        let code = table.get_u8(field::io_metadata::TYPE, WireType::Null.to_u8())?;
        let dtype = WireType::from_u8(code).ok_or(ProtocolError::UnknownWireType(code))?;
        let shape = table.get_dims(field::io_metadata::SHAPE)?;
        Ok(Self {
            name,
            description,
            dtype,
            shape,
        })
    }
}

/// Service self-description: identity strings plus declared inputs and
/// outputs, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataResponse {
    pub name: String,
    pub version: String,
    pub server: String,
    pub description: String,
    pub inputs: Vec<IOMetadata>,
    pub outputs: Vec<IOMetadata>,
}

impl MetadataResponse {
    /// Encodes the response as a root table.
    pub fn encode(&self) -> Vec<u8> {
        let mut b = Builder::new();
        let name = b.create_string(&self.name);
        let version = b.create_string(&self.version);
        let server = b.create_string(&self.server);
        let description = b.create_string(&self.description);
        let inputs: Vec<WireOffset> = self.inputs.iter().map(|io| io.encode_table(&mut b)).collect();
        let inputs = b.create_offset_vector(&inputs);
        let outputs: Vec<WireOffset> = self
            .outputs
            .iter()
            .map(|io| io.encode_table(&mut b))
            .collect();
        let outputs = b.create_offset_vector(&outputs);

        b.start_table();
        b.push_slot_offset(field::metadata_response::NAME, name);
        b.push_slot_offset(field::metadata_response::VERSION, version);
        b.push_slot_offset(field::metadata_response::SERVER, server);
        b.push_slot_offset(field::metadata_response::DESCRIPTION, description);
        b.push_slot_offset(field::metadata_response::INPUTS, inputs);
        b.push_slot_offset(field::metadata_response::OUTPUTS, outputs);
        let root = b.end_table();
        b.finish(root)
    }

    /// Decodes a response buffer. Absent strings decode as empty.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let root = Table::root(buf)?;
        let name = root
            .get_str(field::metadata_response::NAME)?
            .unwrap_or_default()
            .to_string();
        let version = root
            .get_str(field::metadata_response::VERSION)?
            .unwrap_or_default()
            .to_string();
        let server = root
            .get_str(field::metadata_response::SERVER)?
            .unwrap_or_default()
            .to_string();
        let description = root
            .get_str(field::metadata_response::DESCRIPTION)?
            .unwrap_or_default()
            .to_string();
        let inputs = read_io_vector(&root, field::metadata_response::INPUTS)?;
        let outputs = read_io_vector(&root, field::metadata_response::OUTPUTS)?;
        Ok(Self {
            name,
            version,
            server,
            description,
            inputs,
            outputs,
        })
    }
}

fn read_io_vector(table: &Table, id: u16) -> Result<Vec<IOMetadata>> {
    let vector = match table.get_vector(id)? {
        Some(vector) => vector,
        None => return Ok(Vec::new()),
    };
    let mut entries = Vec::with_capacity(vector.len());
    for i in 0..vector.len() {
        entries.push(IOMetadata::decode_table(&vector.table(i)?)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetadataResponse {
        MetadataResponse {
            name: "squeezenet".to_string(),
            version: "1.0".to_string(),
            server: "graphpipe-tf".to_string(),
            description: "image classifier".to_string(),
            inputs: vec![IOMetadata {
                name: "x".to_string(),
                description: "input image".to_string(),
                dtype: WireType::Float32,
                shape: vec![1, 3],
            }],
            outputs: vec![IOMetadata {
                name: "scores".to_string(),
                description: String::new(),
                dtype: WireType::Float32,
                shape: vec![1, 1000],
            }],
        }
    }

    #[test]
    fn test_metadata_roundtrip() {
        let meta = sample();
        let decoded = MetadataResponse::decode(&meta.encode()).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_io_dtype_stays_raw_wire_code() {
        // Float16 has no native tensor materialization but is a legal
        // metadata type and must pass through untouched.
        let mut meta = sample();
        meta.inputs[0].dtype = WireType::Float16;
        let decoded = MetadataResponse::decode(&meta.encode()).unwrap();
        assert_eq!(decoded.inputs[0].dtype, WireType::Float16);
    }

    #[test]
    fn test_empty_metadata_decodes_to_defaults() {
        let meta = MetadataResponse::default();
        let decoded = MetadataResponse::decode(&meta.encode()).unwrap();
        assert_eq!(decoded.name, "");
        assert!(decoded.inputs.is_empty());
        assert!(decoded.outputs.is_empty());
    }

    #[test]
    fn test_wide_io_shape_roundtrip() {
        let mut meta = sample();
        meta.inputs[0].shape = vec![(1u64 << 33) + 7];
        let decoded = MetadataResponse::decode(&meta.encode()).unwrap();
        assert_eq!(decoded.inputs[0].shape, vec![(1u64 << 33) + 7]);
    }
}
