//! Native arrays and the tensor codec.
//!
//! An [`NdArray`] pairs an element type and shape with a raw little-endian
//! payload. The codec maps it to and from the wire Tensor table.

use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use crate::builder::{Builder, WireOffset};
use crate::constants::{field, WireType};
use crate::error::{ProtocolError, Result};
use crate::reader::Table;

/// Element types that have a native array representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
}

impl ElementType {
    /// Width of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::Uint64 | ElementType::Float64 => 8,
        }
    }

    /// Wire code for this element type. Total over the enumeration.
    pub fn to_wire(self) -> WireType {
        match self {
            ElementType::Int8 => WireType::Int8,
            ElementType::Uint8 => WireType::Uint8,
            ElementType::Int16 => WireType::Int16,
            ElementType::Uint16 => WireType::Uint16,
            ElementType::Int32 => WireType::Int32,
            ElementType::Uint32 => WireType::Uint32,
            ElementType::Int64 => WireType::Int64,
            ElementType::Uint64 => WireType::Uint64,
            ElementType::Float32 => WireType::Float32,
            ElementType::Float64 => WireType::Float64,
        }
    }

    /// Inverse of [`to_wire`](Self::to_wire) for the codes that have a
    /// native array type.
    pub fn from_wire(wire: WireType) -> Result<Self> {
        match wire {
            WireType::Int8 => Ok(ElementType::Int8),
            WireType::Uint8 => Ok(ElementType::Uint8),
            WireType::Int16 => Ok(ElementType::Int16),
            WireType::Uint16 => Ok(ElementType::Uint16),
            WireType::Int32 => Ok(ElementType::Int32),
            WireType::Uint32 => Ok(ElementType::Uint32),
            WireType::Int64 => Ok(ElementType::Int64),
            WireType::Uint64 => Ok(ElementType::Uint64),
            WireType::Float32 => Ok(ElementType::Float32),
            WireType::Float64 => Ok(ElementType::Float64),
            WireType::Null | WireType::Float16 | WireType::String => {
                Err(ProtocolError::UnsupportedType(format!("{wire:?}")))
            }
        }
    }
}

impl FromStr for ElementType {
    type Err = ProtocolError;

    /// Parses a dtype name. Clamped integer kinds normalize to their
    /// unclamped equivalent before lookup.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int8" => Ok(ElementType::Int8),
            "uint8" | "uint8_clamped" => Ok(ElementType::Uint8),
            "int16" => Ok(ElementType::Int16),
            "uint16" => Ok(ElementType::Uint16),
            "int32" => Ok(ElementType::Int32),
            "uint32" => Ok(ElementType::Uint32),
            "int64" => Ok(ElementType::Int64),
            "uint64" => Ok(ElementType::Uint64),
            "float32" => Ok(ElementType::Float32),
            "float64" => Ok(ElementType::Float64),
            other => Err(ProtocolError::UnsupportedType(other.to_string())),
        }
    }
}

/// A multidimensional array: element type, shape, raw payload bytes.
///
/// An empty shape denotes a scalar. The payload length always equals the
/// element count times the element width; construction enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: ElementType,
    shape: Vec<u64>,
    data: Vec<u8>,
}

macro_rules! typed_array {
    ($from:ident, $to:ident, $ty:ty, $elem:expr, $write:ident, $read:ident) => {
        #[doc = concat!("Builds an array of `", stringify!($ty), "` values with the given shape.")]
        pub fn $from(values: &[$ty], shape: impl Into<Vec<u64>>) -> Result<Self> {
            let mut data = vec![0u8; values.len() * std::mem::size_of::<$ty>()];
            LittleEndian::$write(values, &mut data);
            Self::from_bytes($elem, shape.into(), data)
        }

        #[doc = concat!("Copies the payload out as `", stringify!($ty), "` values, if the dtype matches.")]
        pub fn $to(&self) -> Option<Vec<$ty>> {
            if self.dtype != $elem {
                return None;
            }
            let mut out = vec![<$ty>::default(); self.data.len() / std::mem::size_of::<$ty>()];
            LittleEndian::$read(&self.data, &mut out);
            Some(out)
        }
    };
}

impl NdArray {
    /// Wraps a raw payload, validating its length against the shape.
    pub fn from_bytes(dtype: ElementType, shape: Vec<u64>, data: Vec<u8>) -> Result<Self> {
        let expected = numel(&shape) * dtype.size_of() as u128;
        if data.len() as u128 != expected {
            return Err(ProtocolError::PayloadSizeMismatch {
                expected: expected.min(usize::MAX as u128) as usize,
                got: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements described by the shape.
    pub fn numel(&self) -> u64 {
        numel(&self.shape) as u64
    }

    /// Builds an array of `u8` values with the given shape.
    pub fn from_u8(values: &[u8], shape: impl Into<Vec<u64>>) -> Result<Self> {
        Self::from_bytes(ElementType::Uint8, shape.into(), values.to_vec())
    }

    /// Builds an array of `i8` values with the given shape.
    pub fn from_i8(values: &[i8], shape: impl Into<Vec<u64>>) -> Result<Self> {
        let data = values.iter().map(|&v| v as u8).collect();
        Self::from_bytes(ElementType::Int8, shape.into(), data)
    }

    /// Copies the payload out as `u8` values, if the dtype matches.
    pub fn to_u8(&self) -> Option<Vec<u8>> {
        (self.dtype == ElementType::Uint8).then(|| self.data.clone())
    }

    /// Copies the payload out as `i8` values, if the dtype matches.
    pub fn to_i8(&self) -> Option<Vec<i8>> {
        (self.dtype == ElementType::Int8)
            .then(|| self.data.iter().map(|&b| b as i8).collect())
    }

    typed_array!(from_i16, to_i16, i16, ElementType::Int16, write_i16_into, read_i16_into);
    typed_array!(from_u16, to_u16, u16, ElementType::Uint16, write_u16_into, read_u16_into);
    typed_array!(from_i32, to_i32, i32, ElementType::Int32, write_i32_into, read_i32_into);
    typed_array!(from_u32, to_u32, u32, ElementType::Uint32, write_u32_into, read_u32_into);
    typed_array!(from_i64, to_i64, i64, ElementType::Int64, write_i64_into, read_i64_into);
    typed_array!(from_u64, to_u64, u64, ElementType::Uint64, write_u64_into, read_u64_into);
    typed_array!(from_f32, to_f32, f32, ElementType::Float32, write_f32_into, read_f32_into);
    typed_array!(from_f64, to_f64, f64, ElementType::Float64, write_f64_into, read_f64_into);
}

fn numel(shape: &[u64]) -> u128 {
    shape.iter().map(|&d| d as u128).product()
}

/// Encodes one array as a wire Tensor table.
///
/// Each dimension is written as an int64 split into low/high 32-bit halves,
/// and the payload bytes are copied verbatim.
pub(crate) fn encode_tensor(b: &mut Builder, array: &NdArray) -> WireOffset {
    let wire = array.dtype().to_wire();
    let shape = b.create_dim_vector(array.shape());
    let data = b.create_byte_vector(array.data());
    b.start_table();
    b.push_slot_offset(field::tensor::SHAPE, shape);
    b.push_slot_u8(field::tensor::TYPE, wire.to_u8(), WireType::Null.to_u8());
    b.push_slot_offset(field::tensor::DATA, data);
    b.end_table()
}

/// Decodes a wire Tensor table back into a native array.
///
/// 64-bit integer payloads have no native materialization here and fail
/// with `UnhandledDataType`, as do Null/Float16/String codes.
pub(crate) fn decode_tensor(table: &Table) -> Result<NdArray> {
    let code = table.get_u8(field::tensor::TYPE, WireType::Null.to_u8())?;
    let wire = WireType::from_u8(code).ok_or(ProtocolError::UnknownWireType(code))?;
    let dtype = match wire {
        WireType::Int8 => ElementType::Int8,
        WireType::Uint8 => ElementType::Uint8,
        WireType::Int16 => ElementType::Int16,
        WireType::Uint16 => ElementType::Uint16,
        WireType::Int32 => ElementType::Int32,
        WireType::Uint32 => ElementType::Uint32,
        WireType::Float32 => ElementType::Float32,
        WireType::Float64 => ElementType::Float64,
        WireType::Int64
        | WireType::Uint64
        | WireType::Null
        | WireType::Float16
        | WireType::String => return Err(ProtocolError::UnhandledDataType(wire)),
    };
    let shape = table.get_dims(field::tensor::SHAPE)?;
    let data = table
        .get_bytes(field::tensor::DATA)?
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    NdArray::from_bytes(dtype, shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(array: &NdArray) -> NdArray {
        let mut b = Builder::new();
        let tensor = encode_tensor(&mut b, array);
        b.start_table();
        b.push_slot_offset(0, tensor);
        let root = b.end_table();
        let buf = b.finish(root);

        let outer = Table::root(&buf).unwrap();
        let table = outer.get_table(0).unwrap().unwrap();
        decode_tensor(&table).unwrap()
    }

    #[test]
    fn test_float32_roundtrip() {
        let array = NdArray::from_f32(&[1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let decoded = roundtrip(&array);
        assert_eq!(decoded, array);
        assert_eq!(decoded.to_f32().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_all_decodable_types_roundtrip() {
        let arrays = vec![
            NdArray::from_i8(&[-1, 2], vec![2]).unwrap(),
            NdArray::from_u8(&[1, 2, 3], vec![3]).unwrap(),
            NdArray::from_i16(&[-300, 300], vec![2]).unwrap(),
            NdArray::from_u16(&[500, 600], vec![2]).unwrap(),
            NdArray::from_i32(&[-70000], vec![1]).unwrap(),
            NdArray::from_u32(&[70000, 80000], vec![1, 2]).unwrap(),
            NdArray::from_f32(&[0.5], vec![]).unwrap(),
            NdArray::from_f64(&[0.25, 0.75], vec![2, 1]).unwrap(),
        ];
        for array in arrays {
            let decoded = roundtrip(&array);
            assert_eq!(decoded, array);
        }
    }

    #[test]
    fn test_scalar_has_empty_shape() {
        let array = NdArray::from_f64(&[3.5], vec![]).unwrap();
        assert_eq!(array.shape(), &[] as &[u64]);
        assert_eq!(array.numel(), 1);
        assert_eq!(roundtrip(&array).to_f64().unwrap(), vec![3.5]);
    }

    #[test]
    fn test_wide_dimension_roundtrip() {
        // Dimensions above 2^32-1 keep their high half on the wire.
        let dim = (1u64 << 32) + 5;
        let array = NdArray::from_bytes(ElementType::Uint8, vec![dim, 0], Vec::new()).unwrap();
        let decoded = roundtrip(&array);
        assert_eq!(decoded.shape(), &[dim, 0]);
    }

    #[test]
    fn test_int64_payload_is_unhandled() {
        let array = NdArray::from_i64(&[1, 2], vec![2]).unwrap();
        let mut b = Builder::new();
        let tensor = encode_tensor(&mut b, &array);
        b.start_table();
        b.push_slot_offset(0, tensor);
        let root = b.end_table();
        let buf = b.finish(root);

        let outer = Table::root(&buf).unwrap();
        let table = outer.get_table(0).unwrap().unwrap();
        assert!(matches!(
            decode_tensor(&table),
            Err(ProtocolError::UnhandledDataType(WireType::Int64))
        ));
    }

    #[test]
    fn test_payload_size_mismatch_rejected() {
        let result = NdArray::from_bytes(ElementType::Float32, vec![2, 2], vec![0u8; 15]);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadSizeMismatch {
                expected: 16,
                got: 15
            })
        ));
    }

    #[test]
    fn test_dtype_name_parsing() {
        assert_eq!("float32".parse::<ElementType>().unwrap(), ElementType::Float32);
        assert_eq!(
            "uint8_clamped".parse::<ElementType>().unwrap(),
            ElementType::Uint8
        );
        assert!(matches!(
            "complex64".parse::<ElementType>(),
            Err(ProtocolError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_registry_inverse() {
        let all = [
            ElementType::Int8,
            ElementType::Uint8,
            ElementType::Int16,
            ElementType::Uint16,
            ElementType::Int32,
            ElementType::Uint32,
            ElementType::Int64,
            ElementType::Uint64,
            ElementType::Float32,
            ElementType::Float64,
        ];
        for dtype in all {
            assert_eq!(ElementType::from_wire(dtype.to_wire()).unwrap(), dtype);
        }
        assert!(matches!(
            ElementType::from_wire(WireType::Float16),
            Err(ProtocolError::UnsupportedType(_))
        ));
    }
}
