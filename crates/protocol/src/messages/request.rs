//! Request envelope: a tagged union wrapping the two request kinds.

use crate::builder::Builder;
use crate::constants::{field, ReqKind};
use crate::error::{ProtocolError, Result};
use crate::messages::InferRequest;
use crate::reader::Table;

/// The two requests a GraphPipe server accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Ask the service to describe itself and its inputs/outputs.
    Metadata,
    /// Run the model on a set of input tensors.
    Infer(InferRequest),
}

impl Request {
    /// Encodes the finished envelope with the matching union tag.
    pub fn encode(&self) -> Vec<u8> {
        let mut b = Builder::new();
        let (kind, payload) = match self {
            Request::Metadata => {
                b.start_table();
                (ReqKind::Metadata, b.end_table())
            }
            Request::Infer(request) => (ReqKind::Infer, request.encode_table(&mut b)),
        };
        b.start_table();
        b.push_slot_u8(field::request::REQ_TYPE, kind.to_u8(), ReqKind::None.to_u8());
        b.push_slot_offset(field::request::REQ, payload);
        let root = b.end_table();
        b.finish(root)
    }

    /// Decodes an envelope, dispatching on its union tag.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let root = Table::root(buf)?;
        let tag = root.get_u8(field::request::REQ_TYPE, ReqKind::None.to_u8())?;
        match ReqKind::from_u8(tag) {
            Some(ReqKind::Metadata) => Ok(Request::Metadata),
            Some(ReqKind::Infer) => {
                let table = root
                    .get_table(field::request::REQ)?
                    .ok_or(ProtocolError::MissingField("req"))?;
                Ok(Request::Infer(InferRequest::decode_table(&table)?))
            }
            Some(ReqKind::None) | None => Err(ProtocolError::UnknownRequestKind(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::NdArray;

    #[test]
    fn test_metadata_request_roundtrip() {
        let encoded = Request::Metadata.encode();
        let decoded = Request::decode(&encoded).unwrap();
        assert_eq!(decoded, Request::Metadata);
    }

    #[test]
    fn test_infer_request_roundtrip() {
        let request = Request::Infer(InferRequest {
            input_tensors: vec![
                NdArray::from_f32(&[1.0, 2.0], vec![2]).unwrap(),
                NdArray::from_i32(&[7], vec![1]).unwrap(),
            ],
            input_names: vec!["a".to_string(), "b".to_string()],
            output_names: vec!["out".to_string()],
            config: "version=2".to_string(),
        });
        let encoded = request.encode();
        let decoded = Request::decode(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_infer_request_defaults_are_empty() {
        let request = Request::Infer(InferRequest {
            input_tensors: vec![NdArray::from_f32(&[0.0], vec![1]).unwrap()],
            ..InferRequest::default()
        });
        let encoded = request.encode();
        let Request::Infer(decoded) = Request::decode(&encoded).unwrap() else {
            panic!("expected an infer request");
        };
        assert!(decoded.input_names.is_empty());
        assert!(decoded.output_names.is_empty());
        assert_eq!(decoded.config, "");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut b = Builder::new();
        b.start_table();
        b.push_slot_u8(field::request::REQ_TYPE, 9, 0);
        let root = b.end_table();
        let buf = b.finish(root);

        assert!(matches!(
            Request::decode(&buf),
            Err(ProtocolError::UnknownRequestKind(9))
        ));
    }

    #[test]
    fn test_garbage_buffer_rejected() {
        assert!(Request::decode(&[0xFF, 0x01, 0x02]).is_err());
    }
}
