//! Wire contract constants: element-type codes, union tags, field ids.
//!
//! These values are a fixed, versioned contract with GraphPipe servers and
//! must not be renumbered.

/// Element-type codes as they appear on the wire (`Type` in the schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Null = 0,
    Uint8 = 1,
    Int8 = 2,
    Uint16 = 3,
    Int16 = 4,
    Uint32 = 5,
    Int32 = 6,
    Uint64 = 7,
    Int64 = 8,
    Float16 = 9,
    Float32 = 10,
    Float64 = 11,
    String = 12,
}

impl WireType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Null),
            1 => Some(WireType::Uint8),
            2 => Some(WireType::Int8),
            3 => Some(WireType::Uint16),
            4 => Some(WireType::Int16),
            5 => Some(WireType::Uint32),
            6 => Some(WireType::Int32),
            7 => Some(WireType::Uint64),
            8 => Some(WireType::Int64),
            9 => Some(WireType::Float16),
            10 => Some(WireType::Float32),
            11 => Some(WireType::Float64),
            12 => Some(WireType::String),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Union tags for the request envelope (`Req` in the schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReqKind {
    None = 0,
    Metadata = 1,
    Infer = 2,
}

impl ReqKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ReqKind::None),
            1 => Some(ReqKind::Metadata),
            2 => Some(ReqKind::Infer),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Vtable slot numbers for every table in the schema.
pub(crate) mod field {
    pub mod request {
        pub const REQ_TYPE: u16 = 0;
        pub const REQ: u16 = 1;
    }

    pub mod tensor {
        pub const SHAPE: u16 = 0;
        pub const TYPE: u16 = 1;
        pub const DATA: u16 = 2;
    }

    pub mod infer_request {
        pub const INPUT_TENSORS: u16 = 0;
        pub const INPUT_NAMES: u16 = 1;
        pub const OUTPUT_NAMES: u16 = 2;
        pub const CONFIG: u16 = 3;
    }

    pub mod infer_response {
        pub const OUTPUT_TENSORS: u16 = 0;
    }

    pub mod metadata_response {
        pub const NAME: u16 = 0;
        pub const VERSION: u16 = 1;
        pub const SERVER: u16 = 2;
        pub const DESCRIPTION: u16 = 3;
        pub const INPUTS: u16 = 4;
        pub const OUTPUTS: u16 = 5;
    }

    pub mod io_metadata {
        pub const NAME: u16 = 0;
        pub const DESCRIPTION: u16 = 1;
        pub const TYPE: u16 = 2;
        pub const SHAPE: u16 = 3;
    }
}
