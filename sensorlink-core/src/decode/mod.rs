//! Table-driven frame decoding
//!
//! Each frame kind is described by a static [`FrameSpec`]: its framing, a
//! selector telling it apart from other kinds on the same link, the expected
//! payload shape, a field layout table and the extractor that turns the
//! laid-out fields into a [`DecodedRecord`](crate::record::DecodedRecord).

pub mod decoder;
pub mod fields;
pub mod layout;

pub use decoder::{DecodeError, Decoded, FrameDecoder, MAX_SPECS};
pub use fields::{parse_coordinate, Fields, MAX_TOKENS};
pub use layout::{
    Extractor, FieldAt, FieldSpec, FieldType, FrameSpec, Selector, Shape, MAX_LATITUDE,
    MAX_LONGITUDE,
};
