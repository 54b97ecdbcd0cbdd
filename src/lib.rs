//! # opcodec — Opcode-Indexed Binary Codec Generation
//!
//! Compiles a declarative description of a binary command/response/event
//! protocol into encoder/decoder artifacts plus opcode-indexed dispatch
//! tables, for embedded/host serial links where the wire format must come
//! from a single source of truth instead of being hand-written per field.
//!
//! ## Pipeline
//!
//! - **Descriptors**: [`CommandDescriptor`], [`ResponseDescriptor`],
//!   [`EventDescriptor`] with ordered [`ParameterDescriptor`] lists, as
//!   produced by the upstream header/IDL parser (external to this crate).
//! - **Type mapping**: [`TypeMapper`] resolves logical type tokens or byte
//!   widths to little-endian scalar encodings.
//! - **Record synthesis**: [`RecordSynthesizer`] lowers each descriptor into
//!   a [`CommandEncoder`] (values → [`Frame`]) or [`RecordDecoder`]
//!   (bytes → [`DecodedRecord`]).
//! - **Dispatch**: [`DispatchTableBuilder`] aggregates the decoders into a
//!   [`ResponseTable`] and an [`EventTable`], each with an opcode-keyed
//!   dispatch entry point.
//!
//! ## Example
//!
//! ```
//! use opcodec::{
//!     CommandDescriptor, DispatchTableBuilder, ParameterDescriptor, Strictness,
//!     TypeMapper, Value,
//! };
//!
//! let echo = CommandDescriptor::new(
//!     "echo",
//!     0x02,
//!     vec![ParameterDescriptor::new("value", "uint8_t", 1, 1, "Echoed byte")],
//! );
//! let builder = DispatchTableBuilder::new(TypeMapper::new(), Strictness::Lenient);
//! let generated = builder.build(&[echo], &[]).unwrap();
//! let frame = generated.commands[0].encode(&[Value::U8(7)]).unwrap();
//! assert_eq!((frame.opcode, frame.payload.as_slice()), (0x02, &[0x07][..]));
//! ```
//!
//! Generation is fully synchronous and deterministic: identical descriptor
//! order yields byte-identical artifacts.

pub mod codec;
pub mod descriptor;
pub mod dispatch;
pub mod types;
pub mod value;

pub use codec::{
    CodecError, CommandEncoder, Frame, RecordDecoder, RecordSynthesizer, Strictness,
};
pub use descriptor::{
    camel_case, snake_case, CommandDescriptor, EventDescriptor, ParameterDescriptor,
    ResponseDescriptor,
};
pub use dispatch::{
    DispatchTableBuilder, EventTable, GeneratedProtocol, ResponseEntry, ResponseOutcome,
    ResponseTable,
};
pub use types::{ScalarKind, TypeMapper};
pub use value::{DecodedRecord, Value};
