//! Lower descriptors into per-field codec plans and record artifacts.
//!
//! Each record's parameter list is compiled once into an ordered op list
//! with precomputed byte offsets; encode/decode runs replay the plan without
//! re-consulting descriptors. The offset invariant: every field advances the
//! running offset by its *declared* length, even the variable-length tail
//! whose actual consumption extends to the end of the buffer. An off-by-one
//! in any declared length misaligns every subsequent field.

use crate::descriptor::{
    camel_case, snake_case, CommandDescriptor, EventDescriptor, ParameterDescriptor,
    ResponseDescriptor,
};
use crate::types::{ScalarKind, TypeMapper};
use crate::value::{DecodedRecord, Value};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A dispatch input lacked the required envelope/buffer shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Strict mode only; lenient generation degrades to a raw byte copy.
    #[error("no mapping for type \"{type_name}\" ({length} bytes) of parameter {param}")]
    UnmappedType {
        param: String,
        type_name: String,
        length: usize,
    },
    /// Strict mode only; lenient tables keep the later entry.
    #[error("opcode 0x{opcode:02X} claimed by both {first} and {second}")]
    OpcodeCollision {
        opcode: u8,
        first: String,
        second: String,
    },
    #[error("{name}: expected {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Lenient keeps generation permissive (unmapped type → warn and copy raw
/// bytes, opcode collision → last write wins); strict turns both into hard
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Lenient,
    Strict,
}

/// One lowered encode step for a single parameter.
#[derive(Debug, Clone)]
enum EncodeOp {
    /// Pack a scalar at the resolved width, little-endian.
    Pack(ScalarKind),
    /// Append the supplied bytes verbatim (arrays and unmapped scalars).
    Append,
}

/// One lowered decode step for a single parameter. Offsets and spans are
/// fixed at synthesis time from the declared lengths.
#[derive(Debug, Clone)]
enum DecodeOp {
    Scalar { kind: ScalarKind, offset: usize },
    /// Fixed raw byte run of `span` bytes.
    Bytes { offset: usize, span: usize },
    /// Variable-length tail: consume from `offset` to the end of the buffer.
    Tail { offset: usize },
}

/// Encoder output: opcode plus serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

/// Encodes one command: exactly one [`Value`] per declared parameter, in
/// declaration order. The payload is the concatenation of the per-field
/// appends; that order is part of the wire contract.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    name: String,
    opcode: u8,
    plan: Vec<(String, EncodeOp)>,
}

impl CommandEncoder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Number of arguments [`encode`](Self::encode) expects.
    pub fn arity(&self) -> usize {
        self.plan.len()
    }

    pub fn encode(&self, args: &[Value]) -> Result<Frame, CodecError> {
        if args.len() != self.plan.len() {
            return Err(CodecError::Arity {
                name: self.name.clone(),
                expected: self.plan.len(),
                got: args.len(),
            });
        }
        let mut payload = Vec::new();
        for ((_, op), value) in self.plan.iter().zip(args) {
            match op {
                EncodeOp::Pack(kind) => pack_scalar(&mut payload, *kind, value)?,
                EncodeOp::Append => {
                    payload.extend_from_slice(value.as_bytes().unwrap_or_default())
                }
            }
        }
        Ok(Frame {
            opcode: self.opcode,
            payload,
        })
    }
}

/// Decodes one response or event payload into a [`DecodedRecord`].
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    name: String,
    opcode: u8,
    description: String,
    plan: Vec<(String, DecodeOp)>,
    /// Sum of declared lengths; where the running offset ends up after all
    /// fields, tail or not.
    extent: usize,
}

impl RecordDecoder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Final decode offset: the sum of all declared parameter lengths.
    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn decode(&self, payload: &[u8]) -> Result<DecodedRecord, CodecError> {
        let mut fields = Vec::with_capacity(self.plan.len());
        let mut cursor = Cursor::new(payload);
        for (key, op) in &self.plan {
            let value = match op {
                DecodeOp::Scalar { kind, offset } => {
                    cursor.set_position(*offset as u64);
                    read_scalar(&mut cursor, *kind)?
                }
                DecodeOp::Bytes { offset, span } => {
                    cursor.set_position(*offset as u64);
                    let mut buf = vec![0u8; *span];
                    cursor.read_exact(&mut buf)?;
                    Value::Bytes(buf)
                }
                DecodeOp::Tail { offset } => {
                    // A tail starting past the end is empty, not an error.
                    Value::Bytes(payload.get(*offset..).unwrap_or_default().to_vec())
                }
            };
            fields.push((key.clone(), value));
        }
        Ok(DecodedRecord::new(
            self.name.clone(),
            self.opcode,
            self.description.clone(),
            fields,
        ))
    }
}

/// Compiles descriptors into codec artifacts: one [`CommandEncoder`] per
/// command, one [`RecordDecoder`] per response or event.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    mapper: TypeMapper,
    strictness: Strictness,
}

impl RecordSynthesizer {
    pub fn new(mapper: TypeMapper, strictness: Strictness) -> Self {
        RecordSynthesizer { mapper, strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn command_encoder(&self, cmd: &CommandDescriptor) -> Result<CommandEncoder, CodecError> {
        let name = camel_case(&cmd.name);
        let plan = self.encode_plan(&cmd.params)?;
        debug!(command = %name, opcode = cmd.opcode, fields = plan.len(), "compiled command encoder");
        Ok(CommandEncoder {
            name,
            opcode: cmd.opcode,
            plan,
        })
    }

    pub fn response_decoder(&self, rsp: &ResponseDescriptor) -> Result<RecordDecoder, CodecError> {
        self.record_decoder(&rsp.name, rsp.opcode, "", &rsp.params)
    }

    pub fn event_decoder(&self, evt: &EventDescriptor) -> Result<RecordDecoder, CodecError> {
        self.record_decoder(&evt.name, evt.opcode, &evt.description, &evt.params)
    }

    fn record_decoder(
        &self,
        name: &str,
        opcode: u8,
        description: &str,
        params: &[ParameterDescriptor],
    ) -> Result<RecordDecoder, CodecError> {
        let name = camel_case(name);
        let (plan, extent) = self.decode_plan(params)?;
        debug!(record = %name, opcode, fields = plan.len(), extent, "compiled record decoder");
        Ok(RecordDecoder {
            name,
            opcode,
            description: description.to_string(),
            plan,
            extent,
        })
    }

    fn encode_plan(
        &self,
        params: &[ParameterDescriptor],
    ) -> Result<Vec<(String, EncodeOp)>, CodecError> {
        let mut plan = Vec::with_capacity(params.len());
        for p in params {
            let op = if p.array_len > 1 {
                EncodeOp::Append
            } else {
                match self.resolve(p)? {
                    Some(kind) => EncodeOp::Pack(kind),
                    None => EncodeOp::Append,
                }
            };
            plan.push((snake_case(&p.name), op));
        }
        Ok(plan)
    }

    /// Lower the parameter list into decode ops, tracking the running
    /// offset. The offset always advances by the declared length; only the
    /// tail field's actual consumption may diverge from it.
    fn decode_plan(
        &self,
        params: &[ParameterDescriptor],
    ) -> Result<(Vec<(String, DecodeOp)>, usize), CodecError> {
        let mut plan = Vec::with_capacity(params.len());
        let mut offset = 0usize;
        for p in params {
            let op = if p.is_array_like() {
                if p.is_tail() {
                    DecodeOp::Tail { offset }
                } else {
                    DecodeOp::Bytes {
                        offset,
                        span: p.array_len.max(p.length),
                    }
                }
            } else {
                match self.resolve(p)? {
                    Some(kind) => DecodeOp::Scalar { kind, offset },
                    None => DecodeOp::Bytes {
                        offset,
                        span: p.length,
                    },
                }
            };
            plan.push((snake_case(&p.name), op));
            offset += p.length;
        }
        Ok((plan, offset))
    }

    /// Token-then-width resolution. Lenient: warn and return `None` so the
    /// caller falls back to a raw byte copy. Strict: hard error.
    fn resolve(&self, p: &ParameterDescriptor) -> Result<Option<ScalarKind>, CodecError> {
        match self.mapper.resolve(&p.type_name, p.length) {
            Some(kind) => Ok(Some(kind)),
            None if self.strictness == Strictness::Strict => Err(CodecError::UnmappedType {
                param: snake_case(&p.name),
                type_name: p.type_name.clone(),
                length: p.length,
            }),
            None => {
                warn!(
                    param = %p.name,
                    type_name = %p.type_name,
                    length = p.length,
                    "no scalar mapping, treating as raw bytes"
                );
                Ok(None)
            }
        }
    }
}

fn pack_scalar(out: &mut Vec<u8>, kind: ScalarKind, v: &Value) -> Result<(), CodecError> {
    match kind {
        ScalarKind::U8 => out.write_u8(v.as_u64().unwrap_or(0) as u8)?,
        ScalarKind::U16 => out.write_u16::<LittleEndian>(v.as_u64().unwrap_or(0) as u16)?,
        ScalarKind::U32 => out.write_u32::<LittleEndian>(v.as_u64().unwrap_or(0) as u32)?,
        ScalarKind::I8 => out.write_i8(v.as_i64().unwrap_or(0) as i8)?,
        ScalarKind::I16 => out.write_i16::<LittleEndian>(v.as_i64().unwrap_or(0) as i16)?,
        ScalarKind::I32 => out.write_i32::<LittleEndian>(v.as_i64().unwrap_or(0) as i32)?,
        ScalarKind::Bool => {
            let set = v
                .as_bool()
                .or_else(|| v.as_u64().map(|n| n != 0))
                .unwrap_or(false);
            out.write_u8(u8::from(set))?;
        }
    }
    Ok(())
}

fn read_scalar(r: &mut Cursor<&[u8]>, kind: ScalarKind) -> Result<Value, CodecError> {
    Ok(match kind {
        ScalarKind::U8 => Value::U8(r.read_u8()?),
        ScalarKind::U16 => Value::U16(r.read_u16::<LittleEndian>()?),
        ScalarKind::U32 => Value::U32(r.read_u32::<LittleEndian>()?),
        ScalarKind::I8 => Value::I8(r.read_i8()?),
        ScalarKind::I16 => Value::I16(r.read_i16::<LittleEndian>()?),
        ScalarKind::I32 => Value::I32(r.read_i32::<LittleEndian>()?),
        ScalarKind::Bool => Value::Bool(r.read_u8()? != 0),
    })
}
