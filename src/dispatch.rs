//! Opcode-indexed dispatch tables for responses and events.
//!
//! The response table is built only from commands that declare a response
//! with at least one parameter; the event table holds every event. Both
//! dispatch entry points distinguish a malformed input (`TypeMismatch`)
//! from an opcode the table simply does not know (`Ok(None)`).

use crate::codec::{CodecError, CommandEncoder, RecordDecoder, RecordSynthesizer, Strictness};
use crate::descriptor::{camel_case, CommandDescriptor, EventDescriptor};
use crate::types::TypeMapper;
use crate::value::DecodedRecord;
use std::collections::HashMap;
use tracing::warn;

/// One response-table entry: the decoder plus the bare response name
/// returned for status-only (empty payload) responses.
#[derive(Debug, Clone)]
pub struct ResponseEntry {
    pub name: String,
    pub decoder: RecordDecoder,
}

/// Result of response dispatch when the opcode is known.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Status-only response: empty payload, just the response name.
    Status(String),
    /// Structured payload decoded through the mapped decoder.
    Record(DecodedRecord),
}

/// opcode → response decoder, from commands declaring a non-empty response.
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    entries: HashMap<u8, ResponseEntry>,
}

impl ResponseTable {
    pub fn get(&self, opcode: u8) -> Option<&ResponseEntry> {
        self.entries.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch one response envelope: first byte is the opcode, the
    /// remainder is the payload. An empty buffer lacks the envelope shape.
    /// Unknown opcodes are not an error; callers see `Ok(None)`.
    pub fn dispatch(&self, envelope: &[u8]) -> Result<Option<ResponseOutcome>, CodecError> {
        let (opcode, payload) = match envelope.split_first() {
            Some(parts) => parts,
            None => {
                return Err(CodecError::TypeMismatch(
                    "response envelope: missing opcode byte".to_string(),
                ))
            }
        };
        let entry = match self.entries.get(opcode) {
            Some(e) => e,
            None => return Ok(None),
        };
        if payload.is_empty() {
            // Status-only response: nothing to decode, report the name.
            Ok(Some(ResponseOutcome::Status(entry.name.clone())))
        } else {
            Ok(Some(ResponseOutcome::Record(entry.decoder.decode(payload)?)))
        }
    }
}

/// opcode → event decoder, from all events. Also carries the sorted
/// `(name, opcode)` listing the generated artifacts expose alongside the
/// table.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    entries: HashMap<u8, RecordDecoder>,
    names: Vec<(String, u8)>,
}

impl EventTable {
    pub fn get(&self, opcode: u8) -> Option<&RecordDecoder> {
        self.entries.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, opcode)` pairs sorted by name.
    pub fn opcodes(&self) -> &[(String, u8)] {
        &self.names
    }

    pub fn opcode_by_name(&self, name: &str) -> Option<u8> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, op)| *op)
    }

    /// Dispatch one raw event buffer: byte 0 is the framing/header byte,
    /// byte 1 the opcode, the rest the payload. Buffers shorter than two
    /// bytes lack the required shape.
    pub fn dispatch(&self, buffer: &[u8]) -> Result<Option<DecodedRecord>, CodecError> {
        if buffer.len() < 2 {
            return Err(CodecError::TypeMismatch(
                "event buffer: need framing byte and opcode".to_string(),
            ));
        }
        match self.entries.get(&buffer[1]) {
            Some(decoder) => Ok(Some(decoder.decode(&buffer[2..])?)),
            None => Ok(None),
        }
    }
}

/// Everything generated from one descriptor set.
#[derive(Debug, Clone)]
pub struct GeneratedProtocol {
    /// Command encoders in descriptor order.
    pub commands: Vec<CommandEncoder>,
    pub responses: ResponseTable,
    pub events: EventTable,
}

impl GeneratedProtocol {
    /// Look up a command encoder by its CamelCase name.
    pub fn command(&self, name: &str) -> Option<&CommandEncoder> {
        self.commands.iter().find(|c| c.name() == name)
    }
}

/// Builds command encoders and the two dispatch tables from parsed
/// descriptors. One-shot: descriptors in, artifacts out, deterministic for
/// a given descriptor order.
#[derive(Debug, Clone)]
pub struct DispatchTableBuilder {
    synth: RecordSynthesizer,
}

impl DispatchTableBuilder {
    pub fn new(mapper: TypeMapper, strictness: Strictness) -> Self {
        DispatchTableBuilder {
            synth: RecordSynthesizer::new(mapper, strictness),
        }
    }

    pub fn build(
        &self,
        commands: &[CommandDescriptor],
        events: &[EventDescriptor],
    ) -> Result<GeneratedProtocol, CodecError> {
        let strict = self.synth.strictness() == Strictness::Strict;

        let mut encoders = Vec::with_capacity(commands.len());
        let mut command_opcodes: HashMap<u8, String> = HashMap::new();
        let mut responses = ResponseTable::default();
        for cmd in commands {
            let encoder = self.synth.command_encoder(cmd)?;
            if let Some(first) = command_opcodes.insert(cmd.opcode, encoder.name().to_string()) {
                if strict {
                    return Err(CodecError::OpcodeCollision {
                        opcode: cmd.opcode,
                        first,
                        second: encoder.name().to_string(),
                    });
                }
                warn!(opcode = cmd.opcode, first = %first, second = %encoder.name(), "command opcode collision");
            }
            encoders.push(encoder);

            // Only commands whose response carries parameters get a table
            // entry; a zero-parameter response dispatches to None.
            let rsp = match &cmd.response {
                Some(r) if !r.params.is_empty() => r,
                _ => continue,
            };
            let decoder = self.synth.response_decoder(rsp)?;
            let entry = ResponseEntry {
                name: decoder.name().to_string(),
                decoder,
            };
            if let Some(prev) = responses.entries.insert(rsp.opcode, entry) {
                let second = responses.entries[&rsp.opcode].name.clone();
                if strict {
                    return Err(CodecError::OpcodeCollision {
                        opcode: rsp.opcode,
                        first: prev.name,
                        second,
                    });
                }
                warn!(opcode = rsp.opcode, first = %prev.name, second = %second, "response opcode collision, keeping later entry");
            }
        }

        let mut event_table = EventTable::default();
        for evt in events {
            let decoder = self.synth.event_decoder(evt)?;
            event_table
                .names
                .push((camel_case(&evt.name), evt.opcode));
            if let Some(prev) = event_table.entries.insert(evt.opcode, decoder) {
                let second = event_table.entries[&evt.opcode].name().to_string();
                if strict {
                    return Err(CodecError::OpcodeCollision {
                        opcode: evt.opcode,
                        first: prev.name().to_string(),
                        second,
                    });
                }
                warn!(opcode = evt.opcode, first = %prev.name(), second = %second, "event opcode collision, keeping later entry");
            }
        }
        event_table.names.sort();

        Ok(GeneratedProtocol {
            commands: encoders,
            responses,
            events: event_table,
        })
    }
}
