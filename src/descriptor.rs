//! Descriptor model for the serial protocol: commands, responses, events.
//!
//! Descriptors are produced by the upstream header/IDL parser and consumed
//! here as opaque, already-validated metadata. They are immutable for the
//! duration of one generation run; parameter order determines byte offsets
//! in the wire payload, so reordering a list changes the wire format.

/// One wire parameter: name, logical type token, declared byte length,
/// array length (1 for scalars), and a human description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub type_name: String,
    /// Declared byte length. Offsets always advance by this, even for the
    /// variable-length tail field whose actual consumption differs.
    pub length: usize,
    /// Number of repeated elements; 1 means scalar.
    pub array_len: usize,
    pub description: String,
}

impl ParameterDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        length: usize,
        array_len: usize,
        description: impl Into<String>,
    ) -> Self {
        ParameterDescriptor {
            name: name.into(),
            type_name: type_name.into(),
            length,
            array_len,
            description: description.into(),
        }
    }

    /// Repeated elements, or too wide to pack as a single scalar.
    pub fn is_array_like(&self) -> bool {
        self.array_len > 1 || self.length > 4
    }

    /// The reserved tail field ("data", any letter case) consumes all
    /// remaining input bytes on decode. Only array-like fields qualify.
    pub fn is_tail(&self) -> bool {
        self.is_array_like() && snake_case(&self.name) == "data"
    }
}

/// A host→device command: opcode, ordered parameters, optional response.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub opcode: u8,
    pub params: Vec<ParameterDescriptor>,
    pub response: Option<ResponseDescriptor>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, opcode: u8, params: Vec<ParameterDescriptor>) -> Self {
        CommandDescriptor {
            name: name.into(),
            opcode,
            params,
            response: None,
        }
    }

    pub fn with_response(mut self, response: ResponseDescriptor) -> Self {
        self.response = Some(response);
        self
    }
}

/// The device's reply to a command; shares the command's opcode.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub name: String,
    pub opcode: u8,
    pub params: Vec<ParameterDescriptor>,
}

impl ResponseDescriptor {
    pub fn new(name: impl Into<String>, opcode: u8, params: Vec<ParameterDescriptor>) -> Self {
        ResponseDescriptor {
            name: name.into(),
            opcode,
            params,
        }
    }
}

/// An unsolicited device→host event.
#[derive(Debug, Clone)]
pub struct EventDescriptor {
    pub name: String,
    pub opcode: u8,
    pub description: String,
    pub params: Vec<ParameterDescriptor>,
}

impl EventDescriptor {
    pub fn new(
        name: impl Into<String>,
        opcode: u8,
        description: impl Into<String>,
        params: Vec<ParameterDescriptor>,
    ) -> Self {
        EventDescriptor {
            name: name.into(),
            opcode,
            description: description.into(),
            params,
        }
    }
}

/// Descriptor names arrive as space-separated words ("Packet Send");
/// record artifacts carry the CamelCase form.
pub fn camel_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Parameter names become snake_case field keys in decoded records.
pub fn snake_case(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}
