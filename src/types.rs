//! Logical type resolution: protocol type tokens to scalar wire encodings.
//!
//! The protocol's type vocabulary (C typedefs in the source headers) evolves
//! faster than this table; a missing entry must degrade to a raw byte copy
//! rather than block generation, so resolution returns `Option` and leaves
//! the lenient/strict decision to the caller.

use std::collections::HashMap;

/// Scalar wire encoding for a fixed-width field. All multi-byte encodings
/// are little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    /// Encoded as one byte, zero or one.
    Bool,
}

impl ScalarKind {
    /// Encoded width in bytes.
    pub fn width(self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 | ScalarKind::Bool => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 => 4,
        }
    }
}

/// Maps logical type tokens and byte widths to scalar encodings.
///
/// Resolution order is token first, declared width second. The built-in
/// table carries the stdint vocabulary plus the protocol's handle typedefs;
/// downstream protocols register further typedefs with [`with_alias`]
/// instead of forking the table.
///
/// [`with_alias`]: TypeMapper::with_alias
#[derive(Debug, Clone)]
pub struct TypeMapper {
    tokens: HashMap<String, ScalarKind>,
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapper {
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert("uint8_t".to_string(), ScalarKind::U8);
        tokens.insert("int8_t".to_string(), ScalarKind::I8);
        tokens.insert("uint16_t".to_string(), ScalarKind::U16);
        tokens.insert("int16_t".to_string(), ScalarKind::I16);
        tokens.insert("uint32_t".to_string(), ScalarKind::U32);
        tokens.insert("int32_t".to_string(), ScalarKind::I32);
        tokens.insert("bool".to_string(), ScalarKind::Bool);
        tokens.insert("dsm_handle_t".to_string(), ScalarKind::U16);
        tokens.insert("access_model_handle_t".to_string(), ScalarKind::U16);
        TypeMapper { tokens }
    }

    /// Register an extra type token. Replaces any existing entry.
    pub fn with_alias(mut self, token: impl Into<String>, kind: ScalarKind) -> Self {
        self.tokens.insert(token.into(), kind);
        self
    }

    /// Resolve a parameter's scalar encoding: token first, width second.
    /// `None` means the raw-byte-copy fallback applies.
    pub fn resolve(&self, type_name: &str, length: usize) -> Option<ScalarKind> {
        if let Some(kind) = self.tokens.get(type_name) {
            return Some(*kind);
        }
        Self::by_width(length)
    }

    fn by_width(length: usize) -> Option<ScalarKind> {
        match length {
            1 => Some(ScalarKind::U8),
            2 => Some(ScalarKind::U16),
            4 => Some(ScalarKind::U32),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_stdint_tokens() {
        let mapper = TypeMapper::new();
        assert_eq!(mapper.resolve("uint8_t", 1), Some(ScalarKind::U8));
        assert_eq!(mapper.resolve("int16_t", 2), Some(ScalarKind::I16));
        assert_eq!(mapper.resolve("uint32_t", 4), Some(ScalarKind::U32));
        assert_eq!(mapper.resolve("bool", 1), Some(ScalarKind::Bool));
    }

    #[test]
    fn token_wins_over_width() {
        // int8_t with a bogus declared length still resolves by token.
        let mapper = TypeMapper::new();
        assert_eq!(mapper.resolve("int8_t", 2), Some(ScalarKind::I8));
    }

    #[test]
    fn falls_back_to_width() {
        let mapper = TypeMapper::new();
        assert_eq!(mapper.resolve("some_enum_t", 2), Some(ScalarKind::U16));
        assert_eq!(mapper.resolve("some_enum_t", 4), Some(ScalarKind::U32));
    }

    #[test]
    fn unmapped_when_neither_resolves() {
        let mapper = TypeMapper::new();
        assert_eq!(mapper.resolve("opaque_blob_t", 3), None);
        assert_eq!(mapper.resolve("opaque_blob_t", 17), None);
    }

    #[test]
    fn handle_typedefs_are_u16() {
        let mapper = TypeMapper::new();
        assert_eq!(mapper.resolve("dsm_handle_t", 2), Some(ScalarKind::U16));
        assert_eq!(
            mapper.resolve("access_model_handle_t", 2),
            Some(ScalarKind::U16)
        );
    }

    #[test]
    fn alias_extends_the_table() {
        let mapper = TypeMapper::new().with_alias("net_key_index_t", ScalarKind::U16);
        assert_eq!(mapper.resolve("net_key_index_t", 3), Some(ScalarKind::U16));
    }
}
