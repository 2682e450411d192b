use thiserror::Error;

/// Every structural failure the decoder can raise, each carrying the byte
/// offset or constant-pool index at which it was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated input: needed {needed} more byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic number {found:#010X} at offset 0, expected 0xCAFEBABE")]
    BadMagic { found: u32 },

    #[error("constant pool index {index} at offset {offset} does not refer to a {expected} entry")]
    BadConstantRef {
        offset: usize,
        index: u16,
        expected: &'static str,
    },

    #[error("constant pool entry {index} is not a {expected} entry")]
    WrongTag { index: u16, expected: &'static str },

    #[error("invalid modified-UTF-8 sequence in constant pool entry {index} at byte {offset}")]
    BadUtf8 { index: u16, offset: usize },

    #[error("unknown opcode {opcode:#04X} at code offset {offset}")]
    UnknownOpcode { offset: u32, opcode: u8 },

    #[error("malformed code attribute: {reason} (offset {offset}, code_length {code_length})")]
    MalformedCode {
        offset: u32,
        code_length: u32,
        reason: &'static str,
    },

    #[error("constant pool tag {tag} at offset {offset} is not recognized")]
    BadConstantTag { offset: usize, tag: u8 },

    #[error("class file has {extra} trailing byte(s) after the last declared structure")]
    ExtraBytes { extra: usize },

    #[error("operation was cancelled before completing")]
    Cancelled,
}

/// A non-fatal condition recorded alongside an otherwise successful decode.
///
/// `UnsupportedVersion` is never fatal: newer major versions than this crate
/// was written against still parse, with their attributes preserved
/// opaquely. `AttributeLengthMismatch` downgrades what would otherwise be a
/// fatal error: the decoder seeks past the attribute using its declared
/// length and keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnsupportedVersion { major: u16, minor: u16 },
    AttributeLengthMismatch {
        attribute: String,
        declared: u32,
        actual: u32,
    },
}
