pub mod access_flags;
/// [Attributes](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=135)
pub mod attributes;
/// [The instruction set](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=321)
pub mod bytecode;
pub mod cancel;
/// [Class File Format](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=97)
pub mod class_file;
/// [The constant pool](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=103)
pub mod constant_pool;
pub mod cursor;
/// [Descriptors](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=134)
pub mod descriptor;
pub mod error;
mod modified_utf8;

pub use class_file::{ClassFile, Field, Method, ParseOutcome};
pub use error::{DecodeError, Warning};
pub use modified_utf8::{decode as decode_modified_utf8, encode as encode_modified_utf8};
