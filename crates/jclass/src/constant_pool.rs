//! [The constant pool](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=103)
//!
//! The constant pool is one-indexed, and `Long`/`Double` entries occupy
//! two slots (the slot immediately following one is unusable and never
//! addressed). `ConstantPool` stores entries at their declared index so
//! lookups by index are direct array access.

use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::modified_utf8;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Utf8 => "Utf8",
            Tag::Integer => "Integer",
            Tag::Float => "Float",
            Tag::Long => "Long",
            Tag::Double => "Double",
            Tag::Class => "Class",
            Tag::String => "String",
            Tag::Fieldref => "Fieldref",
            Tag::Methodref => "Methodref",
            Tag::InterfaceMethodref => "InterfaceMethodref",
            Tag::NameAndType => "NameAndType",
            Tag::MethodHandle => "MethodHandle",
            Tag::MethodType => "MethodType",
            Tag::Dynamic => "Dynamic",
            Tag::InvokeDynamic => "InvokeDynamic",
            Tag::Module => "Module",
            Tag::Package => "Package",
        }
    }

    fn from_u8(v: u8) -> Option<Tag> {
        Some(match v {
            1 => Tag::Utf8,
            3 => Tag::Integer,
            4 => Tag::Float,
            5 => Tag::Long,
            6 => Tag::Double,
            7 => Tag::Class,
            8 => Tag::String,
            9 => Tag::Fieldref,
            10 => Tag::Methodref,
            11 => Tag::InterfaceMethodref,
            12 => Tag::NameAndType,
            15 => Tag::MethodHandle,
            16 => Tag::MethodType,
            17 => Tag::Dynamic,
            18 => Tag::InvokeDynamic,
            19 => Tag::Module,
            20 => Tag::Package,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MethodHandleKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

impl MethodHandleKind {
    fn from_u8(v: u8) -> Option<MethodHandleKind> {
        Some(match v {
            1 => MethodHandleKind::GetField,
            2 => MethodHandleKind::GetStatic,
            3 => MethodHandleKind::PutField,
            4 => MethodHandleKind::PutStatic,
            5 => MethodHandleKind::InvokeVirtual,
            6 => MethodHandleKind::InvokeStatic,
            7 => MethodHandleKind::InvokeSpecial,
            8 => MethodHandleKind::NewInvokeSpecial,
            9 => MethodHandleKind::InvokeInterface,
            _ => return None,
        })
    }

    /// References a field, per table 5.4.3.5 in the class file format.
    pub fn refers_to_field(self) -> bool {
        matches!(self, MethodHandleKind::GetField | MethodHandleKind::GetStatic | MethodHandleKind::PutField | MethodHandleKind::PutStatic)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Entry {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// The unaddressable slot following a Long or Double entry.
    Unusable,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Utf8(s) => write!(f, "Utf8({s:?})"),
            Entry::Integer(v) => write!(f, "Integer({v})"),
            Entry::Float(bits) => write!(f, "Float({:?})", f32::from_bits(*bits)),
            Entry::Long(v) => write!(f, "Long({v})"),
            Entry::Double(bits) => write!(f, "Double({:?})", f64::from_bits(*bits)),
            Entry::Class { name_index } => write!(f, "Class {{ name_index: {name_index} }}"),
            Entry::String { string_index } => write!(f, "String {{ string_index: {string_index} }}"),
            Entry::Fieldref { class_index, name_and_type_index } => {
                write!(f, "Fieldref {{ class_index: {class_index}, name_and_type_index: {name_and_type_index} }}")
            }
            Entry::Methodref { class_index, name_and_type_index } => {
                write!(f, "Methodref {{ class_index: {class_index}, name_and_type_index: {name_and_type_index} }}")
            }
            Entry::InterfaceMethodref { class_index, name_and_type_index } => {
                write!(f, "InterfaceMethodref {{ class_index: {class_index}, name_and_type_index: {name_and_type_index} }}")
            }
            Entry::NameAndType { name_index, descriptor_index } => {
                write!(f, "NameAndType {{ name_index: {name_index}, descriptor_index: {descriptor_index} }}")
            }
            Entry::MethodHandle { reference_kind, reference_index } => {
                write!(f, "MethodHandle {{ reference_kind: {reference_kind}, reference_index: {reference_index} }}")
            }
            Entry::MethodType { descriptor_index } => write!(f, "MethodType {{ descriptor_index: {descriptor_index} }}"),
            Entry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => write!(
                f,
                "Dynamic {{ bootstrap_method_attr_index: {bootstrap_method_attr_index}, name_and_type_index: {name_and_type_index} }}"
            ),
            Entry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => write!(
                f,
                "InvokeDynamic {{ bootstrap_method_attr_index: {bootstrap_method_attr_index}, name_and_type_index: {name_and_type_index} }}"
            ),
            Entry::Module { name_index } => write!(f, "Module {{ name_index: {name_index} }}"),
            Entry::Package { name_index } => write!(f, "Package {{ name_index: {name_index} }}"),
            Entry::Unusable => write!(f, "Unusable"),
        }
    }
}

impl Entry {
    pub fn tag_name(&self) -> &'static str {
        match self {
            Entry::Utf8(_) => "Utf8",
            Entry::Integer(_) => "Integer",
            Entry::Float(_) => "Float",
            Entry::Long(_) => "Long",
            Entry::Double(_) => "Double",
            Entry::Class { .. } => "Class",
            Entry::String { .. } => "String",
            Entry::Fieldref { .. } => "Fieldref",
            Entry::Methodref { .. } => "Methodref",
            Entry::InterfaceMethodref { .. } => "InterfaceMethodref",
            Entry::NameAndType { .. } => "NameAndType",
            Entry::MethodHandle { .. } => "MethodHandle",
            Entry::MethodType { .. } => "MethodType",
            Entry::Dynamic { .. } => "Dynamic",
            Entry::InvokeDynamic { .. } => "InvokeDynamic",
            Entry::Module { .. } => "Module",
            Entry::Package { .. } => "Package",
            Entry::Unusable => "Unusable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    /// Index 0 is unused, matching the one-indexed wire format.
    entries: Vec<Entry>,
}

impl ConstantPool {
    pub fn parse(cursor: &mut ByteCursor, constant_pool_count: u16) -> Result<ConstantPool, DecodeError> {
        let mut entries = Vec::with_capacity(constant_pool_count as usize);
        entries.push(Entry::Unusable);
        let mut i: u16 = 1;
        while i < constant_pool_count {
            let offset = cursor.tell();
            let tag_byte = cursor.read_u8()?;
            let tag = Tag::from_u8(tag_byte).ok_or(DecodeError::BadConstantTag { offset, tag: tag_byte })?;
            let entry = match tag {
                Tag::Utf8 => {
                    let length = cursor.read_u16()?;
                    let bytes = cursor.read_bytes(length as usize)?;
                    let s = modified_utf8::decode(bytes).map_err(|e| DecodeError::BadUtf8 { index: i, offset: offset + 3 + e.offset })?;
                    Entry::Utf8(s)
                }
                Tag::Integer => Entry::Integer(cursor.read_i32()?),
                Tag::Float => Entry::Float(cursor.read_u32()?),
                Tag::Long => Entry::Long(cursor.read_i64()?),
                Tag::Double => Entry::Double(cursor.read_u64()?),
                Tag::Class => Entry::Class { name_index: cursor.read_u16()? },
                Tag::String => Entry::String { string_index: cursor.read_u16()? },
                Tag::Fieldref => Entry::Fieldref { class_index: cursor.read_u16()?, name_and_type_index: cursor.read_u16()? },
                Tag::Methodref => Entry::Methodref { class_index: cursor.read_u16()?, name_and_type_index: cursor.read_u16()? },
                Tag::InterfaceMethodref => {
                    Entry::InterfaceMethodref { class_index: cursor.read_u16()?, name_and_type_index: cursor.read_u16()? }
                }
                Tag::NameAndType => Entry::NameAndType { name_index: cursor.read_u16()?, descriptor_index: cursor.read_u16()? },
                Tag::MethodHandle => Entry::MethodHandle { reference_kind: cursor.read_u8()?, reference_index: cursor.read_u16()? },
                Tag::MethodType => Entry::MethodType { descriptor_index: cursor.read_u16()? },
                Tag::Dynamic => {
                    Entry::Dynamic { bootstrap_method_attr_index: cursor.read_u16()?, name_and_type_index: cursor.read_u16()? }
                }
                Tag::InvokeDynamic => {
                    Entry::InvokeDynamic { bootstrap_method_attr_index: cursor.read_u16()?, name_and_type_index: cursor.read_u16()? }
                }
                Tag::Module => Entry::Module { name_index: cursor.read_u16()? },
                Tag::Package => Entry::Package { name_index: cursor.read_u16()? },
            };
            let wide = matches!(entry, Entry::Long(_) | Entry::Double(_));
            entries.push(entry);
            i += 1;
            if wide {
                entries.push(Entry::Unusable);
                i += 1;
            }
        }
        Ok(ConstantPool { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&Entry> {
        self.entries.get(index as usize).filter(|e| !matches!(e, Entry::Unusable))
    }

    pub fn as_utf8(&self, index: u16) -> Result<&str, DecodeError> {
        match self.get(index) {
            Some(Entry::Utf8(s)) => Ok(s),
            _ => Err(DecodeError::WrongTag { index, expected: "Utf8" }),
        }
    }

    pub fn as_class_name(&self, index: u16) -> Result<&str, DecodeError> {
        match self.get(index) {
            Some(Entry::Class { name_index }) => self.as_utf8(*name_index),
            _ => Err(DecodeError::WrongTag { index, expected: "Class" }),
        }
    }

    pub fn as_name_and_type(&self, index: u16) -> Result<(&str, &str), DecodeError> {
        match self.get(index) {
            Some(Entry::NameAndType { name_index, descriptor_index }) => {
                Ok((self.as_utf8(*name_index)?, self.as_utf8(*descriptor_index)?))
            }
            _ => Err(DecodeError::WrongTag { index, expected: "NameAndType" }),
        }
    }

    fn as_ref_triple(&self, index: u16, expected: &'static str) -> Result<(&str, &str, &str), DecodeError> {
        let (class_index, nat_index) = match self.get(index) {
            Some(Entry::Fieldref { class_index, name_and_type_index }) if expected == "Fieldref" => {
                (*class_index, *name_and_type_index)
            }
            Some(Entry::Methodref { class_index, name_and_type_index }) if expected == "Methodref" => {
                (*class_index, *name_and_type_index)
            }
            Some(Entry::InterfaceMethodref { class_index, name_and_type_index }) if expected == "InterfaceMethodref" => {
                (*class_index, *name_and_type_index)
            }
            _ => return Err(DecodeError::WrongTag { index, expected }),
        };
        let class_name = self.as_class_name(class_index)?;
        let (name, descriptor) = self.as_name_and_type(nat_index)?;
        Ok((class_name, name, descriptor))
    }

    pub fn as_fieldref_triple(&self, index: u16) -> Result<(&str, &str, &str), DecodeError> {
        self.as_ref_triple(index, "Fieldref")
    }

    pub fn as_methodref_triple(&self, index: u16) -> Result<(&str, &str, &str), DecodeError> {
        self.as_ref_triple(index, "Methodref")
    }

    pub fn as_interface_methodref_triple(&self, index: u16) -> Result<(&str, &str, &str), DecodeError> {
        self.as_ref_triple(index, "InterfaceMethodref")
    }

    /// Resolves `index` to a `Utf8` through a `Class`, `String`, `MethodType`,
    /// `Module` or `Package` entry, whichever it happens to be. Used by the
    /// dependency extractor and the differ, which often only care about "the
    /// name this index denotes" without caring which constant kind it is.
    pub fn deref_name(&self, index: u16) -> Result<&str, DecodeError> {
        match self.get(index) {
            Some(Entry::Class { name_index }) => self.as_utf8(*name_index),
            Some(Entry::String { string_index }) => self.as_utf8(*string_index),
            Some(Entry::MethodType { descriptor_index }) => self.as_utf8(*descriptor_index),
            Some(Entry::Module { name_index }) => self.as_utf8(*name_index),
            Some(Entry::Package { name_index }) => self.as_utf8(*name_index),
            Some(Entry::Utf8(s)) => Ok(s),
            _ => Err(DecodeError::BadConstantRef { offset: 0, index, expected: "nameable" }),
        }
    }

    pub fn method_handle_kind(&self, index: u16) -> Result<MethodHandleKind, DecodeError> {
        match self.get(index) {
            Some(Entry::MethodHandle { reference_kind, .. }) => {
                MethodHandleKind::from_u8(*reference_kind).ok_or(DecodeError::WrongTag { index, expected: "valid reference_kind" })
            }
            _ => Err(DecodeError::WrongTag { index, expected: "MethodHandle" }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Entry)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            if matches!(e, Entry::Unusable) {
                None
            } else {
                Some((i as u16, e))
            }
        })
    }
}
