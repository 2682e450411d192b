//! [The ClassFile structure](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=97)

use crate::access_flags::ClassAccessFlags;
use crate::attributes::{parse_attribute_entry, Attribute, AttributeEntry};
use crate::cancel::CancelToken;
use crate::constant_pool::{ConstantPool, Entry, MethodHandleKind};
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Warning};

const MAGIC: u32 = 0xCAFEBABE;
/// The newest major version this decoder was written against. Anything
/// newer still decodes; it just earns an `UnsupportedVersion` warning.
const NEWEST_KNOWN_MAJOR_VERSION: u16 = 65; // Java 21
const MODULE_SUPPORT_VERSION: u16 = 53; // Java 9

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<AttributeEntry>,
}

/// The result of a lenient parse: a decoded class file plus any recoverable
/// warnings raised along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub class: ClassFile,
    pub warnings: Vec<Warning>,
}

impl ClassFile {
    /// Parses `bytes` strictly: any warning condition is still recorded,
    /// but trailing bytes after the last declared attribute are an error.
    pub fn parse(bytes: &[u8]) -> Result<ParseOutcome, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let outcome = Self::parse_from(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(DecodeError::ExtraBytes { extra: cursor.remaining() });
        }
        Ok(outcome)
    }

    /// Parses `bytes`, tolerating trailing data after the class file's
    /// declared structure (some build pipelines concatenate extra bytes).
    pub fn parse_lenient(bytes: &[u8]) -> Result<ParseOutcome, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        Self::parse_from(&mut cursor)
    }

    /// Like [`ClassFile::parse`], but checks `cancel` once before decoding
    /// starts. Intended for callers walking many classes (a JAR, a
    /// distribution tree) that want to abandon the remaining work without
    /// polling at finer granularity than "once per class".
    pub fn parse_with_cancel(bytes: &[u8], cancel: &dyn CancelToken) -> Result<ParseOutcome, DecodeError> {
        cancel.check()?;
        Self::parse(bytes)
    }

    /// Like [`ClassFile::parse_lenient`], with the same cancellation check.
    pub fn parse_lenient_with_cancel(bytes: &[u8], cancel: &dyn CancelToken) -> Result<ParseOutcome, DecodeError> {
        cancel.check()?;
        Self::parse_lenient(bytes)
    }

    fn parse_from(cursor: &mut ByteCursor) -> Result<ParseOutcome, DecodeError> {
        let mut warnings = Vec::new();

        let magic = cursor.read_u32()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }

        let minor_version = cursor.read_u16()?;
        let major_version = cursor.read_u16()?;
        if major_version > NEWEST_KNOWN_MAJOR_VERSION {
            warnings.push(Warning::UnsupportedVersion { major: major_version, minor: minor_version });
        }

        let constant_pool_count = cursor.read_u16()?;
        let constant_pool = ConstantPool::parse(cursor, constant_pool_count)?;

        let access_flags = cursor.read_u16()?;
        let this_class = cursor.read_u16()?;
        let super_class = cursor.read_u16()?;

        let interfaces_count = cursor.read_u16()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(cursor.read_u16()?);
        }

        let fields_count = cursor.read_u16()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            fields.push(parse_field(cursor, &constant_pool, major_version, &mut warnings)?);
        }

        let methods_count = cursor.read_u16()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(parse_method(cursor, &constant_pool, major_version, &mut warnings)?);
        }

        let attributes_count = cursor.read_u16()?;
        let mut attributes = Vec::with_capacity(attributes_count as usize);
        for _ in 0..attributes_count {
            attributes.push(parse_attribute_entry(cursor, &constant_pool, major_version, &mut warnings)?);
        }

        let class = ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        check_format(&class)?;
        Ok(ParseOutcome { class, warnings })
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        ClassAccessFlags::from_bits_truncate(self.access_flags)
    }

    pub fn this_class_name(&self) -> Result<&str, DecodeError> {
        self.constant_pool.as_class_name(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<&str>, DecodeError> {
        // java/lang/Object is the only class with super_class == 0.
        if self.super_class == 0 {
            Ok(None)
        } else {
            self.constant_pool.as_class_name(self.super_class).map(Some)
        }
    }

    pub fn interface_names(&self) -> Result<Vec<&str>, DecodeError> {
        self.interfaces.iter().map(|&i| self.constant_pool.as_class_name(i)).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeEntry> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn bootstrap_method_count(&self) -> usize {
        match self.attribute("BootstrapMethods").map(|a| &a.value) {
            Some(Attribute::BootstrapMethods { bootstrap_methods }) => bootstrap_methods.len(),
            _ => 0,
        }
    }
}

impl Field {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, DecodeError> {
        pool.as_utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, DecodeError> {
        pool.as_utf8(self.descriptor_index)
    }
}

impl Method {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, DecodeError> {
        pool.as_utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, DecodeError> {
        pool.as_utf8(self.descriptor_index)
    }

    pub fn code(&self) -> Option<&crate::attributes::Code> {
        self.attributes.iter().find_map(|a| match &a.value {
            Attribute::Code(code) => Some(code.as_ref()),
            _ => None,
        })
    }
}

fn parse_field(
    cursor: &mut ByteCursor,
    pool: &ConstantPool,
    major_version: u16,
    warnings: &mut Vec<Warning>,
) -> Result<Field, DecodeError> {
    let access_flags = cursor.read_u16()?;
    let name_index = cursor.read_u16()?;
    let descriptor_index = cursor.read_u16()?;
    let attributes_count = cursor.read_u16()?;
    let mut attributes = Vec::with_capacity(attributes_count as usize);
    for _ in 0..attributes_count {
        attributes.push(parse_attribute_entry(cursor, pool, major_version, warnings)?);
    }
    Ok(Field { access_flags, name_index, descriptor_index, attributes })
}

fn parse_method(
    cursor: &mut ByteCursor,
    pool: &ConstantPool,
    major_version: u16,
    warnings: &mut Vec<Warning>,
) -> Result<Method, DecodeError> {
    let access_flags = cursor.read_u16()?;
    let name_index = cursor.read_u16()?;
    let descriptor_index = cursor.read_u16()?;
    let attributes_count = cursor.read_u16()?;
    let mut attributes = Vec::with_capacity(attributes_count as usize);
    for _ in 0..attributes_count {
        attributes.push(parse_attribute_entry(cursor, pool, major_version, warnings)?);
    }
    Ok(Method { access_flags, name_index, descriptor_index, attributes })
}

/// Cross-reference validation per JVMS §4.4: every constant pool entry
/// that points at another entry must point at one of the expected kind,
/// `MethodHandle` reference kinds must address the matching ref table,
/// and `Dynamic`/`InvokeDynamic` bootstrap indices must fall within the
/// class's `BootstrapMethods` attribute.
fn check_format(class: &ClassFile) -> Result<(), DecodeError> {
    class.constant_pool.as_class_name(class.this_class)?;
    if class.super_class != 0 {
        class.constant_pool.as_class_name(class.super_class)?;
    }
    for &index in &class.interfaces {
        class.constant_pool.as_class_name(index)?;
    }
    for field in &class.fields {
        field.name(&class.constant_pool)?;
        field.descriptor(&class.constant_pool)?;
    }
    for method in &class.methods {
        method.name(&class.constant_pool)?;
        method.descriptor(&class.constant_pool)?;
    }

    let is_module = class.access_flags().contains(ClassAccessFlags::MODULE);
    let bootstrap_method_count = class.bootstrap_method_count();

    for (index, entry) in class.constant_pool.iter() {
        match entry {
            Entry::Class { name_index } => {
                class.constant_pool.as_utf8(*name_index).map_err(|_| DecodeError::BadConstantRef {
                    offset: 0,
                    index: *name_index,
                    expected: "Utf8",
                })?;
            }
            Entry::String { string_index } => {
                class.constant_pool.as_utf8(*string_index).map_err(|_| DecodeError::BadConstantRef {
                    offset: 0,
                    index: *string_index,
                    expected: "Utf8",
                })?;
            }
            Entry::Fieldref { .. } => {
                class.constant_pool.as_fieldref_triple(index)?;
            }
            Entry::Methodref { .. } => {
                class.constant_pool.as_methodref_triple(index)?;
            }
            Entry::InterfaceMethodref { .. } => {
                class.constant_pool.as_interface_methodref_triple(index)?;
            }
            Entry::NameAndType { name_index, descriptor_index } => {
                class.constant_pool.as_utf8(*name_index)?;
                class.constant_pool.as_utf8(*descriptor_index)?;
            }
            Entry::MethodHandle { reference_kind, reference_index } => {
                let kind = class.constant_pool.method_handle_kind(index)?;
                validate_method_handle_target(class, kind, *reference_index, *reference_kind)?;
            }
            Entry::MethodType { descriptor_index } => {
                class.constant_pool.as_utf8(*descriptor_index)?;
            }
            Entry::Dynamic { bootstrap_method_attr_index, name_and_type_index }
            | Entry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                class.constant_pool.as_name_and_type(*name_and_type_index)?;
                if *bootstrap_method_attr_index as usize >= bootstrap_method_count {
                    return Err(DecodeError::BadConstantRef { offset: 0, index, expected: "BootstrapMethods entry" });
                }
            }
            Entry::Module { name_index } | Entry::Package { name_index } => {
                if !is_module {
                    return Err(DecodeError::BadConstantRef { offset: 0, index, expected: "ACC_MODULE set" });
                }
                class.constant_pool.as_utf8(*name_index)?;
            }
            Entry::Utf8(_) | Entry::Integer(_) | Entry::Float(_) | Entry::Long(_) | Entry::Double(_) | Entry::Unusable => {}
        }
    }
    Ok(())
}

fn validate_method_handle_target(
    class: &ClassFile,
    kind: MethodHandleKind,
    reference_index: u16,
    reference_kind: u8,
) -> Result<(), DecodeError> {
    let entry = class.constant_pool.get(reference_index);
    let ok = if kind.refers_to_field() {
        matches!(entry, Some(Entry::Fieldref { .. }))
    } else {
        match kind {
            MethodHandleKind::InvokeVirtual | MethodHandleKind::NewInvokeSpecial => matches!(entry, Some(Entry::Methodref { .. })),
            MethodHandleKind::InvokeStatic | MethodHandleKind::InvokeSpecial => {
                if class.major_version < 52 {
                    matches!(entry, Some(Entry::Methodref { .. }))
                } else {
                    matches!(entry, Some(Entry::Methodref { .. }) | Some(Entry::InterfaceMethodref { .. }))
                }
            }
            MethodHandleKind::InvokeInterface => matches!(entry, Some(Entry::InterfaceMethodref { .. })),
            _ => false,
        }
    };
    if ok {
        Ok(())
    } else {
        Err(DecodeError::BadConstantRef {
            offset: 0,
            index: reference_index,
            expected: match reference_kind {
                1..=4 => "Fieldref",
                9 => "InterfaceMethodref",
                _ => "Methodref or InterfaceMethodref",
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_class_bytes() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend(MAGIC.to_be_bytes());
        b.extend(0u16.to_be_bytes()); // minor
        b.extend(52u16.to_be_bytes()); // major
        // constant pool: #1 Utf8 "Main", #2 Class -> #1
        b.extend(3u16.to_be_bytes()); // constant_pool_count = 3
        b.extend([1, 0, 4]);
        b.extend(b"Main");
        b.extend([7, 0, 1]);
        b.extend(ClassAccessFlags::PUBLIC.bits().to_be_bytes()); // access_flags
        b.extend(2u16.to_be_bytes()); // this_class
        b.extend(0u16.to_be_bytes()); // super_class
        b.extend(0u16.to_be_bytes()); // interfaces_count
        b.extend(0u16.to_be_bytes()); // fields_count
        b.extend(0u16.to_be_bytes()); // methods_count
        b.extend(0u16.to_be_bytes()); // attributes_count
        b
    }

    #[test]
    fn parses_minimal_class_file() {
        let bytes = minimal_class_bytes();
        let outcome = ClassFile::parse(&bytes).unwrap();
        assert_eq!(outcome.class.this_class_name().unwrap(), "Main");
        assert_eq!(outcome.class.super_class_name().unwrap(), None);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn parse_with_cancel_succeeds_when_not_cancelled() {
        let bytes = minimal_class_bytes();
        let outcome = ClassFile::parse_with_cancel(&bytes, &crate::cancel::NeverCancel).unwrap();
        assert_eq!(outcome.class.this_class_name().unwrap(), "Main");
    }

    #[test]
    fn parse_with_cancel_reports_cancelled_before_decoding() {
        let bytes = minimal_class_bytes();
        let flag = crate::cancel::Flag::new();
        flag.cancel();
        assert_eq!(ClassFile::parse_with_cancel(&bytes, &flag), Err(DecodeError::Cancelled));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = minimal_class_bytes();
        bytes[0] = 0;
        assert!(matches!(ClassFile::parse(&bytes), Err(DecodeError::BadMagic { .. })));
    }

    #[test]
    fn strict_parse_rejects_trailing_bytes() {
        let mut bytes = minimal_class_bytes();
        bytes.push(0xFF);
        assert_eq!(ClassFile::parse(&bytes), Err(DecodeError::ExtraBytes { extra: 1 }));
    }

    #[test]
    fn lenient_parse_tolerates_trailing_bytes() {
        let mut bytes = minimal_class_bytes();
        bytes.push(0xFF);
        assert!(ClassFile::parse_lenient(&bytes).is_ok());
    }

    #[test]
    fn future_major_version_is_a_warning_not_an_error() {
        let mut bytes = minimal_class_bytes();
        // major_version lives at offset 6..8
        bytes[6..8].copy_from_slice(&200u16.to_be_bytes());
        let outcome = ClassFile::parse(&bytes).unwrap();
        assert_eq!(outcome.warnings, vec![Warning::UnsupportedVersion { major: 200, minor: 0 }]);
    }

    #[test]
    fn module_name_constant_outside_a_module_class_is_rejected() {
        let mut b = Vec::new();
        b.extend(MAGIC.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(52u16.to_be_bytes());
        b.extend(4u16.to_be_bytes()); // constant_pool_count
        b.extend([1, 0, 4]);
        b.extend(b"Main");
        b.extend([7, 0, 1]); // #2 Class -> #1
        b.extend([19, 0, 1]); // #3 Module -> #1, illegal without ACC_MODULE
        b.extend(ClassAccessFlags::PUBLIC.bits().to_be_bytes());
        b.extend(2u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        assert!(ClassFile::parse(&b).is_err());
    }
}
