//! [Attributes](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=135)
//!
//! Attributes are dispatched by name rather than by a fixed tag, so this
//! registry decodes the ones the format defines and falls back to an
//! opaque [`Attribute::Unknown`] for anything else — a vendor extension,
//! a future class file version's addition, or simply an attribute this
//! crate hasn't been taught yet. A class file carrying an unrecognized
//! attribute is not malformed.

use crate::bytecode::{self, Instruction};
use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Warning};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub name: String,
    pub value: Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub instructions: Vec<Instruction>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableTypeEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub signature_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class_info_index: u16,
    pub outer_class_info_index: u16,
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Const { tag: u8, const_value_index: u16 },
    Enum { type_name_index: u16, const_name_index: u16 },
    ClassInfo { class_info_index: u16 },
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub element_name_index: u16,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub type_index: u16,
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterAnnotations {
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetInfo {
    TypeParameter { index: u8 },
    Supertype { index: u16 },
    TypeParameterBound { type_parameter_index: u8, bound_index: u8 },
    Empty,
    FormalParameter { index: u8 },
    Throws { throws_type_index: u16 },
    LocalVar { table: Vec<(u16, u16, u16)> },
    Catch { exception_table_index: u16 },
    Offset { offset: u16 },
    TypeArgument { offset: u16, type_argument_index: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePathEntry {
    pub type_path_kind: u8,
    pub type_argument_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub target_type: u8,
    pub target_info: TargetInfo,
    pub type_path: Vec<TypePathEntry>,
    pub type_index: u16,
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name_index: u16,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequires {
    pub requires_index: u16,
    pub requires_flags: u16,
    pub requires_version_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleExports {
    pub exports_index: u16,
    pub exports_flags: u16,
    pub exports_to_index: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOpens {
    pub opens_index: u16,
    pub opens_flags: u16,
    pub opens_to_index: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProvides {
    pub provides_index: u16,
    pub provides_with_index: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub module_name_index: u16,
    pub module_flags: u16,
    pub module_version_index: u16,
    pub requires: Vec<ModuleRequires>,
    pub exports: Vec<ModuleExports>,
    pub opens: Vec<ModuleOpens>,
    pub uses_index: Vec<u16>,
    pub provides: Vec<ModuleProvides>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponent {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    ConstantValue { constantvalue_index: u16 },
    Code(Box<Code>),
    StackMapTable { raw: Vec<u8> },
    Exceptions { exception_index_table: Vec<u16> },
    InnerClasses { classes: Vec<InnerClassEntry> },
    EnclosingMethod { class_index: u16, method_index: u16 },
    Synthetic,
    Signature { signature_index: u16 },
    SourceFile { sourcefile_index: u16 },
    SourceDebugExtension { debug_extension: Vec<u8> },
    LineNumberTable { entries: Vec<LineNumberEntry> },
    LocalVariableTable { entries: Vec<LocalVariableEntry> },
    LocalVariableTypeTable { entries: Vec<LocalVariableTypeEntry> },
    Deprecated,
    RuntimeVisibleAnnotations { annotations: Vec<Annotation> },
    RuntimeInvisibleAnnotations { annotations: Vec<Annotation> },
    RuntimeVisibleParameterAnnotations { parameter_annotations: Vec<ParameterAnnotations> },
    RuntimeInvisibleParameterAnnotations { parameter_annotations: Vec<ParameterAnnotations> },
    RuntimeVisibleTypeAnnotations { annotations: Vec<TypeAnnotation> },
    RuntimeInvisibleTypeAnnotations { annotations: Vec<TypeAnnotation> },
    AnnotationDefault { default_value: ElementValue },
    BootstrapMethods { bootstrap_methods: Vec<BootstrapMethod> },
    MethodParameters { parameters: Vec<MethodParameter> },
    Module(Box<Module>),
    ModulePackages { package_index: Vec<u16> },
    ModuleMainClass { main_class_index: u16 },
    NestHost { host_class_index: u16 },
    NestMembers { classes: Vec<u16> },
    Record { components: Vec<RecordComponent> },
    PermittedSubclasses { classes: Vec<u16> },
    Unknown { raw: Vec<u8> },
}

/// Decodes one attribute given the already-consumed `attribute_name_index`
/// and `attribute_length`. `class_major_version` governs a couple of
/// version-gated behaviors (notably the implicit empty `StackMapTable`
/// a `Code` attribute's caller may need to synthesize, which this
/// function leaves to its caller since it is a `Code`-level concern).
pub fn parse_attribute(
    cursor: &mut ByteCursor,
    pool: &ConstantPool,
    name: &str,
    length: u32,
    class_major_version: u16,
    warnings: &mut Vec<Warning>,
) -> Result<Attribute, DecodeError> {
    let start = cursor.tell();
    let mut body = cursor.child(length as usize)?;
    let attribute = match name {
        "ConstantValue" => Attribute::ConstantValue { constantvalue_index: body.read_u16()? },
        "Code" => Attribute::Code(Box::new(parse_code(&mut body, pool, class_major_version, warnings)?)),
        "StackMapTable" => Attribute::StackMapTable { raw: body.read_bytes(body.remaining())?.to_vec() },
        "Exceptions" => {
            let count = body.read_u16()?;
            let mut table = Vec::with_capacity(count as usize);
            for _ in 0..count {
                table.push(body.read_u16()?);
            }
            Attribute::Exceptions { exception_index_table: table }
        }
        "InnerClasses" => {
            let count = body.read_u16()?;
            let mut classes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                classes.push(InnerClassEntry {
                    inner_class_info_index: body.read_u16()?,
                    outer_class_info_index: body.read_u16()?,
                    inner_name_index: body.read_u16()?,
                    inner_class_access_flags: body.read_u16()?,
                });
            }
            Attribute::InnerClasses { classes }
        }
        "EnclosingMethod" => Attribute::EnclosingMethod { class_index: body.read_u16()?, method_index: body.read_u16()? },
        "Synthetic" => Attribute::Synthetic,
        "Signature" => Attribute::Signature { signature_index: body.read_u16()? },
        "SourceFile" => Attribute::SourceFile { sourcefile_index: body.read_u16()? },
        "SourceDebugExtension" => Attribute::SourceDebugExtension { debug_extension: body.read_bytes(body.remaining())?.to_vec() },
        "LineNumberTable" => {
            let count = body.read_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LineNumberEntry { start_pc: body.read_u16()?, line_number: body.read_u16()? });
            }
            Attribute::LineNumberTable { entries }
        }
        "LocalVariableTable" => {
            let count = body.read_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LocalVariableEntry {
                    start_pc: body.read_u16()?,
                    length: body.read_u16()?,
                    name_index: body.read_u16()?,
                    descriptor_index: body.read_u16()?,
                    index: body.read_u16()?,
                });
            }
            Attribute::LocalVariableTable { entries }
        }
        "LocalVariableTypeTable" => {
            let count = body.read_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LocalVariableTypeEntry {
                    start_pc: body.read_u16()?,
                    length: body.read_u16()?,
                    name_index: body.read_u16()?,
                    signature_index: body.read_u16()?,
                    index: body.read_u16()?,
                });
            }
            Attribute::LocalVariableTypeTable { entries }
        }
        "Deprecated" => Attribute::Deprecated,
        "RuntimeVisibleAnnotations" => Attribute::RuntimeVisibleAnnotations { annotations: parse_annotations(&mut body)? },
        "RuntimeInvisibleAnnotations" => Attribute::RuntimeInvisibleAnnotations { annotations: parse_annotations(&mut body)? },
        "RuntimeVisibleParameterAnnotations" => {
            Attribute::RuntimeVisibleParameterAnnotations { parameter_annotations: parse_parameter_annotations(&mut body)? }
        }
        "RuntimeInvisibleParameterAnnotations" => {
            Attribute::RuntimeInvisibleParameterAnnotations { parameter_annotations: parse_parameter_annotations(&mut body)? }
        }
        "RuntimeVisibleTypeAnnotations" => Attribute::RuntimeVisibleTypeAnnotations { annotations: parse_type_annotations(&mut body)? },
        "RuntimeInvisibleTypeAnnotations" => {
            Attribute::RuntimeInvisibleTypeAnnotations { annotations: parse_type_annotations(&mut body)? }
        }
        "AnnotationDefault" => Attribute::AnnotationDefault { default_value: parse_element_value(&mut body)? },
        "BootstrapMethods" => {
            let count = body.read_u16()?;
            let mut methods = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let bootstrap_method_ref = body.read_u16()?;
                let arg_count = body.read_u16()?;
                let mut args = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    args.push(body.read_u16()?);
                }
                methods.push(BootstrapMethod { bootstrap_method_ref, bootstrap_arguments: args });
            }
            Attribute::BootstrapMethods { bootstrap_methods: methods }
        }
        "MethodParameters" => {
            let count = body.read_u8()?;
            let mut parameters = Vec::with_capacity(count as usize);
            for _ in 0..count {
                parameters.push(MethodParameter { name_index: body.read_u16()?, access_flags: body.read_u16()? });
            }
            Attribute::MethodParameters { parameters }
        }
        "Module" => Attribute::Module(Box::new(parse_module(&mut body)?)),
        "ModulePackages" => {
            let count = body.read_u16()?;
            let mut packages = Vec::with_capacity(count as usize);
            for _ in 0..count {
                packages.push(body.read_u16()?);
            }
            Attribute::ModulePackages { package_index: packages }
        }
        "ModuleMainClass" => Attribute::ModuleMainClass { main_class_index: body.read_u16()? },
        "NestHost" => Attribute::NestHost { host_class_index: body.read_u16()? },
        "NestMembers" => {
            let count = body.read_u16()?;
            let mut classes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                classes.push(body.read_u16()?);
            }
            Attribute::NestMembers { classes }
        }
        "Record" => {
            let count = body.read_u16()?;
            let mut components = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let name_index = body.read_u16()?;
                let descriptor_index = body.read_u16()?;
                let attr_count = body.read_u16()?;
                let mut attrs = Vec::with_capacity(attr_count as usize);
                for _ in 0..attr_count {
                    attrs.push(parse_attribute_entry(&mut body, pool, class_major_version, warnings)?);
                }
                components.push(RecordComponent { name_index, descriptor_index, attributes: attrs });
            }
            Attribute::Record { components }
        }
        "PermittedSubclasses" => {
            let count = body.read_u16()?;
            let mut classes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                classes.push(body.read_u16()?);
            }
            Attribute::PermittedSubclasses { classes }
        }
        _ => Attribute::Unknown { raw: body.read_bytes(body.remaining())?.to_vec() },
    };

    if !body.is_empty() {
        warnings.push(Warning::AttributeLengthMismatch {
            attribute: name.to_string(),
            declared: length,
            actual: (cursor.tell() - start) as u32,
        });
    }
    Ok(attribute)
}

pub fn parse_attribute_entry(
    cursor: &mut ByteCursor,
    pool: &ConstantPool,
    class_major_version: u16,
    warnings: &mut Vec<Warning>,
) -> Result<AttributeEntry, DecodeError> {
    let name_index = cursor.read_u16()?;
    let length = cursor.read_u32()?;
    let name = pool.as_utf8(name_index)?.to_string();
    let value = parse_attribute(cursor, pool, &name, length, class_major_version, warnings)?;
    Ok(AttributeEntry { name, value })
}

fn parse_code(
    cursor: &mut ByteCursor,
    pool: &ConstantPool,
    class_major_version: u16,
    warnings: &mut Vec<Warning>,
) -> Result<Code, DecodeError> {
    let max_stack = cursor.read_u16()?;
    let max_locals = cursor.read_u16()?;
    let code_length = cursor.read_u32()?;
    let code = cursor.read_bytes(code_length as usize)?.to_vec();
    let instructions = bytecode::decode(&code)?;
    let exception_table_length = cursor.read_u16()?;
    let mut exception_table = Vec::with_capacity(exception_table_length as usize);
    for _ in 0..exception_table_length {
        exception_table.push(ExceptionTableEntry {
            start_pc: cursor.read_u16()?,
            end_pc: cursor.read_u16()?,
            handler_pc: cursor.read_u16()?,
            catch_type: cursor.read_u16()?,
        });
    }
    let attributes_count = cursor.read_u16()?;
    let mut attributes = Vec::with_capacity(attributes_count as usize);
    for _ in 0..attributes_count {
        attributes.push(parse_attribute_entry(cursor, pool, class_major_version, warnings)?);
    }
    // class files targeting version 50+ must carry a StackMapTable for verification;
    // an absent one on a 50+ method is treated as implicitly empty rather than an error.
    if class_major_version >= 50 && !attributes.iter().any(|a| a.name == "StackMapTable") {
        attributes.push(AttributeEntry { name: "StackMapTable".to_string(), value: Attribute::StackMapTable { raw: vec![] } });
    }
    Ok(Code { max_stack, max_locals, code, instructions, exception_table, attributes })
}

fn parse_annotations(cursor: &mut ByteCursor) -> Result<Vec<Annotation>, DecodeError> {
    let count = cursor.read_u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(cursor)?);
    }
    Ok(annotations)
}

fn parse_annotation(cursor: &mut ByteCursor) -> Result<Annotation, DecodeError> {
    let type_index = cursor.read_u16()?;
    let pair_count = cursor.read_u16()?;
    let mut pairs = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let element_name_index = cursor.read_u16()?;
        let value = parse_element_value(cursor)?;
        pairs.push(ElementValuePair { element_name_index, value });
    }
    Ok(Annotation { type_index, element_value_pairs: pairs })
}

fn parse_element_value(cursor: &mut ByteCursor) -> Result<ElementValue, DecodeError> {
    let tag = cursor.read_u8()?;
    Ok(match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            ElementValue::Const { tag, const_value_index: cursor.read_u16()? }
        }
        b'e' => ElementValue::Enum { type_name_index: cursor.read_u16()?, const_name_index: cursor.read_u16()? },
        b'c' => ElementValue::ClassInfo { class_info_index: cursor.read_u16()? },
        b'@' => ElementValue::Annotation(Box::new(parse_annotation(cursor)?)),
        b'[' => {
            let count = cursor.read_u16()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(cursor)?);
            }
            ElementValue::Array(values)
        }
        _ => return Err(DecodeError::MalformedCode { offset: cursor.tell() as u32, code_length: 0, reason: "unknown element_value tag" }),
    })
}

fn parse_parameter_annotations(cursor: &mut ByteCursor) -> Result<Vec<ParameterAnnotations>, DecodeError> {
    let count = cursor.read_u8()?;
    let mut parameters = Vec::with_capacity(count as usize);
    for _ in 0..count {
        parameters.push(ParameterAnnotations { annotations: parse_annotations(cursor)? });
    }
    Ok(parameters)
}

fn parse_type_annotations(cursor: &mut ByteCursor) -> Result<Vec<TypeAnnotation>, DecodeError> {
    let count = cursor.read_u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let target_type = cursor.read_u8()?;
        let target_info = parse_target_info(cursor, target_type)?;
        let path_length = cursor.read_u8()?;
        let mut type_path = Vec::with_capacity(path_length as usize);
        for _ in 0..path_length {
            type_path.push(TypePathEntry { type_path_kind: cursor.read_u8()?, type_argument_index: cursor.read_u8()? });
        }
        let type_index = cursor.read_u16()?;
        let pair_count = cursor.read_u16()?;
        let mut pairs = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let element_name_index = cursor.read_u16()?;
            let value = parse_element_value(cursor)?;
            pairs.push(ElementValuePair { element_name_index, value });
        }
        annotations.push(TypeAnnotation { target_type, target_info, type_path, type_index, element_value_pairs: pairs });
    }
    Ok(annotations)
}

fn parse_target_info(cursor: &mut ByteCursor, target_type: u8) -> Result<TargetInfo, DecodeError> {
    Ok(match target_type {
        0x00 | 0x01 => TargetInfo::TypeParameter { index: cursor.read_u8()? },
        0x10 => TargetInfo::Supertype { index: cursor.read_u16()? },
        0x11 | 0x12 => TargetInfo::TypeParameterBound { type_parameter_index: cursor.read_u8()?, bound_index: cursor.read_u8()? },
        0x13 | 0x14 | 0x15 => TargetInfo::Empty,
        0x16 => TargetInfo::FormalParameter { index: cursor.read_u8()? },
        0x17 => TargetInfo::Throws { throws_type_index: cursor.read_u16()? },
        0x40 | 0x41 => {
            let count = cursor.read_u16()?;
            let mut table = Vec::with_capacity(count as usize);
            for _ in 0..count {
                table.push((cursor.read_u16()?, cursor.read_u16()?, cursor.read_u16()?));
            }
            TargetInfo::LocalVar { table }
        }
        0x42 => TargetInfo::Catch { exception_table_index: cursor.read_u16()? },
        0x43 | 0x44 | 0x45 | 0x46 => TargetInfo::Offset { offset: cursor.read_u16()? },
        0x47 | 0x48 | 0x49 | 0x4a | 0x4b => {
            TargetInfo::TypeArgument { offset: cursor.read_u16()?, type_argument_index: cursor.read_u8()? }
        }
        _ => {
            return Err(DecodeError::MalformedCode {
                offset: cursor.tell() as u32,
                code_length: 0,
                reason: "unknown type annotation target_type",
            })
        }
    })
}

fn parse_module(cursor: &mut ByteCursor) -> Result<Module, DecodeError> {
    let module_name_index = cursor.read_u16()?;
    let module_flags = cursor.read_u16()?;
    let module_version_index = cursor.read_u16()?;

    let requires_count = cursor.read_u16()?;
    let mut requires = Vec::with_capacity(requires_count as usize);
    for _ in 0..requires_count {
        requires.push(ModuleRequires {
            requires_index: cursor.read_u16()?,
            requires_flags: cursor.read_u16()?,
            requires_version_index: cursor.read_u16()?,
        });
    }

    let exports_count = cursor.read_u16()?;
    let mut exports = Vec::with_capacity(exports_count as usize);
    for _ in 0..exports_count {
        let exports_index = cursor.read_u16()?;
        let exports_flags = cursor.read_u16()?;
        let to_count = cursor.read_u16()?;
        let mut exports_to_index = Vec::with_capacity(to_count as usize);
        for _ in 0..to_count {
            exports_to_index.push(cursor.read_u16()?);
        }
        exports.push(ModuleExports { exports_index, exports_flags, exports_to_index });
    }

    let opens_count = cursor.read_u16()?;
    let mut opens = Vec::with_capacity(opens_count as usize);
    for _ in 0..opens_count {
        let opens_index = cursor.read_u16()?;
        let opens_flags = cursor.read_u16()?;
        let to_count = cursor.read_u16()?;
        let mut opens_to_index = Vec::with_capacity(to_count as usize);
        for _ in 0..to_count {
            opens_to_index.push(cursor.read_u16()?);
        }
        opens.push(ModuleOpens { opens_index, opens_flags, opens_to_index });
    }

    let uses_count = cursor.read_u16()?;
    let mut uses_index = Vec::with_capacity(uses_count as usize);
    for _ in 0..uses_count {
        uses_index.push(cursor.read_u16()?);
    }

    let provides_count = cursor.read_u16()?;
    let mut provides = Vec::with_capacity(provides_count as usize);
    for _ in 0..provides_count {
        let provides_index = cursor.read_u16()?;
        let with_count = cursor.read_u16()?;
        let mut provides_with_index = Vec::with_capacity(with_count as usize);
        for _ in 0..with_count {
            provides_with_index.push(cursor.read_u16()?);
        }
        provides.push(ModuleProvides { provides_index, provides_with_index });
    }

    Ok(Module { module_name_index, module_flags, module_version_index, requires, exports, opens, uses_index, provides })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_pool::ConstantPool;

    fn utf8_pool(names: &[&str]) -> ConstantPool {
        let mut bytes = Vec::new();
        for name in names {
            bytes.push(1u8);
            bytes.extend((name.len() as u16).to_be_bytes());
            bytes.extend(name.as_bytes());
        }
        let mut cursor = ByteCursor::new(&bytes);
        ConstantPool::parse(&mut cursor, names.len() as u16 + 1).unwrap()
    }

    #[test]
    fn parses_deprecated_with_zero_length() {
        let pool = utf8_pool(&["Deprecated"]);
        let data: [u8; 0] = [];
        let mut cursor = ByteCursor::new(&data);
        let mut warnings = Vec::new();
        let attr = parse_attribute(&mut cursor, &pool, "Deprecated", 0, 52, &mut warnings).unwrap();
        assert_eq!(attr, Attribute::Deprecated);
        assert!(warnings.is_empty());
    }

    #[test]
    fn parses_source_file() {
        let pool = utf8_pool(&["SourceFile", "Main.java"]);
        let data = 2u16.to_be_bytes();
        let mut cursor = ByteCursor::new(&data);
        let mut warnings = Vec::new();
        let attr = parse_attribute(&mut cursor, &pool, "SourceFile", 2, 52, &mut warnings).unwrap();
        assert_eq!(attr, Attribute::SourceFile { sourcefile_index: 2 });
    }

    #[test]
    fn unrecognized_attribute_falls_back_to_unknown() {
        let pool = utf8_pool(&["VendorExtension"]);
        let data = [1, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        let mut warnings = Vec::new();
        let attr = parse_attribute(&mut cursor, &pool, "VendorExtension", 3, 52, &mut warnings).unwrap();
        assert_eq!(attr, Attribute::Unknown { raw: vec![1, 2, 3] });
    }

    #[test]
    fn code_synthesizes_implicit_stack_map_table_on_modern_class_files() {
        let pool = utf8_pool(&["Code"]);
        let mut data = Vec::new();
        data.extend(1u16.to_be_bytes()); // max_stack
        data.extend(1u16.to_be_bytes()); // max_locals
        data.extend(2u32.to_be_bytes()); // code_length
        data.extend([0x03, 0xac]); // iconst_0, ireturn
        data.extend(0u16.to_be_bytes()); // exception_table_length
        data.extend(0u16.to_be_bytes()); // attributes_count
        let length = data.len() as u32;
        let mut cursor = ByteCursor::new(&data);
        let mut warnings = Vec::new();
        let attr = parse_attribute(&mut cursor, &pool, "Code", length, 55, &mut warnings).unwrap();
        match attr {
            Attribute::Code(code) => {
                assert_eq!(code.attributes.len(), 1);
                assert_eq!(code.attributes[0].name, "StackMapTable");
            }
            other => panic!("expected Code, got {other:?}"),
        }
    }

    #[test]
    fn truncated_attribute_length_is_recorded_as_a_warning() {
        let pool = utf8_pool(&["SourceFile"]);
        // declares length 4 but only 2 bytes of real content follow -- decoder consumes 2,
        // leaves 2 unread within the bounded child cursor.
        let data = [0u8, 1, 0xff, 0xff];
        let mut cursor = ByteCursor::new(&data);
        let mut warnings = Vec::new();
        parse_attribute(&mut cursor, &pool, "SourceFile", 4, 52, &mut warnings).unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
