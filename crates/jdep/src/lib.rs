//! Dependency extraction: derives a `provides`/`requires` symbol pair from
//! a decoded class, so a set of classes (a JAR, a whole distribution) can
//! be checked for which referenced symbols nothing in the set actually
//! supplies.
//!
//! Symbols are the class's own internal name plus `ClassName#member:descriptor`
//! for each non-private field and method it declares (a private member
//! can't be depended on from outside the class, so it isn't a symbol the
//! class "provides" to anything else); `requires` collects every class
//! name the class refers to, drawn from superclass/interfaces, field and
//! method descriptors, `Signature` generics (scanned textually — it is not
//! worth a full generic-signature grammar just to harvest type names),
//! every flavor of annotation (class-, method-, parameter- and
//! type-annotations, plus annotation-interface defaults), and the class
//! names touched by bytecode operands, including the descriptor of an
//! `invokedynamic` call site.

use jclass::access_flags::{FieldAccessFlags, MethodAccessFlags};
use jclass::attributes::{Annotation, Attribute, ElementValue};
use jclass::class_file::{ClassFile, Method};
use jclass::constant_pool::Entry;
use jclass::descriptor::{parse_field_descriptor, parse_method_descriptor, FieldType};
use jclass::DecodeError;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbols {
    pub provides: BTreeSet<String>,
    pub requires: BTreeSet<String>,
}

impl Symbols {
    pub fn merge(&mut self, other: &Symbols) {
        self.provides.extend(other.provides.iter().cloned());
        self.requires.extend(other.requires.iter().cloned());
    }
}

pub fn extract(class: &ClassFile) -> Result<Symbols, DecodeError> {
    let pool = &class.constant_pool;
    let this_name = class.this_class_name()?.to_string();

    let mut provides = BTreeSet::new();
    let mut requires = BTreeSet::new();
    provides.insert(this_name.clone());

    if let Some(super_name) = class.super_class_name()? {
        requires.insert(super_name.to_string());
    }
    for name in class.interface_names()? {
        requires.insert(name.to_string());
    }

    for field in &class.fields {
        let name = field.name(pool)?;
        let descriptor = field.descriptor(pool)?;
        if !FieldAccessFlags::from_bits_truncate(field.access_flags).contains(FieldAccessFlags::PRIVATE) {
            provides.insert(format!("{this_name}#{name}:{descriptor}"));
        }
        if let Ok(ty) = parse_field_descriptor(descriptor) {
            collect_field_type(&ty, &mut requires);
        }
        collect_attribute_requires(&field.attributes, pool, &mut requires)?;
    }

    for method in &class.methods {
        let name = method.name(pool)?;
        let descriptor = method.descriptor(pool)?;
        if !MethodAccessFlags::from_bits_truncate(method.access_flags).contains(MethodAccessFlags::PRIVATE) {
            provides.insert(format!("{this_name}#{name}{descriptor}"));
        }
        if let Ok(md) = parse_method_descriptor(descriptor) {
            for param in &md.parameters {
                collect_field_type(param, &mut requires);
            }
            if let Some(ret) = &md.return_type {
                collect_field_type(ret, &mut requires);
            }
        }
        collect_attribute_requires(&method.attributes, pool, &mut requires)?;
        collect_code_requires(method, pool, &mut requires)?;
    }

    collect_attribute_requires(&class.attributes, pool, &mut requires)?;

    // every Class constant the class mentions is a candidate dependency;
    // redundant with the structural scan above for normal code but catches
    // classes only reachable through exception handler catch types.
    for (_, entry) in pool.iter() {
        if let Entry::Class { name_index } = entry {
            if let Ok(name) = pool.as_utf8(*name_index) {
                requires.insert(name.to_string());
            }
        }
    }

    requires.remove(&this_name);
    Ok(Symbols { provides, requires })
}

fn collect_field_type(ty: &FieldType, requires: &mut BTreeSet<String>) {
    match ty {
        FieldType::Object(name) => {
            requires.insert(name.clone());
        }
        FieldType::Array { element, .. } => collect_field_type(element, requires),
        _ => {}
    }
}

fn collect_attribute_requires(
    attributes: &[jclass::attributes::AttributeEntry],
    pool: &jclass::constant_pool::ConstantPool,
    requires: &mut BTreeSet<String>,
) -> Result<(), DecodeError> {
    for attr in attributes {
        match &attr.value {
            Attribute::Signature { signature_index } => {
                let signature = pool.as_utf8(*signature_index)?;
                for class_name in scan_signature_for_class_names(signature) {
                    requires.insert(class_name);
                }
            }
            Attribute::RuntimeVisibleAnnotations { annotations } | Attribute::RuntimeInvisibleAnnotations { annotations } => {
                for annotation in annotations {
                    collect_annotation_requires(annotation, pool, requires);
                }
            }
            Attribute::RuntimeVisibleParameterAnnotations { parameter_annotations }
            | Attribute::RuntimeInvisibleParameterAnnotations { parameter_annotations } => {
                for parameter in parameter_annotations {
                    for annotation in &parameter.annotations {
                        collect_annotation_requires(annotation, pool, requires);
                    }
                }
            }
            Attribute::RuntimeVisibleTypeAnnotations { annotations } | Attribute::RuntimeInvisibleTypeAnnotations { annotations } => {
                for annotation in annotations {
                    if let Ok(descriptor) = pool.as_utf8(annotation.type_index) {
                        if let Ok(FieldType::Object(name)) = parse_field_descriptor(descriptor) {
                            requires.insert(name);
                        }
                    }
                    for pair in &annotation.element_value_pairs {
                        collect_element_value_requires(&pair.value, pool, requires);
                    }
                }
            }
            Attribute::AnnotationDefault { default_value } => {
                collect_element_value_requires(default_value, pool, requires);
            }
            Attribute::Exceptions { exception_index_table } => {
                for &index in exception_index_table {
                    if let Ok(name) = pool.as_class_name(index) {
                        requires.insert(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// An annotation's own type plus every class name reachable through its
/// element-value pairs (a nested annotation, a class literal, an array of
/// either).
fn collect_annotation_requires(annotation: &Annotation, pool: &jclass::constant_pool::ConstantPool, requires: &mut BTreeSet<String>) {
    if let Ok(descriptor) = pool.as_utf8(annotation.type_index) {
        if let Ok(FieldType::Object(name)) = parse_field_descriptor(descriptor) {
            requires.insert(name);
        }
    }
    for pair in &annotation.element_value_pairs {
        collect_element_value_requires(&pair.value, pool, requires);
    }
}

fn collect_element_value_requires(value: &ElementValue, pool: &jclass::constant_pool::ConstantPool, requires: &mut BTreeSet<String>) {
    match value {
        ElementValue::ClassInfo { class_info_index } => {
            if let Ok(descriptor) = pool.as_utf8(*class_info_index) {
                if let Ok(ty) = parse_field_descriptor(descriptor) {
                    collect_field_type(&ty, requires);
                }
            }
        }
        ElementValue::Annotation(inner) => collect_annotation_requires(inner, pool, requires),
        ElementValue::Array(values) => {
            for inner in values {
                collect_element_value_requires(inner, pool, requires);
            }
        }
        ElementValue::Const { .. } | ElementValue::Enum { .. } => {}
    }
}

fn collect_code_requires(
    method: &Method,
    pool: &jclass::constant_pool::ConstantPool,
    requires: &mut BTreeSet<String>,
) -> Result<(), DecodeError> {
    let Some(code) = method.code() else { return Ok(()) };
    for entry in &code.exception_table {
        if entry.catch_type != 0 {
            if let Ok(name) = pool.as_class_name(entry.catch_type) {
                requires.insert(name.to_string());
            }
        }
    }
    for instruction in &code.instructions {
        for operand in &instruction.operands {
            if let jclass::bytecode::Operand::ConstantPoolIndex(index) = operand {
                record_operand_class(pool, *index, requires);
            }
        }
    }
    Ok(())
}

fn record_operand_class(pool: &jclass::constant_pool::ConstantPool, index: u16, requires: &mut BTreeSet<String>) {
    match pool.get(index) {
        Some(Entry::Class { name_index }) => {
            if let Ok(name) = pool.as_utf8(*name_index) {
                requires.insert(name.to_string());
            }
        }
        Some(Entry::Fieldref { class_index, .. })
        | Some(Entry::Methodref { class_index, .. })
        | Some(Entry::InterfaceMethodref { class_index, .. }) => {
            if let Ok(name) = pool.as_class_name(*class_index) {
                requires.insert(name.to_string());
            }
        }
        Some(Entry::Dynamic { name_and_type_index, .. }) | Some(Entry::InvokeDynamic { name_and_type_index, .. }) => {
            // a call site's own class isn't named in the constant pool entry itself
            // (it's resolved at link time via the bootstrap method); the descriptor's
            // parameter and return types are still concrete dependencies, though.
            if let Ok((_, descriptor)) = pool.as_name_and_type(*name_and_type_index) {
                if let Ok(md) = parse_method_descriptor(descriptor) {
                    for param in &md.parameters {
                        collect_field_type(param, requires);
                    }
                    if let Some(ret) = &md.return_type {
                        collect_field_type(ret, requires);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Harvests `Lslash/separated/Name;` tokens out of a raw generic-signature
/// string without parsing the full grammar.
fn scan_signature_for_class_names(signature: &str) -> Vec<String> {
    let mut names = Vec::new();
    let chars: Vec<char> = signature.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == 'L' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && chars[j] != ';' && chars[j] != '<' {
                j += 1;
            }
            if j > start {
                names.push(chars[start..j].iter().collect());
            }
            i = j;
        } else {
            i += 1;
        }
    }
    names
}

pub fn aggregate<'a>(all: impl IntoIterator<Item = &'a Symbols>) -> Symbols {
    let mut merged = Symbols::default();
    for symbols in all {
        merged.merge(symbols);
    }
    merged
}

/// Symbols required somewhere in the set but provided by nothing in it.
pub fn unresolved(symbols: &Symbols) -> BTreeSet<String> {
    symbols.requires.difference(&symbols.provides).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_with_two_fields() -> ClassFile {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        bytes.extend(6u16.to_be_bytes()); // constant_pool_count
        bytes.push(1); // #1 Utf8 "Example"
        bytes.extend(7u16.to_be_bytes());
        bytes.extend(b"Example");
        bytes.push(7); // #2 Class -> #1
        bytes.extend(1u16.to_be_bytes());
        bytes.push(1); // #3 Utf8 "secret"
        bytes.extend(6u16.to_be_bytes());
        bytes.extend(b"secret");
        bytes.push(1); // #4 Utf8 "pub_field"
        bytes.extend(9u16.to_be_bytes());
        bytes.extend(b"pub_field");
        bytes.push(1); // #5 Utf8 "I"
        bytes.extend(1u16.to_be_bytes());
        bytes.extend(b"I");
        bytes.extend(0x0021u16.to_be_bytes()); // access_flags
        bytes.extend(2u16.to_be_bytes()); // this_class
        bytes.extend(0u16.to_be_bytes()); // super_class
        bytes.extend(0u16.to_be_bytes()); // interfaces_count
        bytes.extend(2u16.to_be_bytes()); // fields_count
        bytes.extend(0x0002u16.to_be_bytes()); // private
        bytes.extend(3u16.to_be_bytes()); // name_index: secret
        bytes.extend(5u16.to_be_bytes()); // descriptor_index: I
        bytes.extend(0u16.to_be_bytes()); // attributes_count
        bytes.extend(0x0001u16.to_be_bytes()); // public
        bytes.extend(4u16.to_be_bytes()); // name_index: pub_field
        bytes.extend(5u16.to_be_bytes()); // descriptor_index: I
        bytes.extend(0u16.to_be_bytes()); // attributes_count
        bytes.extend(0u16.to_be_bytes()); // methods_count
        bytes.extend(0u16.to_be_bytes()); // attributes_count
        ClassFile::parse(&bytes).unwrap().class
    }

    #[test]
    fn private_fields_are_not_provided() {
        let class = class_with_two_fields();
        let symbols = extract(&class).unwrap();
        assert!(!symbols.provides.contains("Example#secret:I"));
        assert!(symbols.provides.contains("Example#pub_field:I"));
    }

    #[test]
    fn scans_simple_class_reference_from_signature() {
        let names = scan_signature_for_class_names("Ljava/util/List<Ljava/lang/String;>;");
        assert_eq!(names, vec!["java/util/List".to_string(), "java/lang/String".to_string()]);
    }

    #[test]
    fn unresolved_is_requires_minus_provides() {
        let mut symbols = Symbols::default();
        symbols.provides.insert("com/acme/Widget".to_string());
        symbols.requires.insert("com/acme/Widget".to_string());
        symbols.requires.insert("java/lang/Object".to_string());
        assert_eq!(unresolved(&symbols), BTreeSet::from(["java/lang/Object".to_string()]));
    }

    #[test]
    fn aggregate_merges_multiple_classes() {
        let mut a = Symbols::default();
        a.provides.insert("A".to_string());
        a.requires.insert("B".to_string());
        let mut b = Symbols::default();
        b.provides.insert("B".to_string());
        b.requires.insert("C".to_string());
        let merged = aggregate([&a, &b]);
        assert_eq!(merged.provides, BTreeSet::from(["A".to_string(), "B".to_string()]));
        assert_eq!(unresolved(&merged), BTreeSet::from(["C".to_string()]));
    }
}
