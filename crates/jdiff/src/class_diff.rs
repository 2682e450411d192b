//! Class-level semantic comparison: access flags, supertype, interfaces,
//! fields and methods (keyed by name+descriptor rather than declaration
//! order, since reordering members is not a semantic change), and the
//! handful of class-level attributes that carry meaning beyond bytecode
//! (`SourceFile`, `Signature`).

use std::collections::BTreeMap;

use jclass::access_flags::{FieldAccessFlags, MethodAccessFlags};
use jclass::attributes::AttributeEntry;
use jclass::cancel::CancelToken;
use jclass::class_file::{Field, Method};
use jclass::constant_pool::ConstantPool;
use jclass::{ClassFile, DecodeError};

use crate::code_diff::{constant_pool_signature, diff_code};
use crate::delta::{change_for_equality, ChangeKind, Delta};

fn field_key(field: &Field, pool: &ConstantPool) -> Option<String> {
    let name = field.name(pool).ok()?;
    let descriptor = field.descriptor(pool).ok()?;
    Some(format!("{name}:{descriptor}"))
}

fn method_key(method: &Method, pool: &ConstantPool) -> Option<String> {
    let name = method.name(pool).ok()?;
    let descriptor = method.descriptor(pool).ok()?;
    Some(format!("{name}{descriptor}"))
}

fn index_fields<'a>(fields: &'a [Field], pool: &ConstantPool) -> BTreeMap<String, &'a Field> {
    fields.iter().filter_map(|f| field_key(f, pool).map(|k| (k, f))).collect()
}

fn index_methods<'a>(methods: &'a [Method], pool: &ConstantPool) -> BTreeMap<String, &'a Method> {
    methods.iter().filter_map(|m| method_key(m, pool).map(|k| (k, m))).collect()
}

fn diff_field(id: &str, left: Option<(&Field, &ConstantPool)>, right: Option<(&Field, &ConstantPool)>) -> Delta {
    match (left, right) {
        (Some((l, pool)), Some((r, _))) => {
            let flag_change = change_for_equality(
                &FieldAccessFlags::from_bits_truncate(l.access_flags).bits(),
                &FieldAccessFlags::from_bits_truncate(r.access_flags).bits(),
            );
            let descriptor = l.descriptor(pool).unwrap_or("?");
            Delta::leaf("field", flag_change, id, format!("field {id}")).with_values(
                Some(format!("access={:#x} {descriptor}", l.access_flags)),
                Some(format!("access={:#x} {descriptor}", r.access_flags)),
            )
        }
        (Some((l, pool)), None) => {
            Delta::leaf("field", ChangeKind::Removed, id, format!("field {id}")).with_values(Some(l.descriptor(pool).unwrap_or("?").to_string()), None)
        }
        (None, Some((r, pool))) => {
            Delta::leaf("field", ChangeKind::Added, id, format!("field {id}")).with_values(None, Some(r.descriptor(pool).unwrap_or("?").to_string()))
        }
        (None, None) => unreachable!("diff_field called with neither side present"),
    }
}

fn diff_method(id: &str, left: Option<(&Method, &ConstantPool)>, right: Option<(&Method, &ConstantPool)>) -> Delta {
    match (left, right) {
        (Some((l, left_pool)), Some((r, right_pool))) => {
            let flag_change = change_for_equality(
                &MethodAccessFlags::from_bits_truncate(l.access_flags).bits(),
                &MethodAccessFlags::from_bits_truncate(r.access_flags).bits(),
            );

            let mut children = Vec::new();
            let code_delta = match (l.code(), r.code()) {
                (Some(lc), Some(rc)) => Some(diff_code(lc, left_pool, rc, right_pool)),
                (None, None) => None,
                (Some(_), None) => Some(Delta::leaf("code", ChangeKind::Removed, "code", "Code")),
                (None, Some(_)) => Some(Delta::leaf("code", ChangeKind::Added, "code", "Code")),
            };
            let code_changed = code_delta.as_ref().is_some_and(|d| d.change != ChangeKind::Unchanged);
            if let Some(code_delta) = code_delta {
                children.push(code_delta);
            }

            let descriptor = l.descriptor(left_pool).unwrap_or("?");
            let overall = if flag_change == ChangeKind::Modified || code_changed { ChangeKind::Modified } else { ChangeKind::Unchanged };
            Delta::leaf("method", overall, id, format!("method {id}"))
                .with_values(Some(format!("access={:#x} {descriptor}", l.access_flags)), Some(format!("access={:#x} {descriptor}", r.access_flags)))
                .with_children(children)
        }
        (Some((l, pool)), None) => Delta::leaf("method", ChangeKind::Removed, id, format!("method {id}"))
            .with_values(Some(l.descriptor(pool).unwrap_or("?").to_string()), None),
        (None, Some((r, pool))) => Delta::leaf("method", ChangeKind::Added, id, format!("method {id}"))
            .with_values(None, Some(r.descriptor(pool).unwrap_or("?").to_string())),
        (None, None) => unreachable!("diff_method called with neither side present"),
    }
}

fn attribute_text(entry: Option<&AttributeEntry>) -> Option<String> {
    entry.map(|a| format!("{:?}", a.value))
}

fn diff_named_attribute(kind_id: &str, left: &ClassFile, right: &ClassFile, attribute_name: &str) -> Delta {
    let left_text = attribute_text(left.attribute(attribute_name));
    let right_text = attribute_text(right.attribute(attribute_name));
    let change = change_for_equality(&left_text, &right_text);
    Delta::leaf(kind_id, change, kind_id, attribute_name).with_values(left_text, right_text)
}

/// Compares two class files and produces one `Delta` rooted at `kind =
/// "class"`. Either side may be absent, representing a class present in
/// only one of the two inputs being compared (e.g. a removed or added
/// class file within a JAR).
pub fn diff_class(left: Option<&ClassFile>, right: Option<&ClassFile>) -> Delta {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (Some(l), None) => {
            let name = l.this_class_name().unwrap_or("?").to_string();
            return Delta::leaf("class", ChangeKind::Removed, name.clone(), name);
        }
        (None, Some(r)) => {
            let name = r.this_class_name().unwrap_or("?").to_string();
            return Delta::leaf("class", ChangeKind::Added, name.clone(), name);
        }
        (None, None) => unreachable!("diff_class called with neither side present"),
    };

    let name = left.this_class_name().unwrap_or("?").to_string();
    let mut children = Vec::new();

    let left_version = (left.major_version, left.minor_version);
    let right_version = (right.major_version, right.minor_version);
    let version_change = change_for_equality(&left_version, &right_version);
    if version_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("version", version_change, "version", "version").with_values(
                Some(format!("{}.{}", left_version.0, left_version.1)),
                Some(format!("{}.{}", right_version.0, right_version.1)),
            ),
        );
    }

    let right_name = right.this_class_name().unwrap_or("?").to_string();
    let this_class_change = change_for_equality(&name, &right_name);
    if this_class_change == ChangeKind::Modified {
        children.push(Delta::leaf("this_class", this_class_change, "this_class", "this_class").with_values(Some(name.clone()), Some(right_name)));
    }

    let flags_change = change_for_equality(&left.access_flags().bits(), &right.access_flags().bits());
    if flags_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("access_flags", flags_change, "access_flags", "access_flags")
                .with_values(Some(format!("{:?}", left.access_flags())), Some(format!("{:?}", right.access_flags()))),
        );
    }

    let super_change = change_for_equality(&left.super_class_name().ok(), &right.super_class_name().ok());
    if super_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("superclass", super_change, "superclass", "superclass").with_values(
                left.super_class_name().ok().flatten().map(str::to_string),
                right.super_class_name().ok().flatten().map(str::to_string),
            ),
        );
    }

    let mut left_interfaces = left.interface_names().unwrap_or_default();
    let mut right_interfaces = right.interface_names().unwrap_or_default();
    left_interfaces.sort_unstable();
    right_interfaces.sort_unstable();
    let interfaces_change = change_for_equality(&left_interfaces, &right_interfaces);
    if interfaces_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("interfaces", interfaces_change, "interfaces", "interfaces")
                .with_values(Some(format!("{left_interfaces:?}")), Some(format!("{right_interfaces:?}"))),
        );
    }

    let left_pool_signature = constant_pool_signature(&left.constant_pool);
    let right_pool_signature = constant_pool_signature(&right.constant_pool);
    let pool_change = change_for_equality(&left_pool_signature, &right_pool_signature);
    children.push(
        Delta::leaf("constant_pool", pool_change, "constant_pool", "constant pool")
            .with_values(Some(format!("{} entries", left_pool_signature.len())), Some(format!("{} entries", right_pool_signature.len()))),
    );

    let left_fields = index_fields(&left.fields, &left.constant_pool);
    let right_fields = index_fields(&right.fields, &right.constant_pool);
    let mut field_keys: Vec<&String> = left_fields.keys().chain(right_fields.keys()).collect();
    field_keys.sort_unstable();
    field_keys.dedup();
    for key in field_keys {
        let l = left_fields.get(key).map(|f| (*f, &left.constant_pool));
        let r = right_fields.get(key).map(|f| (*f, &right.constant_pool));
        children.push(diff_field(key, l, r));
    }

    let left_methods = index_methods(&left.methods, &left.constant_pool);
    let right_methods = index_methods(&right.methods, &right.constant_pool);
    let mut method_keys: Vec<&String> = left_methods.keys().chain(right_methods.keys()).collect();
    method_keys.sort_unstable();
    method_keys.dedup();
    for key in method_keys {
        let l = left_methods.get(key).map(|m| (*m, &left.constant_pool));
        let r = right_methods.get(key).map(|m| (*m, &right.constant_pool));
        children.push(diff_method(key, l, r));
    }

    children.push(diff_named_attribute("signature", left, right, "Signature"));
    children.push(diff_named_attribute("source_file", left, right, "SourceFile"));
    children.push(diff_named_attribute("inner_classes", left, right, "InnerClasses"));
    children.push(diff_named_attribute("annotations", left, right, "RuntimeVisibleAnnotations"));
    children.push(diff_named_attribute("annotations", left, right, "RuntimeInvisibleAnnotations"));

    let overall = if children.iter().any(Delta::has_effective_change) { ChangeKind::Modified } else { ChangeKind::Unchanged };
    Delta::leaf("class", overall, name.clone(), name).with_children(children)
}

/// Like [`diff_class`], but checks `cancel` first. Callers that diff many
/// class pairs in a loop (a JAR, a distribution tree) call this once per
/// pair rather than wrapping every call to `diff_class` themselves.
pub fn diff_class_with_cancel(left: Option<&ClassFile>, right: Option<&ClassFile>, cancel: &dyn CancelToken) -> Result<Delta, DecodeError> {
    cancel.check()?;
    Ok(diff_class(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_class(this_name: &str) -> ClassFile {
        minimal_class_with_version(this_name, 0x34)
    }

    fn minimal_class_with_version(this_name: &str, major_version: u16) -> ClassFile {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00];
        bytes.extend(major_version.to_be_bytes());
        bytes.extend(3u16.to_be_bytes()); // constant_pool_count
        bytes.push(7); // Class
        bytes.extend(2u16.to_be_bytes());
        bytes.push(1); // Utf8
        bytes.extend((this_name.len() as u16).to_be_bytes());
        bytes.extend(this_name.as_bytes());
        bytes.extend(0x0021u16.to_be_bytes()); // access_flags: public super
        bytes.extend(1u16.to_be_bytes()); // this_class
        bytes.extend(0u16.to_be_bytes()); // super_class
        bytes.extend(0u16.to_be_bytes()); // interfaces_count
        bytes.extend(0u16.to_be_bytes()); // fields_count
        bytes.extend(0u16.to_be_bytes()); // methods_count
        bytes.extend(0u16.to_be_bytes()); // attributes_count
        ClassFile::parse(&bytes).unwrap().class
    }

    #[test]
    fn identical_classes_are_unchanged() {
        let class = minimal_class("Example");
        let delta = diff_class(Some(&class), Some(&class));
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }

    #[test]
    fn missing_right_side_is_removed() {
        let class = minimal_class("Example");
        let delta = diff_class(Some(&class), None);
        assert_eq!(delta.change, ChangeKind::Removed);
    }

    #[test]
    fn missing_left_side_is_added() {
        let class = minimal_class("Example");
        let delta = diff_class(None, Some(&class));
        assert_eq!(delta.change, ChangeKind::Added);
    }

    #[test]
    fn major_version_change_surfaces_as_version_child() {
        let left = minimal_class_with_version("Example", 52);
        let right = minimal_class_with_version("Example", 55);
        let delta = diff_class(Some(&left), Some(&right));
        assert_eq!(delta.change, ChangeKind::Modified);
        assert!(delta.children.iter().any(|c| c.kind == "version" && c.change == ChangeKind::Modified));
    }

    #[test]
    fn renamed_this_class_surfaces_as_this_class_child() {
        let left = minimal_class("Example");
        let right = minimal_class("Renamed");
        let delta = diff_class(Some(&left), Some(&right));
        assert!(delta.children.iter().any(|c| c.kind == "this_class" && c.change == ChangeKind::Modified));
    }
}
