//! Compares a method's bytecode semantically: two methods compiled by
//! different compilers (or the same compiler a version apart) can carry
//! entirely different constant pool index numbering for identical
//! instructions, so every `ConstantPoolIndex` operand is resolved to a
//! symbolic name before comparison rather than compared as a raw index.

use crate::delta::{change_for_equality, ChangeKind, Delta};
use jclass::attributes::{Code, LineNumberEntry};
use jclass::bytecode::{Instruction, Operand};
use jclass::constant_pool::{ConstantPool, Entry};

fn resolve_operand(pool: &ConstantPool, operand: &Operand) -> String {
    match operand {
        Operand::ConstantPoolIndex(index) => symbolic_constant(pool, *index),
        Operand::LocalVarIndex(i) => format!("local#{i}"),
        Operand::Immediate(v) => format!("imm:{v}"),
        Operand::BranchOffset(v) => format!("branch:{v:+}"),
        Operand::TableSwitch { default, low, high, offsets } => {
            format!("tableswitch(default={default},low={low},high={high},offsets={offsets:?})")
        }
        Operand::LookupSwitch { default, pairs } => format!("lookupswitch(default={default},pairs={pairs:?})"),
        Operand::Dimensions(d) => format!("dims:{d}"),
        Operand::InterfaceArgCount(c) => format!("argc:{c}"),
    }
}

fn symbolic_constant(pool: &ConstantPool, index: u16) -> String {
    match pool.get(index) {
        Some(Entry::Class { name_index }) => pool.as_utf8(*name_index).map(|s| format!("class:{s}")).unwrap_or_else(|_| "class:?".into()),
        Some(Entry::Fieldref { .. }) => pool
            .as_fieldref_triple(index)
            .map(|(class, name, desc)| format!("field:{class}.{name}:{desc}"))
            .unwrap_or_else(|_| "field:?".into()),
        Some(Entry::Methodref { .. }) => pool
            .as_methodref_triple(index)
            .map(|(class, name, desc)| format!("method:{class}.{name}{desc}"))
            .unwrap_or_else(|_| "method:?".into()),
        Some(Entry::InterfaceMethodref { .. }) => pool
            .as_interface_methodref_triple(index)
            .map(|(class, name, desc)| format!("interfacemethod:{class}.{name}{desc}"))
            .unwrap_or_else(|_| "interfacemethod:?".into()),
        Some(Entry::String { string_index }) => {
            pool.as_utf8(*string_index).map(|s| format!("string:{s:?}")).unwrap_or_else(|_| "string:?".into())
        }
        Some(Entry::Integer(v)) => format!("int:{v}"),
        Some(Entry::Float(bits)) => format!("float:{:?}", f32::from_bits(*bits)),
        Some(Entry::Long(v)) => format!("long:{v}"),
        Some(Entry::Double(bits)) => format!("double:{:?}", f64::from_bits(*bits)),
        Some(Entry::NameAndType { .. }) => pool
            .as_name_and_type(index)
            .map(|(name, desc)| format!("nameandtype:{name}:{desc}"))
            .unwrap_or_else(|_| "nameandtype:?".into()),
        Some(Entry::MethodType { descriptor_index }) => {
            pool.as_utf8(*descriptor_index).map(|s| format!("methodtype:{s}")).unwrap_or_else(|_| "methodtype:?".into())
        }
        Some(Entry::MethodHandle { reference_kind, reference_index }) => {
            format!("methodhandle:{reference_kind}:{}", symbolic_constant(pool, *reference_index))
        }
        _ => format!("pool#{index}"),
    }
}

/// A per-index symbolic rendering of the whole pool, in declaration
/// order. Used by the class comparator to detect constant-pool
/// permutations independently of bytecode, so the `pool` ignore token
/// can suppress pure-reordering differences that never show up in any
/// resolved instruction or descriptor.
pub fn constant_pool_signature(pool: &ConstantPool) -> Vec<String> {
    pool.iter().map(|(index, _)| symbolic_constant(pool, index)).collect()
}

fn symbolic_instruction(pool: &ConstantPool, instruction: &Instruction) -> String {
    let operands: Vec<String> = instruction.operands.iter().map(|op| resolve_operand(pool, op)).collect();
    if operands.is_empty() {
        instruction.mnemonic.to_string()
    } else {
        format!("{} {}", instruction.mnemonic, operands.join(", "))
    }
}

fn diff_line_number_table(left: &[LineNumberEntry], right: &[LineNumberEntry]) -> Delta {
    let left_repr = format!("{left:?}");
    let right_repr = format!("{right:?}");
    let change = if left == right { ChangeKind::Unchanged } else { ChangeKind::Modified };
    Delta::leaf("line_number_table", change, "line_number_table", "LineNumberTable").with_values(Some(left_repr), Some(right_repr))
}

pub fn diff_code(left: &Code, left_pool: &ConstantPool, right: &Code, right_pool: &ConstantPool) -> Delta {
    let left_instructions: Vec<String> = left.instructions.iter().map(|i| symbolic_instruction(left_pool, i)).collect();
    let right_instructions: Vec<String> = right.instructions.iter().map(|i| symbolic_instruction(right_pool, i)).collect();

    let body_change = change_for_equality(&left_instructions, &right_instructions);
    let mut children = Vec::new();

    if body_change == ChangeKind::Modified {
        children.extend(diff_instruction_sequence(&left_instructions, &right_instructions));
    }

    let left_lines = line_number_table(left);
    let right_lines = line_number_table(right);
    children.push(diff_line_number_table(&left_lines, &right_lines));

    let max_stack_change = change_for_equality(&left.max_stack, &right.max_stack);
    if max_stack_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("max_stack", max_stack_change, "max_stack", "max_stack")
                .with_values(Some(left.max_stack.to_string()), Some(right.max_stack.to_string())),
        );
    }
    let max_locals_change = change_for_equality(&left.max_locals, &right.max_locals);
    if max_locals_change == ChangeKind::Modified {
        children.push(
            Delta::leaf("max_locals", max_locals_change, "max_locals", "max_locals")
                .with_values(Some(left.max_locals.to_string()), Some(right.max_locals.to_string())),
        );
    }

    let overall = if body_change == ChangeKind::Modified
        || max_stack_change == ChangeKind::Modified
        || max_locals_change == ChangeKind::Modified
    {
        ChangeKind::Modified
    } else {
        ChangeKind::Unchanged
    };

    Delta::leaf("code", overall, "code", "Code").with_children(children)
}

fn line_number_table(code: &Code) -> Vec<LineNumberEntry> {
    for attr in &code.attributes {
        if let jclass::attributes::Attribute::LineNumberTable { entries } = &attr.value {
            return entries.clone();
        }
    }
    vec![]
}

/// A position-indexed comparison of symbolic instructions. Not an edit
/// script (no insertion/deletion alignment) — this crate only needs to
/// answer "which indices differ", not "show a minimal diff".
fn diff_instruction_sequence(left: &[String], right: &[String]) -> Vec<Delta> {
    let len = left.len().max(right.len());
    let mut children = Vec::new();
    for i in 0..len {
        let l = left.get(i);
        let r = right.get(i);
        let change = match (l, r) {
            (Some(a), Some(b)) if a == b => continue,
            (Some(_), Some(_)) => ChangeKind::Modified,
            (Some(_), None) => ChangeKind::Removed,
            (None, Some(_)) => ChangeKind::Added,
            (None, None) => continue,
        };
        children.push(
            Delta::leaf("instruction", change, format!("instruction#{i}"), format!("instruction[{i}]"))
                .with_values(l.cloned(), r.cloned()),
        );
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass::cursor::ByteCursor;

    fn pool_with_one_utf8(name: &str) -> ConstantPool {
        let mut bytes = vec![1u8];
        bytes.extend((name.len() as u16).to_be_bytes());
        bytes.extend(name.as_bytes());
        let mut cursor = ByteCursor::new(&bytes);
        ConstantPool::parse(&mut cursor, 2).unwrap()
    }

    fn code_with(instructions: &[u8]) -> Code {
        Code {
            max_stack: 1,
            max_locals: 1,
            code: instructions.to_vec(),
            instructions: jclass::bytecode::decode(instructions).unwrap(),
            exception_table: vec![],
            attributes: vec![],
        }
    }

    #[test]
    fn identical_bytecode_is_unchanged() {
        let pool = pool_with_one_utf8("x");
        let code = code_with(&[0x03, 0xac]); // iconst_0, ireturn
        let delta = diff_code(&code, &pool, &code, &pool);
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }

    fn pool_with_two_utf8(first: &str, second: &str) -> ConstantPool {
        let mut bytes = vec![1u8];
        bytes.extend((first.len() as u16).to_be_bytes());
        bytes.extend(first.as_bytes());
        bytes.push(1);
        bytes.extend((second.len() as u16).to_be_bytes());
        bytes.extend(second.as_bytes());
        let mut cursor = ByteCursor::new(&bytes);
        ConstantPool::parse(&mut cursor, 3).unwrap()
    }

    #[test]
    fn constant_pool_signature_detects_reordering() {
        let forward = pool_with_two_utf8("a", "b");
        let reversed = pool_with_two_utf8("b", "a");
        assert_ne!(constant_pool_signature(&forward), constant_pool_signature(&reversed));
        assert_eq!(constant_pool_signature(&forward), constant_pool_signature(&forward));
    }

    #[test]
    fn differing_bytecode_is_modified_with_per_instruction_children() {
        let pool = pool_with_one_utf8("x");
        let left = code_with(&[0x03, 0xac]); // iconst_0, ireturn
        let right = code_with(&[0x04, 0xac]); // iconst_1, ireturn
        let delta = diff_code(&left, &pool, &right, &pool);
        assert_eq!(delta.change, ChangeKind::Modified);
        assert!(delta.children.iter().any(|c| c.kind == "instruction" && c.change == ChangeKind::Modified));
    }
}
