//! [Field and method descriptors](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=134)
//!
//! Descriptors are their own tiny grammar layered on top of the modified
//! UTF-8 string they live in. Array dimensions are folded into the
//! element type rather than tracked separately, and method descriptors
//! walk the byte stream once instead of re-scanning.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object(String),
    /// Array of `dimensions` (>= 1) nesting the given element type.
    Array { dimensions: u32, element: Box<FieldType> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadDescriptor;

fn parse_field_type(chars: &[char], pos: &mut usize) -> Result<FieldType, BadDescriptor> {
    let mut dimensions = 0u32;
    while chars.get(*pos) == Some(&'[') {
        dimensions += 1;
        *pos += 1;
    }
    let base = match chars.get(*pos) {
        Some('B') => {
            *pos += 1;
            FieldType::Byte
        }
        Some('C') => {
            *pos += 1;
            FieldType::Char
        }
        Some('D') => {
            *pos += 1;
            FieldType::Double
        }
        Some('F') => {
            *pos += 1;
            FieldType::Float
        }
        Some('I') => {
            *pos += 1;
            FieldType::Int
        }
        Some('J') => {
            *pos += 1;
            FieldType::Long
        }
        Some('S') => {
            *pos += 1;
            FieldType::Short
        }
        Some('Z') => {
            *pos += 1;
            FieldType::Boolean
        }
        Some('L') => {
            *pos += 1;
            let start = *pos;
            while chars.get(*pos).is_some_and(|c| *c != ';') {
                *pos += 1;
            }
            if chars.get(*pos) != Some(&';') {
                return Err(BadDescriptor);
            }
            let name: String = chars[start..*pos].iter().collect();
            *pos += 1;
            FieldType::Object(name)
        }
        _ => return Err(BadDescriptor),
    };
    if dimensions == 0 {
        Ok(base)
    } else {
        Ok(FieldType::Array { dimensions, element: Box::new(base) })
    }
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<FieldType, BadDescriptor> {
    let chars: Vec<char> = descriptor.chars().collect();
    let mut pos = 0;
    let ty = parse_field_type(&chars, &mut pos)?;
    if pos != chars.len() {
        return Err(BadDescriptor);
    }
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, BadDescriptor> {
    let chars: Vec<char> = descriptor.chars().collect();
    let mut pos = 0;
    if chars.first() != Some(&'(') {
        return Err(BadDescriptor);
    }
    pos += 1;
    let mut parameters = Vec::new();
    while chars.get(pos) != Some(&')') {
        if chars.get(pos).is_none() {
            return Err(BadDescriptor);
        }
        parameters.push(parse_field_type(&chars, &mut pos)?);
    }
    pos += 1; // consume ')'
    let return_type = if chars.get(pos) == Some(&'V') {
        pos += 1;
        None
    } else {
        Some(parse_field_type(&chars, &mut pos)?)
    };
    if pos != chars.len() {
        return Err(BadDescriptor);
    }
    Ok(MethodDescriptor { parameters, return_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive_field_descriptor() {
        assert_eq!(parse_field_descriptor("I").unwrap(), FieldType::Int);
    }

    #[test]
    fn parses_object_field_descriptor() {
        assert_eq!(
            parse_field_descriptor("Ljava/lang/String;").unwrap(),
            FieldType::Object("java/lang/String".to_string())
        );
    }

    #[test]
    fn parses_multi_dimensional_array_descriptor() {
        assert_eq!(
            parse_field_descriptor("[[I").unwrap(),
            FieldType::Array { dimensions: 2, element: Box::new(FieldType::Int) }
        );
    }

    #[test]
    fn parses_method_descriptor_with_mixed_parameters() {
        let md = parse_method_descriptor("(ILjava/lang/String;[B)Z").unwrap();
        assert_eq!(
            md.parameters,
            vec![
                FieldType::Int,
                FieldType::Object("java/lang/String".to_string()),
                FieldType::Array { dimensions: 1, element: Box::new(FieldType::Byte) },
            ]
        );
        assert_eq!(md.return_type, Some(FieldType::Boolean));
    }

    #[test]
    fn parses_void_return() {
        let md = parse_method_descriptor("()V").unwrap();
        assert!(md.parameters.is_empty());
        assert_eq!(md.return_type, None);
    }

    #[test]
    fn rejects_unterminated_object_descriptor() {
        assert_eq!(parse_field_descriptor("Ljava/lang/String"), Err(BadDescriptor));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert_eq!(parse_field_descriptor("IJ"), Err(BadDescriptor));
    }
}
