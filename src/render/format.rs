use crate::memory::value::{PointerTarget, Scalar, Value};
use std::fmt;

/// Literal shown for the zero address
pub const NULL_LITERAL: &str = "NULL";

/// Shown when the engine did not serialize a value
pub const MISSING_LITERAL: &str = "?";

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Unsigned(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for PointerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerTarget::Null => f.write_str(NULL_LITERAL),
            PointerTarget::Resolved {
                frame,
                variable,
                index,
            } => {
                write!(f, "&{}.{}", frame, variable)?;
                if let Some(i) = index {
                    write!(f, "[{}]", i)?;
                }
                Ok(())
            }
            PointerTarget::Opaque(addr) => write!(f, "0x{:x}", addr),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(elements) => write_list(f, elements),
            Value::Pointer(target) => write!(f, "{}", target),
            Value::PointerArray(targets) => write_list(f, targets),
            Value::Missing => f.write_str(MISSING_LITERAL),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

/// Frame header line: change mark, then the frame's display name
pub(crate) fn format_frame_header(is_new: bool, name: &str) -> String {
    format!("{} {}", mark(is_new), name)
}

/// Variable line with aligned name and type columns
pub(crate) fn format_variable_line(
    changed: bool,
    name: &str,
    type_name: &str,
    value: &str,
) -> String {
    format!("{}   {:<32} {:<16} {}", mark(changed), name, type_name, value)
}

fn mark(flagged: bool) -> char {
    if flagged {
        '*'
    } else {
        ' '
    }
}
