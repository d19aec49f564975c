//! Pointer resolution
//!
//! Rewrites every `Pointer`-typed variable of a [`Stack`] from raw addresses to
//! [`PointerTarget`]s. Targets are searched across the whole stack, since a
//! pointer may refer to any live scope.
//!
//! # Rules
//!
//! For a raw address `p`:
//! 1. `p == 0` is [`PointerTarget::Null`].
//! 2. Candidates are visited in frame order, then engine order within a frame.
//!    An array candidate matches when `p` lies inside it: on an element
//!    boundary it resolves to that element, otherwise it is
//!    [`PointerTarget::Opaque`]. A non-array candidate matches only on its
//!    exact base address.
//! 3. No match is [`PointerTarget::Opaque`].
//!
//! The first match wins. Resolution is recomputed for every snapshot because
//! stack slots are reused after a function returns.

use super::stack::{Stack, VarId};
use super::value::{Address, PointerTarget, Value};
use tracing::trace;

impl Stack {
    /// Resolve a single raw address against every live variable
    pub fn find_pointer(&self, p: Address) -> PointerTarget {
        if p == 0 {
            return PointerTarget::Null;
        }

        for (_, var) in self.scan_order() {
            let frame = &self.frame_of(var).scope;
            match var.value.array_len() {
                Some(_) if var.unit_size > 0 => {
                    let offset = match p.checked_sub(var.address) {
                        Some(offset) if offset < var.byte_len() => offset,
                        _ => continue,
                    };
                    if offset % var.unit_size == 0 {
                        return PointerTarget::Resolved {
                            frame: frame.clone(),
                            variable: var.name.clone(),
                            index: Some((offset / var.unit_size) as usize),
                        };
                    }
                    return PointerTarget::Opaque(p);
                }
                _ => {
                    if p == var.address {
                        return PointerTarget::Resolved {
                            frame: frame.clone(),
                            variable: var.name.clone(),
                            index: None,
                        };
                    }
                }
            }
        }

        PointerTarget::Opaque(p)
    }

    /// Rewrite all pointer-typed variables in place
    pub fn resolve_pointers(&mut self) {
        let resolved: Vec<(VarId, Value)> = self
            .scan_order()
            .filter(|(_, var)| var.type_tag.is_pointer())
            .filter_map(|(id, var)| self.resolve_value(&var.value).map(|value| (id, value)))
            .collect();

        for (id, value) in resolved {
            let var = self.variable_mut(id);
            trace!(variable = %var.name, ?value, "Resolved pointer");
            var.value = value;
        }
    }

    /// Resolved form of a raw pointer value, or None if it holds no address
    fn resolve_value(&self, raw: &Value) -> Option<Value> {
        match raw {
            Value::Scalar(scalar) => scalar
                .as_address()
                .map(|p| Value::Pointer(self.find_pointer(p))),
            Value::Array(elements) => elements
                .iter()
                .map(|scalar| scalar.as_address().map(|p| self.find_pointer(p)))
                .collect::<Option<Vec<_>>>()
                .map(Value::PointerArray),
            Value::Pointer(_) | Value::PointerArray(_) | Value::Missing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::stack::{Scope, Stack};
    use crate::memory::value::{PointerTarget, Value};
    use crate::snapshot::decode_line;

    const A: u64 = 1000;

    fn resolved_stack(vars: &str) -> Stack {
        let line = format!(r#"{{"line":0,"column":0,"vars":[{}, "_dummy"]}}"#, vars);
        let snapshot = decode_line(&line).unwrap().unwrap();
        Stack::from_snapshot(&snapshot)
    }

    fn main_scope() -> Scope {
        Scope::Function("main".into())
    }

    fn pointer_of(stack: &Stack, name: &str) -> PointerTarget {
        match &stack.lookup(&main_scope(), name).unwrap().value {
            Value::Pointer(target) => target.clone(),
            other => panic!("Expected resolved pointer, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_to_array_element() {
        let stack = resolved_stack(&format!(
            r#"{{"function":"main","name":"p","type":"Pointer","address":2000,"unit_size":8,"value":{}}},
               {{"function":"main","name":"arr","type":"Int","address":{},"unit_size":4,"value":[1,2,3,4,"_dummy"]}}"#,
            A + 2 * 4,
            A
        ));

        assert_eq!(
            pointer_of(&stack, "p"),
            PointerTarget::Resolved {
                frame: main_scope(),
                variable: "arr".into(),
                index: Some(2),
            }
        );
    }

    #[test]
    fn test_pointer_to_scalar() {
        let stack = resolved_stack(
            r#"{"function":"main","name":"p","type":"Pointer","address":2000,"unit_size":8,"value":1000},
               {"function":"main","name":"x","type":"Int","address":1000,"unit_size":4,"value":9}"#,
        );

        assert_eq!(
            pointer_of(&stack, "p"),
            PointerTarget::Resolved {
                frame: main_scope(),
                variable: "x".into(),
                index: None,
            }
        );
    }

    #[test]
    fn test_null_pointer() {
        let stack = resolved_stack(
            r#"{"function":"main","name":"p","type":"Pointer","address":0,"unit_size":8,"value":0}"#,
        );
        // p itself lives at address 0 here; null still wins
        assert_eq!(pointer_of(&stack, "p"), PointerTarget::Null);
        assert_eq!(Stack::new().find_pointer(0), PointerTarget::Null);
    }

    #[test]
    fn test_mid_element_and_past_end_are_opaque() {
        let stack = resolved_stack(
            r#"{"function":"main","name":"arr","type":"Int","address":1000,"unit_size":4,"value":[1,2,3,4,"_dummy"]}"#,
        );

        assert_eq!(stack.find_pointer(A + 2), PointerTarget::Opaque(A + 2));
        let past_last_boundary = A + 3 * 4 + 1;
        assert_eq!(
            stack.find_pointer(past_last_boundary),
            PointerTarget::Opaque(past_last_boundary)
        );
        assert_eq!(stack.find_pointer(A + 16), PointerTarget::Opaque(A + 16));
        assert_eq!(stack.find_pointer(A - 4), PointerTarget::Opaque(A - 4));
        assert!(matches!(
            stack.find_pointer(A + 12),
            PointerTarget::Resolved { index: Some(3), .. }
        ));
    }

    #[test]
    fn test_array_at_top_of_address_space() {
        let base = u64::MAX - 7;
        let stack = resolved_stack(&format!(
            r#"{{"function":"main","name":"arr","type":"Int","address":{},"unit_size":4,"value":[1,2,3,4,"_dummy"]}}"#,
            base
        ));

        let arr = stack.lookup(&main_scope(), "arr").unwrap();
        assert_eq!(arr.byte_len(), 16);
        assert!(matches!(
            stack.find_pointer(base + 4),
            PointerTarget::Resolved { index: Some(1), .. }
        ));
        assert_eq!(stack.find_pointer(u64::MAX), PointerTarget::Opaque(u64::MAX));
    }

    #[test]
    fn test_pointer_into_outer_scope() {
        let stack = resolved_stack(
            r#"{"function":"swap","name":"a","type":"Pointer","address":3000,"unit_size":8,"value":16},
               {"function":"main","name":"q","type":"Pointer","address":2000,"unit_size":8,"value":4096},
               {"function":"","name":"g","type":"Int","address":16,"unit_size":4,"value":1}"#,
        );

        let a = stack
            .lookup(&Scope::Function("swap".into()), "a")
            .unwrap();
        assert_eq!(
            a.value,
            Value::Pointer(PointerTarget::Resolved {
                frame: Scope::Global,
                variable: "g".into(),
                index: None,
            })
        );
        assert_eq!(pointer_of(&stack, "q"), PointerTarget::Opaque(4096));
    }

    #[test]
    fn test_pointer_array_elements_resolved() {
        let stack = resolved_stack(
            r#"{"function":"main","name":"ps","type":"Pointer","address":2000,"unit_size":8,"value":[0,1000,1004,7,"_dummy"]},
               {"function":"main","name":"arr","type":"Int","address":1000,"unit_size":4,"value":[5,6,"_dummy"]}"#,
        );

        let ps = stack.lookup(&main_scope(), "ps").unwrap();
        match &ps.value {
            Value::PointerArray(targets) => {
                assert_eq!(targets.len(), 4);
                assert_eq!(targets[0], PointerTarget::Null);
                assert!(matches!(&targets[1], PointerTarget::Resolved { index: Some(0), .. }));
                assert!(matches!(&targets[2], PointerTarget::Resolved { index: Some(1), .. }));
                assert_eq!(targets[3], PointerTarget::Opaque(7));
            }
            other => panic!("Expected pointer array, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_into_pointer_array() {
        let stack = resolved_stack(
            r#"{"function":"main","name":"pp","type":"Pointer","address":3000,"unit_size":8,"value":2008},
               {"function":"main","name":"ps","type":"Pointer","address":2000,"unit_size":8,"value":[0,0,"_dummy"]}"#,
        );

        assert_eq!(
            pointer_of(&stack, "pp"),
            PointerTarget::Resolved {
                frame: main_scope(),
                variable: "ps".into(),
                index: Some(1),
            }
        );
    }
}
