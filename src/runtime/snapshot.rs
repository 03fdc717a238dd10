use std::collections::BTreeMap;

/// Deep copy of the observable VM state, taken before and after each
/// SATURATE body pass for fixed-point detection.
///
/// Equality is what the fixed point is defined over: stacks compare by
/// element order and length; bindings compare by key-value content. The
/// ordered map makes the bindings comparison order-insensitive by
/// construction, so insertion order can never bleed into fixed-point
/// detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    stack: Vec<String>,
    bindings: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn capture(stack: &[String], bindings: &BTreeMap<String, String>) -> Self {
        Self {
            stack: stack.to_vec(),
            bindings: bindings.clone(),
        }
    }
}
