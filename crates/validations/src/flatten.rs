//! Flattens nested tag-engine failures into ordered leaves.

use model_validations_ports::{FieldFailure, RawFailure};

/// Leaves of `raw`, depth-first and left to right, at any nesting depth.
pub fn flatten(raw: RawFailure) -> Vec<FieldFailure> {
    let mut leaves = Vec::new();
    collect(raw, &mut leaves);
    leaves
}

fn collect(raw: RawFailure, leaves: &mut Vec<FieldFailure>) {
    match raw {
        RawFailure::Leaf(failure) => leaves.push(failure),
        RawFailure::Composite(children) => {
            for child in children {
                collect(child, leaves);
            }
        },
    }
}
