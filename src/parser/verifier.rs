use std::collections::BTreeMap;

use crate::grammar::Sequence;
use super::ParseErrorType::UndefinedSequenceReference;
use super::{Declaration, DeclarationLine, ParseErrors};

fn get_line_undefined_references(line: &DeclarationLine, sequences: &BTreeMap<String, Sequence>) -> ParseErrors {
    // Only linearizations refer to sequences by name
    let Declaration::Lin { refs, .. } = &line.declaration else {
        return Vec::new();
    };

    refs.iter()
        .filter(|name| !sequences.contains_key(*name))
        .map(|name| line.error(UndefinedSequenceReference(name.clone())))
        .collect()
}

// Checks that every sequence a linearization refers to is defined. Range
// checking of argument references is a downstream concern, since one function
// name may own rule alternatives of differing arities.
pub fn verify_sequence_references(lines: &[DeclarationLine], sequences: &BTreeMap<String, Sequence>) -> ParseErrors {
    lines.iter()
        .flat_map(|line| get_line_undefined_references(line, sequences))
        .collect()
}
