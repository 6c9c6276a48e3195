/*
    This module is for storing grammars in the exchange format
*/

use std::collections::BTreeMap;

// The base unit in a linearization sequence
#[derive(Debug, PartialEq, Clone)]
pub enum Symbol {
    Terminal(String),
    Argref(usize, usize),
}

// One rewrite rule of a function: a left-hand side and its arguments
pub type RuleBody = (String, Vec<String>);

// The sequence names realizing one linearization of a function
pub type Linearization = Vec<String>;

// The body of a named sequence
pub type Sequence = Vec<Symbol>;

// A grammar as assembled from a declaration stream. The maps are keyed by
// function or sequence name; the vector values keep the alternatives for one
// name in declaration order.
#[derive(Debug, PartialEq, Default)]
pub struct Grammar {
    pub comments: Vec<String>,
    pub pragmas: Vec<(Option<String>, String)>,
    pub rules: BTreeMap<String, Vec<RuleBody>>,
    pub linearizations: BTreeMap<String, Vec<Linearization>>,
    pub sequences: BTreeMap<String, Sequence>,
    pub scores: BTreeMap<String, Vec<f64>>,
}
