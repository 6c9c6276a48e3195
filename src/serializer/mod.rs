/*
    This module writes grammars back out as exchange format text
*/

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::grammar::*;

// One line per name, grouped by declaration kind: comments, pragmas, rules,
// linearizations, sequences, scores. Re-parsing the output yields the input
// grammar; the blank lines between groups vanish on the way back in.
pub fn serialize(grammar: &Grammar) -> String {
    render(grammar, false)
}

// Canonicalization mode: consecutive equal-bodied rule and linearization
// declarations of distinct names merge back into the shorthand form
pub fn serialize_grouped(grammar: &Grammar) -> String {
    render(grammar, true)
}

fn render(grammar: &Grammar, grouped: bool) -> String {
    let sections: Vec<Vec<String>> = vec![
        grammar.comments.clone(),
        grammar.pragmas.iter().map(pragma_line).collect(),
        body_groups(&grammar.rules, grouped).into_iter()
            .map(|(names, body)| rule_line(&names, body))
            .collect(),
        body_groups(&grammar.linearizations, grouped).into_iter()
            .map(|(names, refs)| lin_line(&names, refs))
            .collect(),
        grammar.sequences.iter()
            .map(|(name, body)| sequence_line(name, body))
            .collect(),
        grammar.scores.iter()
            .flat_map(|(name, values)| values.iter().map(move |value| score_line(name, *value)))
            .collect(),
    ];

    let text = sections.iter()
        .filter(|lines| !lines.is_empty())
        .map(|lines| lines.join("\n"))
        .join("\n\n");
    if text.is_empty() {
        return text;
    }
    return text + "\n";
}

// Flattens a name-keyed map into (names, body) declaration groups. Without
// grouping every body gets its own single-name group; with grouping a body
// equal to the previous one joins its group, unless the name already occurs
// there (same-name alternatives stay separate declarations)
fn body_groups<T: PartialEq>(map: &BTreeMap<String, Vec<T>>, grouped: bool) -> Vec<(Vec<&str>, &T)> {
    let mut groups: Vec<(Vec<&str>, &T)> = Vec::new();
    for (name, bodies) in map {
        for body in bodies {
            match groups.last_mut() {
                Some((names, last)) if grouped && *last == body && !names.contains(&name.as_str()) => {
                    names.push(name.as_str())
                }
                _ => groups.push((vec![name.as_str()], body))
            }
        }
    }
    return groups;
}

fn pragma_line((name, value): &(Option<String>, String)) -> String {
    let mut line = String::from(':');
    if let Some(name) = name {
        line.push_str(name);
    }
    if !value.is_empty() {
        line.push(' ');
        line.push_str(value);
    }
    return line;
}

fn rule_line(names: &[&str], body: &RuleBody) -> String {
    let (lhs, rhs) = body;
    let mut parts = names.iter().map(|n| n.to_string()).collect_vec();
    parts.push(":".to_string());
    parts.push(lhs.clone());
    parts.push("<-".to_string());
    parts.extend(rhs.iter().cloned());
    return parts.join(" ");
}

fn lin_line(names: &[&str], refs: &Linearization) -> String {
    let mut parts = names.iter().map(|n| n.to_string()).collect_vec();
    parts.push("=".to_string());
    parts.extend(refs.iter().cloned());
    return parts.join(" ");
}

fn sequence_line(name: &str, body: &Sequence) -> String {
    let mut parts = vec![name.to_string(), "=>".to_string()];
    parts.extend(body.iter().map(symbol_text));
    return parts.join(" ");
}

fn score_line(name: &str, value: f64) -> String {
    format!("{} {}", name, value)
}

fn symbol_text(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Terminal(text) => encode_terminal(text),
        Symbol::Argref(argument, component) => format!("{}:{}", argument, component)
    }
}

// The inverse of the lexer's terminal decoding: double-quoted, with the
// quote character escaped
fn encode_terminal(text: &str) -> String {
    let mut quoted = String::from('"');
    for c in text.chars() {
        if c == '"' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    return quoted;
}
