//! Reverse template parsing.
//!
//! A reverse template describes how to *build* a path, not how to match
//! one: literal text interleaved with named placeholders. `<name>` is a
//! plain placeholder, `<name*>` a greedy one (its value may keep literal
//! `/` characters), and a single-level `[` ... `]` pair marks an optional
//! section that is dropped from the composed path when every placeholder
//! inside it still equals its default.
//!
//! Parsing happens once per routing locale key; the result is cached on
//! the route.

use crate::routing::param::ParamValue;
use std::collections::BTreeMap;

/// One piece of a reverse template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseToken {
    Literal(String),
    Param { name: String, greedy: bool },
}

/// A run of tokens, possibly marked optional by `[` ... `]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseSection {
    pub tokens: Vec<ReverseToken>,
    pub optional: bool,
}

impl ReverseSection {
    /// Names of the placeholders in this section, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            ReverseToken::Param { name, .. } => Some(name.as_str()),
            ReverseToken::Literal(_) => None,
        })
    }

    pub fn has_params(&self) -> bool {
        self.param_names().next().is_some()
    }
}

/// Parsed reverse composition data for one routing locale key, bundled with
/// the defaults that apply under that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseData {
    /// The raw template this data was parsed from
    pub template: String,

    /// Ordered literal/placeholder sections
    pub sections: Vec<ReverseSection>,

    /// All placeholder names, in order of first appearance
    pub param_names: Vec<String>,

    /// Default parameter values for the same locale key
    pub defaults: BTreeMap<String, ParamValue>,
}

impl ReverseData {
    /// Parse a template and attach its locale defaults.
    pub fn parse(template: &str, defaults: BTreeMap<String, ParamValue>) -> Self {
        let sections = parse_sections(template);
        let mut param_names = Vec::new();
        for section in &sections {
            for name in section.param_names() {
                if !param_names.iter().any(|n| n == name) {
                    param_names.push(name.to_string());
                }
            }
        }
        Self {
            template: template.to_string(),
            sections,
            param_names,
            defaults,
        }
    }
}

fn parse_sections(template: &str) -> Vec<ReverseSection> {
    let mut sections = Vec::new();
    let mut tokens: Vec<ReverseToken> = Vec::new();
    let mut literal = String::new();
    let mut in_optional = false;

    let flush_literal = |literal: &mut String, tokens: &mut Vec<ReverseToken>| {
        if !literal.is_empty() {
            tokens.push(ReverseToken::Literal(std::mem::take(literal)));
        }
    };
    let flush_section =
        |tokens: &mut Vec<ReverseToken>, sections: &mut Vec<ReverseSection>, optional: bool| {
            if !tokens.is_empty() {
                sections.push(ReverseSection {
                    tokens: std::mem::take(tokens),
                    optional,
                });
            }
        };

    let mut chars = template.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '[' if !in_optional => {
                flush_literal(&mut literal, &mut tokens);
                flush_section(&mut tokens, &mut sections, false);
                in_optional = true;
            }
            ']' if in_optional => {
                flush_literal(&mut literal, &mut tokens);
                flush_section(&mut tokens, &mut sections, true);
                in_optional = false;
            }
            '<' => {
                let rest = &template[index + 1..];
                match rest.find('>') {
                    Some(end) if !rest[..end].is_empty() => {
                        let raw_name = &rest[..end];
                        let (name, greedy) = match raw_name.strip_suffix('*') {
                            Some(stripped) => (stripped, true),
                            None => (raw_name, false),
                        };
                        if name.is_empty() {
                            literal.push(ch);
                            continue;
                        }
                        flush_literal(&mut literal, &mut tokens);
                        tokens.push(ReverseToken::Param {
                            name: name.to_string(),
                            greedy,
                        });
                        // Skip past the placeholder body and '>'
                        while let Some((i, _)) = chars.peek() {
                            if *i <= index + end + 1 {
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                    _ => literal.push(ch),
                }
            }
            _ => literal.push(ch),
        }
    }

    flush_literal(&mut literal, &mut tokens);
    // An unterminated optional marker degrades to a plain section
    flush_section(&mut tokens, &mut sections, false);
    sections
}
