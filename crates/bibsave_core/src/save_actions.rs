//! Pre-save field transformations.
//!
//! Rules are stored in metadata under [`SAVE_ACTIONS`]:
//!
//! ```text
//! saveActions: enabled; title[trim_whitespace,collapse_whitespace] pages[normalize_page_numbers];
//! ```
//!
//! Applying rules never fails and never mutates the database: records whose
//! values change are copied, everything else is borrowed.

use crate::model::{MetaData, Record, SAVE_ACTIONS};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const ENABLED: &str = "enabled";

/// A pure value transform applied to one field.
pub trait FieldTransform: fmt::Debug + Send + Sync {
    /// Name used in stored rules.
    fn name(&self) -> &str;

    /// Returns the transformed value.
    fn apply(&self, value: &str) -> String;
}

/// The transforms available by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTransform {
    /// Strip leading and trailing whitespace.
    TrimWhitespace,
    /// Replace whitespace runs with one space.
    CollapseWhitespace,
    /// Lowercase.
    LowerCase,
    /// Uppercase.
    UpperCase,
    /// Write page ranges as `a--b`.
    NormalizePageNumbers,
    /// Drop one pair of braces enclosing the whole value.
    RemoveEnclosingBraces,
}

impl BuiltinTransform {
    /// All built-in transforms.
    pub const ALL: [Self; 6] = [
        Self::TrimWhitespace,
        Self::CollapseWhitespace,
        Self::LowerCase,
        Self::UpperCase,
        Self::NormalizePageNumbers,
        Self::RemoveEnclosingBraces,
    ];

    /// Looks up a transform by its stored name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl FieldTransform for BuiltinTransform {
    fn name(&self) -> &str {
        match self {
            Self::TrimWhitespace => "trim_whitespace",
            Self::CollapseWhitespace => "collapse_whitespace",
            Self::LowerCase => "lower_case",
            Self::UpperCase => "upper_case",
            Self::NormalizePageNumbers => "normalize_page_numbers",
            Self::RemoveEnclosingBraces => "remove_enclosing_braces",
        }
    }

    fn apply(&self, value: &str) -> String {
        match self {
            Self::TrimWhitespace => value.trim().to_string(),
            Self::CollapseWhitespace => value.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::LowerCase => value.to_lowercase(),
            Self::UpperCase => value.to_uppercase(),
            Self::NormalizePageNumbers => normalize_pages(value),
            Self::RemoveEnclosingBraces => remove_enclosing_braces(value),
        }
    }
}

fn normalize_pages(value: &str) -> String {
    let is_dash = |c: char| matches!(c, '-' | '\u{2013}' | '\u{2014}') || c.is_whitespace();
    let trimmed = value.trim();
    let Some(start) = trimmed.find(is_dash) else {
        return value.to_string();
    };
    let (first, rest) = trimmed.split_at(start);
    let last = rest.trim_start_matches(is_dash);
    let separator = &rest[..rest.len() - last.len()];

    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());
    if numeric(first) && numeric(last) && separator.chars().any(|c| !c.is_whitespace()) {
        format!("{first}--{last}")
    } else {
        value.to_string()
    }
}

fn remove_enclosing_braces(value: &str) -> String {
    let Some(inner) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) else {
        return value.to_string();
    };
    // The opening brace must close at the very end
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return value.to_string();
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        inner.to_string()
    } else {
        value.to_string()
    }
}

/// Applies one transform to one field.
#[derive(Debug, Clone)]
pub struct TransformRule {
    field: String,
    transform: Arc<dyn FieldTransform>,
}

impl TransformRule {
    /// Creates a rule.
    pub fn new(field: impl Into<String>, transform: impl FieldTransform + 'static) -> Self {
        Self {
            field: field.into().to_ascii_lowercase(),
            transform: Arc::new(transform),
        }
    }

    /// Returns the target field.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the transform name.
    #[must_use]
    pub fn transform_name(&self) -> &str {
        self.transform.name()
    }
}

/// An ordered list of transform rules.
#[derive(Debug, Clone, Default)]
pub struct SaveActions {
    rules: Vec<TransformRule>,
}

impl SaveActions {
    /// Creates an empty list, which leaves records untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: TransformRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends the rules of `other` after this list's rules.
    #[must_use]
    pub fn extended(mut self, other: &Self) -> Self {
        self.rules.extend(other.rules.iter().cloned());
        self
    }

    /// Parses stored values `[enabled|disabled, rules]`.
    ///
    /// A disabled or malformed configuration yields no rules. Unknown
    /// transform names and malformed rule text are skipped.
    #[must_use]
    pub fn parse(values: &[String]) -> Self {
        let mut actions = Self::new();
        let Some((state, rest)) = values.split_first() else {
            return actions;
        };
        if state.trim() != ENABLED {
            return actions;
        }

        for text in rest {
            for token in split_rules(text) {
                let Some((field, ops)) = parse_rule(token) else {
                    debug!(rule = token, "ignoring malformed save action");
                    continue;
                };
                for op in ops.split(',').map(str::trim).filter(|op| !op.is_empty()) {
                    match BuiltinTransform::from_name(op) {
                        Some(transform) => actions.rules.push(TransformRule::new(field, transform)),
                        None => debug!(field, op, "ignoring unknown save action"),
                    }
                }
            }
        }
        actions
    }

    /// Reads the rules stored in `metadata`.
    #[must_use]
    pub fn from_metadata(metadata: &MetaData) -> Self {
        metadata.get(SAVE_ACTIONS).map(Self::parse).unwrap_or_default()
    }

    /// Returns the rules.
    #[must_use]
    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the rules to one record.
    ///
    /// The record is copied, and marked changed, only if a value changes.
    #[must_use]
    pub fn apply_to<'a>(&self, record: &'a Record) -> Cow<'a, Record> {
        let mut out = Cow::Borrowed(record);
        for rule in &self.rules {
            let Some(value) = out.fields().get(&rule.field) else {
                continue;
            };
            let transformed = rule.transform.apply(value);
            if transformed != *value {
                out.to_mut().set_field(&rule.field, transformed);
            }
        }
        out
    }

    /// Applies the rules to each record, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, records: &[&'a Record]) -> Vec<Cow<'a, Record>> {
        records.iter().map(|r| self.apply_to(r)).collect()
    }
}

/// Splits rule text into `field[ops]` tokens, keeping bracketed parts whole.
fn split_rules(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut in_brackets = false;
    for (i, c) in text.char_indices() {
        match c {
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ => {}
        }
        let separator = !in_brackets && (c.is_whitespace() || c == ';');
        match (start, separator) {
            (None, false) => start = Some(i),
            (Some(s), true) => {
                tokens.push(&text[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

fn parse_rule(token: &str) -> Option<(&str, &str)> {
    let (field, rest) = token.split_once('[')?;
    let ops = rest.strip_suffix(']')?;
    let field = field.trim();
    if field.is_empty() || ops.contains('[') {
        return None;
    }
    Some((field, ops))
}
