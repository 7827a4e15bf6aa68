//! Directive parsing: turns field-matching directive strings into a plan.
//!
//! Parses one or more field-directive strings — each one OR-combined
//! "alternative" — into a normalized [`Plan`] consumed by
//! [`crate::hasher::hash_record`]. Grammar:
//!
//! ```text
//! directive   := group ( ';' group )*
//! group       := [ '&' ] field ( ',' field )*
//! field       := NAME [ '%' DIGITS ]
//! ```
//!
//! Whitespace is stripped from each directive string before tokenising.
use std::collections::HashMap;
use std::fmt;

/// Errors produced while parsing directive strings into a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// A group, field name, or `%`-suffix was malformed.
    ///
    /// The inner string describes which directive and token failed, for
    /// diagnostics; it is not part of the error's identity.
    DirectiveSyntax(String),
    /// No alternatives were supplied (the input slice of directive strings
    /// was empty).
    DirectiveEmpty,
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectiveSyntax(msg) => write!(f, "directive syntax error: {msg}"),
            Self::DirectiveEmpty => f.write_str("no directive alternatives supplied"),
        }
    }
}

impl std::error::Error for DirectiveError {}

/// A single field reference within a [`Group`]: a field name plus the
/// string-level deletion-neighborhood depth to apply to its value before
/// fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field's name, as referenced in the caller's record projector.
    pub name: String,
    /// String-level deletion-neighborhood depth (`%N` in the DSL).
    pub expand: u64,
}

/// An ordered, comma-separated tuple of fields hashed together as one
/// logical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// `true` if the group was prefixed `&`: never deleted by the
    /// group-level neighborhood.
    pub required: bool,
    /// The fields that make up this group, in directive order.
    pub fields: Vec<Field>,
}

/// One OR-combined directive string, normalized: within an alternative, a
/// field name appearing in more than one group uses the maximum
/// `expandEditDistance` requested for it anywhere in the alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// The field groups that make up this alternative, in directive order.
    pub groups: Vec<Group>,
}

/// The parsed, normalized form of one or more directive strings: a list of
/// alternatives, OR-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// The alternatives, in the order their directive strings were supplied.
    pub alternatives: Vec<Alternative>,
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_field(token: &str, directive_index: usize) -> Result<Field, DirectiveError> {
    if token.is_empty() {
        return Err(DirectiveError::DirectiveSyntax(format!(
            "alternative {directive_index}: empty field name"
        )));
    }
    match token.split_once('%') {
        None => {
            if token.contains('&') {
                return Err(DirectiveError::DirectiveSyntax(format!(
                    "alternative {directive_index}: '&' is only valid as a group prefix, found in {token:?}"
                )));
            }
            Ok(Field {
                name: token.to_owned(),
                expand: 0,
            })
        }
        Some((name, digits)) => {
            if name.is_empty() || name.contains('&') {
                return Err(DirectiveError::DirectiveSyntax(format!(
                    "alternative {directive_index}: malformed field name in {token:?}"
                )));
            }
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DirectiveError::DirectiveSyntax(format!(
                    "alternative {directive_index}: '%' must be followed by digits, found {token:?}"
                )));
            }
            let expand = digits.parse::<u64>().unwrap_or(u64::MAX);
            Ok(Field {
                name: name.to_owned(),
                expand,
            })
        }
    }
}

fn parse_group(raw: &str, directive_index: usize) -> Result<Group, DirectiveError> {
    if raw.is_empty() {
        return Err(DirectiveError::DirectiveSyntax(format!(
            "alternative {directive_index}: empty group"
        )));
    }
    let (required, rest) = match raw.strip_prefix('&') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if rest.contains('&') {
        return Err(DirectiveError::DirectiveSyntax(format!(
            "alternative {directive_index}: '&' is only valid as the first character of a group, found in {raw:?}"
        )));
    }
    if rest.is_empty() {
        return Err(DirectiveError::DirectiveSyntax(format!(
            "alternative {directive_index}: group has '&' but no fields"
        )));
    }
    let fields = rest
        .split(',')
        .map(|tok| parse_field(tok, directive_index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Group { required, fields })
}

fn parse_alternative(directive: &str, directive_index: usize) -> Result<Alternative, DirectiveError> {
    let stripped = strip_whitespace(directive);
    let groups = stripped
        .split(';')
        .map(|raw| parse_group(raw, directive_index))
        .collect::<Result<Vec<_>, _>>()?;

    let mut max_expand: HashMap<&str, u64> = HashMap::new();
    for group in &groups {
        for field in &group.fields {
            let entry = max_expand.entry(field.name.as_str()).or_insert(0);
            if field.expand > *entry {
                *entry = field.expand;
            }
        }
    }

    let mut normalized = groups;
    for group in &mut normalized {
        for field in &mut group.fields {
            if let Some(&max) = max_expand.get(field.name.as_str()) {
                field.expand = max;
            }
        }
    }

    Ok(Alternative { groups: normalized })
}

/// Parses one or more directive strings into a normalized [`Plan`].
///
/// Each input string becomes one OR-combined alternative. Fails with
/// [`DirectiveError::DirectiveEmpty`] if `directives` is empty, or
/// [`DirectiveError::DirectiveSyntax`] on the first malformed alternative
/// encountered.
pub fn parse_directives<S: AsRef<str>>(directives: &[S]) -> Result<Plan, DirectiveError> {
    if directives.is_empty() {
        return Err(DirectiveError::DirectiveEmpty);
    }
    let alternatives = directives
        .iter()
        .enumerate()
        .map(|(i, d)| parse_alternative(d.as_ref(), i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Plan { alternatives })
}
