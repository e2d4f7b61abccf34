//! Decomposition of policy documents into statements.
//!
//! A document entry such as
//!
//! ```json
//! { "Effect": "Allow", "Action": ["s3:GetObject", "s3:PutObject"], "Resource": "*" }
//! ```
//!
//! yields one [`Statement`] per action. `Action` and `Resource` may each be a
//! string or a list; a resource list is joined with `", "`.

use cs_error::PolicyError;
use cs_types::Statement;
use serde::Deserialize;
use tracing::warn;

/// A string or a list of strings, as IAM allows for `Action` and `Resource`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Statements {
    One(serde_json::Value),
    Many(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "Statement")]
    statement: Statements,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "Effect")]
    effect: String,

    #[serde(rename = "Action")]
    action: OneOrMany,

    #[serde(rename = "Resource")]
    resource: OneOrMany,
}

/// Split `service:action` into its two parts.
///
/// Exactly one `:` with text on both sides is required; anything else is
/// [`PolicyError::MalformedAction`].
pub fn split_action(action: &str) -> Result<(&str, &str), PolicyError> {
    match action.split_once(':') {
        Some((service, name)) if !service.is_empty() && !name.is_empty() && !name.contains(':') => {
            Ok((service, name))
        }
        _ => Err(PolicyError::MalformedAction(action.to_string())),
    }
}

/// Statements of one document, and the parts of it that could not be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    /// One statement per well-formed action, in document order
    pub statements: Vec<Statement>,

    /// Entries and actions that were left out, in document order
    pub skipped: Vec<PolicyError>,
}

/// Decompose a JSON policy document into statements.
///
/// A document that is not valid JSON, or has no `Statement`, is an error.
/// An entry that cannot be read (missing members, `NotAction`) is skipped as
/// a whole; a malformed action string skips only that action, and its
/// siblings are kept. Every skip is logged and returned in
/// [`Decomposition::skipped`].
pub fn decompose_document(document: &str, policy_name: &str) -> Result<Decomposition, PolicyError> {
    let parsed: Document = serde_json::from_str(document).map_err(|e| PolicyError::MalformedDocument {
        policy: policy_name.to_string(),
        reason: e.to_string(),
    })?;

    let entries = match parsed.statement {
        Statements::One(entry) => vec![entry],
        Statements::Many(entries) => entries,
    };

    let mut decomposition = Decomposition::default();
    for entry in entries {
        if let Err(e) = decompose_entry(entry, policy_name, &mut decomposition) {
            warn!(policy = policy_name, error = %e, "Statement is skipped");
            decomposition.skipped.push(e);
        }
    }

    Ok(decomposition)
}

fn decompose_entry(
    entry: serde_json::Value,
    policy_name: &str,
    decomposition: &mut Decomposition,
) -> Result<(), PolicyError> {
    let entry: Entry = serde_json::from_value(entry).map_err(|e| PolicyError::MalformedStatement {
        policy: policy_name.to_string(),
        reason: e.to_string(),
    })?;

    let resource = entry.resource.into_vec().join(", ");

    for action in entry.action.into_vec() {
        match split_action(&action) {
            Ok((service, name)) => decomposition.statements.push(Statement {
                service: service.to_string(),
                action: name.to_string(),
                resource: resource.clone(),
                effect: entry.effect.clone(),
                policy_name: policy_name.to_string(),
            }),
            Err(e) => {
                warn!(policy = policy_name, error = %e, "Action is skipped");
                decomposition.skipped.push(e);
            }
        }
    }

    Ok(())
}
