//! Rule filter engine for decomposed policy statements.
//!
//! Each statement is checked against the supplied predicates in a fixed order:
//! service, resource, effect, policy name, action. The first predicate that is
//! present and matches includes the statement and the rest are not evaluated,
//! so predicates combine as OR, not AND. The field that caused the inclusion
//! is reported with the statement.
//!
//! The action check has one extra rule: a `*` action on a privileged service
//! matches any action predicate.
//!
//! If no predicate matched any statement, the whole input is returned. This is
//! decided once for the full statement list.
//!
//! Patterns are regular expressions anchored at the start of the value but
//! not at the end, so `Get` matches `GetObject`. A pattern that is not a valid
//! regular expression, such as a lone `*`, is matched literally.
//!
//! # Example
//!
//! ```
//! use cs_policy::{PredicateSet, RuleFilter};
//! use cs_types::{Field, Statement};
//!
//! let statement = |service: &str, action: &str| Statement {
//!     service: service.to_string(),
//!     action: action.to_string(),
//!     resource: "*".to_string(),
//!     effect: "Allow".to_string(),
//!     policy_name: "Inline".to_string(),
//! };
//! let statements = vec![statement("s3", "GetObject"), statement("s3", "PutObject")];
//!
//! let filter = RuleFilter::new(&PredicateSet::new().with_action("Get*")).unwrap();
//! let outcome = filter.evaluate(&statements);
//!
//! assert!(!outcome.fail_open);
//! assert_eq!(outcome.included.len(), 1);
//! assert_eq!(outcome.included[0].statement.action, "GetObject");
//! assert_eq!(outcome.included[0].matched_by, Some(Field::Action));
//! ```

use cs_error::PolicyError;
use cs_types::{Field, Statement};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Services whose `*` action matches any action predicate.
pub const PRIVILEGED_SERVICES: &[&str] = &["iam", "s3", "dynamodb", "lambda"];

/// Order in which predicates are evaluated.
pub const EVALUATION_ORDER: [Field; 5] = [
    Field::Service,
    Field::Resource,
    Field::Effect,
    Field::PolicyName,
    Field::Action,
];

/// Optional per-field filter patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSet {
    pub service: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub effect: Option<String>,
    pub policy_name: Option<String>,
}

impl PredicateSet {
    /// Create an empty predicate set, which lets every statement through.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, pattern: impl Into<String>) -> Self {
        self.service = Some(pattern.into());
        self
    }

    pub fn with_action(mut self, pattern: impl Into<String>) -> Self {
        self.action = Some(pattern.into());
        self
    }

    pub fn with_resource(mut self, pattern: impl Into<String>) -> Self {
        self.resource = Some(pattern.into());
        self
    }

    pub fn with_effect(mut self, pattern: impl Into<String>) -> Self {
        self.effect = Some(pattern.into());
        self
    }

    pub fn with_policy_name(mut self, pattern: impl Into<String>) -> Self {
        self.policy_name = Some(pattern.into());
        self
    }

    /// Pattern for `field`, if one was supplied.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Service => self.service.as_deref(),
            Field::Action => self.action.as_deref(),
            Field::Resource => self.resource.as_deref(),
            Field::Effect => self.effect.as_deref(),
            Field::PolicyName => self.policy_name.as_deref(),
        }
    }

    /// Whether no predicate was supplied.
    pub fn is_empty(&self) -> bool {
        EVALUATION_ORDER.iter().all(|field| self.get(*field).is_none())
    }
}

#[derive(Debug, Clone)]
struct Predicate {
    field: Field,
    regex: Regex,
}

impl Predicate {
    fn matches(&self, statement: &Statement) -> bool {
        let value = statement.field(self.field);
        if self.regex.is_match(value) {
            return true;
        }

        self.field == Field::Action
            && value == "*"
            && PRIVILEGED_SERVICES.contains(&statement.service.as_str())
    }
}

/// A statement that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    pub statement: Statement,

    /// Predicate field that included the statement; `None` when the result
    /// fell open
    pub matched_by: Option<Field>,
}

/// Result of filtering a statement list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Included statements, in input order
    pub included: Vec<Inclusion>,

    /// Whether no predicate matched and every statement was returned
    pub fail_open: bool,
}

impl FilterOutcome {
    /// The included statements, without match details.
    pub fn into_statements(self) -> Vec<Statement> {
        self.included.into_iter().map(|i| i.statement).collect()
    }
}

/// Compiled predicate set.
#[derive(Debug, Clone)]
pub struct RuleFilter {
    predicates: Vec<Predicate>,
}

impl RuleFilter {
    /// Compile the predicates of `set` in evaluation order.
    pub fn new(set: &PredicateSet) -> Result<Self, PolicyError> {
        let predicates = EVALUATION_ORDER
            .iter()
            .filter_map(|field| set.get(*field).map(|pattern| (*field, pattern)))
            .map(|(field, pattern)| {
                Ok(Predicate {
                    field,
                    regex: compile(field, pattern)?,
                })
            })
            .collect::<Result<Vec<_>, PolicyError>>()?;

        Ok(Self { predicates })
    }

    /// Field of the first predicate that includes `statement`.
    pub fn matched_by(&self, statement: &Statement) -> Option<Field> {
        self.predicates
            .iter()
            .find(|predicate| predicate.matches(statement))
            .map(|predicate| predicate.field)
    }

    /// Filter `statements`, falling open when nothing matched.
    pub fn evaluate(&self, statements: &[Statement]) -> FilterOutcome {
        let included: Vec<Inclusion> = statements
            .iter()
            .filter_map(|statement| {
                self.matched_by(statement).map(|field| Inclusion {
                    statement: statement.clone(),
                    matched_by: Some(field),
                })
            })
            .collect();

        if !included.is_empty() {
            debug!(
                statements = statements.len(),
                included = included.len(),
                "Filtered statements"
            );
            return FilterOutcome {
                included,
                fail_open: false,
            };
        }

        if !self.predicates.is_empty() {
            debug!(statements = statements.len(), "No predicate matched, showing every statement");
        }

        FilterOutcome {
            included: statements
                .iter()
                .map(|statement| Inclusion {
                    statement: statement.clone(),
                    matched_by: None,
                })
                .collect(),
            fail_open: true,
        }
    }
}

/// Filter `statements` with `predicates`.
pub fn filter(statements: &[Statement], predicates: &PredicateSet) -> Result<Vec<Statement>, PolicyError> {
    Ok(RuleFilter::new(predicates)?.evaluate(statements).into_statements())
}

/// Compile `pattern` anchored at the start of the field.
///
/// Only a pattern that compiles on its own is wrapped in the anchoring group;
/// anything else is matched literally.
fn compile(field: Field, pattern: &str) -> Result<Regex, PolicyError> {
    let anchored = match Regex::new(pattern) {
        Ok(_) => format!("^(?:{pattern})"),
        Err(e) => {
            warn!(
                field = %field,
                pattern,
                error = %e,
                "Pattern is not a valid regular expression, matching it literally"
            );
            format!("^{}", regex::escape(pattern))
        }
    };

    Regex::new(&anchored).map_err(|e| PolicyError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(service: &str, action: &str, resource: &str, effect: &str, policy: &str) -> Statement {
        Statement {
            service: service.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            effect: effect.to_string(),
            policy_name: policy.to_string(),
        }
    }

    fn sample() -> Vec<Statement> {
        vec![
            statement("s3", "GetObject", "arn:aws:s3:::audit/*", "Allow", "AmazonS3ReadOnlyAccess"),
            statement("s3", "PutObject", "arn:aws:s3:::audit/*", "Allow", "AuditWriter"),
            statement("iam", "*", "*", "Allow", "AdminInline"),
            statement("ec2", "DescribeInstances", "*", "Deny", "AuditWriter"),
        ]
    }

    #[test]
    fn test_empty_predicates_are_identity() {
        let statements = sample();

        let outcome = RuleFilter::new(&PredicateSet::new()).unwrap().evaluate(&statements);

        assert!(outcome.fail_open);
        assert_eq!(outcome.into_statements(), statements);
        assert_eq!(filter(&statements, &PredicateSet::new()).unwrap(), statements);
    }

    #[test]
    fn test_unmatched_predicate_falls_open() {
        let statements = vec![
            statement("ec2", "DescribeInstances", "*", "Allow", "ReadOnly"),
            statement("sqs", "SendMessage", "*", "Allow", "ReadOnly"),
        ];

        let result = filter(&statements, &PredicateSet::new().with_service("s3")).unwrap();

        assert_eq!(result, statements);
    }

    #[test]
    fn test_action_prefix() {
        let result = filter(&sample(), &PredicateSet::new().with_action("Get*")).unwrap();

        let actions: Vec<&str> = result.iter().map(|s| s.action.as_str()).collect();
        // iam:* comes in through the privileged wildcard rule
        assert_eq!(actions, vec!["GetObject", "*"]);
    }

    #[test]
    fn test_privileged_wildcard() {
        let statements = vec![
            statement("iam", "*", "*", "Allow", "Admin"),
            statement("ec2", "*", "*", "Allow", "Admin"),
            statement("sqs", "ListQueues", "*", "Allow", "Admin"),
        ];

        let outcome = RuleFilter::new(&PredicateSet::new().with_action("Describe"))
            .unwrap()
            .evaluate(&statements);

        assert!(!outcome.fail_open);
        assert_eq!(outcome.included.len(), 1);
        assert_eq!(outcome.included[0].statement.service, "iam");
        assert_eq!(outcome.included[0].matched_by, Some(Field::Action));
    }

    #[test]
    fn test_first_matching_field_is_reported() {
        let predicates = PredicateSet::new()
            .with_action("Put")
            .with_service("s3")
            .with_effect("Deny");

        let outcome = RuleFilter::new(&predicates).unwrap().evaluate(&sample());

        let matched: Vec<(&str, Option<Field>)> = outcome
            .included
            .iter()
            .map(|i| (i.statement.action.as_str(), i.matched_by))
            .collect();
        assert_eq!(
            matched,
            vec![
                ("GetObject", Some(Field::Service)),
                ("PutObject", Some(Field::Service)),
                ("*", Some(Field::Action)),
                ("DescribeInstances", Some(Field::Effect)),
            ]
        );
    }

    #[test]
    fn test_predicates_combine_as_or() {
        // Neither predicate alone covers both statements
        let predicates = PredicateSet::new().with_service("ec2").with_policy_name("^Amazon");

        let result = filter(&sample(), &predicates).unwrap();

        let actions: Vec<&str> = result.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["GetObject", "DescribeInstances"]);
    }

    #[test]
    fn test_match_is_anchored_at_start_only() {
        let statements = vec![
            statement("s3", "GetObject", "*", "Allow", "A"),
            statement("s3", "BatchGetItem", "*", "Allow", "A"),
        ];

        let result = filter(&statements, &PredicateSet::new().with_action("Get")).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].action, "GetObject");
    }

    #[test]
    fn test_literal_star_pattern() {
        let statements = vec![
            statement("ec2", "DescribeInstances", "*", "Allow", "A"),
            statement("ec2", "StartInstances", "arn:aws:ec2:::instance/i-1", "Allow", "A"),
        ];

        let outcome = RuleFilter::new(&PredicateSet::new().with_resource("*"))
            .unwrap()
            .evaluate(&statements);

        assert!(!outcome.fail_open);
        assert_eq!(outcome.included.len(), 1);
        assert_eq!(outcome.included[0].statement.action, "DescribeInstances");
        assert_eq!(outcome.included[0].matched_by, Some(Field::Resource));
    }

    #[test]
    fn test_unbalanced_pattern_cannot_escape_anchor() {
        let statements = vec![
            statement("s3", "b", "*", "Allow", "A"),
            statement("s3", "a)|(bc", "*", "Allow", "A"),
        ];

        let outcome = RuleFilter::new(&PredicateSet::new().with_action("a)|(b"))
            .unwrap()
            .evaluate(&statements);

        assert!(!outcome.fail_open);
        assert_eq!(outcome.included.len(), 1);
        assert_eq!(outcome.included[0].statement.action, "a)|(bc");
    }

    #[test]
    fn test_evaluate_does_not_touch_input() {
        let statements = sample();
        let before = statements.clone();

        let _ = RuleFilter::new(&PredicateSet::new().with_service("s3"))
            .unwrap()
            .evaluate(&statements);

        assert_eq!(statements, before);
    }

    #[test]
    fn test_predicate_set_is_empty() {
        assert!(PredicateSet::new().is_empty());
        assert!(!PredicateSet::new().with_effect("Allow").is_empty());
    }
}
