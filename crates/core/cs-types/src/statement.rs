//! Decomposed policy statements.

use serde::{Deserialize, Serialize};

/// One (service, action, resource, effect, policy-name) tuple.
///
/// Produced once per action of a policy document entry; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Service prefix, e.g. `s3`
    pub service: String,

    /// Action name, e.g. `GetObject` or `*`
    pub action: String,

    /// Resource the statement covers
    pub resource: String,

    /// `Allow` or `Deny`
    pub effect: String,

    /// Name of the managed or inline policy the statement came from
    pub policy_name: String,
}

/// Statement fields that can carry a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Service,
    Action,
    Resource,
    Effect,
    PolicyName,
}

impl Field {
    /// Column heading used in tabular output.
    pub fn heading(&self) -> &'static str {
        match self {
            Field::Service => "Service",
            Field::Action => "Action",
            Field::Resource => "Resource",
            Field::Effect => "Effect",
            Field::PolicyName => "Policy name",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.heading())
    }
}

impl Statement {
    /// Value of the given field.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Service => &self.service,
            Field::Action => &self.action,
            Field::Resource => &self.resource,
            Field::Effect => &self.effect,
            Field::PolicyName => &self.policy_name,
        }
    }

    /// Row in table column order.
    pub fn row(&self) -> [&str; 5] {
        [
            &self.service,
            &self.action,
            &self.resource,
            &self.effect,
            &self.policy_name,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_access() {
        let statement = Statement {
            service: "s3".to_string(),
            action: "GetObject".to_string(),
            resource: "*".to_string(),
            effect: "Allow".to_string(),
            policy_name: "AmazonS3ReadOnlyAccess".to_string(),
        };

        assert_eq!(statement.field(Field::Service), "s3");
        assert_eq!(statement.field(Field::PolicyName), "AmazonS3ReadOnlyAccess");
        assert_eq!(statement.row()[1], "GetObject");
        assert_eq!(Field::PolicyName.to_string(), "Policy name");
    }
}
