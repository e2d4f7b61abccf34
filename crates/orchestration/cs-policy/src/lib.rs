//! cs-policy - role policy enumeration and rule filtering.
//!
//! This crate provides:
//! - [`decompose_document`] - turns a JSON policy document into [`cs_types::Statement`]s
//! - [`RuleFilter`] - the ordered, short-circuiting predicate engine
//! - [`IamPolicySource`] - retrieval of managed and inline role policies
//! - [`run_policies`] - fetch, decompose and filter in one call

pub mod decompose;
pub mod filter;
pub mod iam;
pub mod run;

pub use decompose::{Decomposition, decompose_document, split_action};
pub use filter::{
    EVALUATION_ORDER, FilterOutcome, Inclusion, PRIVILEGED_SERVICES, PredicateSet, RuleFilter, filter,
};
pub use iam::{IamPolicySource, instance_role};
pub use run::{PolicyReport, run_policies};
