//! Policy enumeration run: fetch documents, decompose, filter.

use cs_collector::Phase;
use cs_error::CsError;
use cs_traits::PolicySource;
use cs_types::Statement;
use tracing::{debug, info, warn};

use crate::decompose::decompose_document;
use crate::filter::{FilterOutcome, PredicateSet, RuleFilter};

/// Everything a policy enumeration produced.
#[derive(Debug, Clone)]
pub struct PolicyReport {
    /// Role whose policies were enumerated
    pub role: String,

    /// Policy documents retrieved (managed first, then inline)
    pub documents: usize,

    /// Statements decomposed from all documents, before filtering
    pub statements: usize,

    /// Documents, statements and actions left out, with the reason
    pub skipped: Vec<String>,

    /// Filter result to present
    pub outcome: FilterOutcome,
}

impl PolicyReport {
    /// Statements to present, in document order.
    pub fn rows(&self) -> impl Iterator<Item = &Statement> {
        self.outcome.included.iter().map(|i| &i.statement)
    }
}

/// Enumerate the managed and inline policies of `role` and filter their
/// statements with `predicates`.
///
/// Patterns are compiled before anything is fetched. A document, statement or
/// action that cannot be decomposed is skipped and listed in
/// [`PolicyReport::skipped`]; a failed retrieval ends the run.
pub async fn run_policies<S>(source: &S, role: &str, predicates: &PredicateSet) -> Result<PolicyReport, CsError>
where
    S: PolicySource + ?Sized,
{
    let filter = RuleFilter::new(predicates)?;

    debug!(phase = %Phase::Fetch, role, "Entering phase");
    info!(role, "Enumerating role policies...");

    let mut documents = source.managed_policies(role).await?;
    documents.extend(source.inline_policies(role).await?);

    let mut statements = Vec::new();
    let mut skipped = Vec::new();
    for document in &documents {
        match decompose_document(&document.document, &document.policy_name) {
            Ok(decomposed) => {
                statements.extend(decomposed.statements);
                skipped.extend(
                    decomposed
                        .skipped
                        .iter()
                        .map(|e| format!("{}: {}", document.policy_name, e)),
                );
            }
            Err(e) => {
                warn!(policy = %document.policy_name, error = %e, "Policy is skipped");
                skipped.push(e.to_string());
            }
        }
    }

    let outcome = filter.evaluate(&statements);
    info!(
        documents = documents.len(),
        statements = statements.len(),
        shown = outcome.included.len(),
        fail_open = outcome.fail_open,
        "Policies enumerated"
    );

    Ok(PolicyReport {
        role: role.to_string(),
        documents: documents.len(),
        statements: statements.len(),
        skipped,
        outcome,
    })
}
