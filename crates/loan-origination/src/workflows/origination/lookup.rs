use serde::Serialize;

use super::domain::{Institution, LoanApplication, OriginationAgent};
use super::repository::{OriginationRepository, RepositoryError};

/// A stored application joined with its directory entries.
///
/// The joins are tolerant: a routing assignment or agent reference with no
/// matching directory row leaves the slot empty rather than failing the
/// read. Lookup is a reporting surface and never blocks on directory drift.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationBundle {
    pub application: LoanApplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<Institution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<OriginationAgent>,
}

pub fn assemble_bundle<R>(
    repository: &R,
    application: LoanApplication,
) -> Result<ApplicationBundle, RepositoryError>
where
    R: OriginationRepository + ?Sized,
{
    let institution = match &application.routing.assigned_institution {
        Some(code) => repository.institution(code)?,
        None => None,
    };
    let agent = match &application.content.originating_agent {
        Some(id) => repository.agent(id)?,
        None => None,
    };

    Ok(ApplicationBundle {
        application,
        institution,
        agent,
    })
}
