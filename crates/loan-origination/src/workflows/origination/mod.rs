//! Loan application origination: intake, transaction id issue, integrity
//! sealing, and sealed-record lookup.
//!
//! A record crosses one gate. Drafts are freely editable; submission draws
//! the date-encoded transaction id, seals the content under a digest, and
//! stamps both onto the record in a single write. Past the gate the sealed
//! fields refuse every edit, operational routing fields stay writable, and
//! verification exposes out-of-band tampering without ever repairing it.

pub mod allocator;
pub mod codec;
pub mod domain;
pub mod fields;
pub mod guard;
pub mod lookup;
pub mod repository;
pub mod router;
pub mod seal;
pub mod service;

#[cfg(test)]
mod tests;

pub use allocator::{AllocationError, IdAllocator};
pub use codec::{DateToken, IdFormatError, TransactionId};
pub use domain::{
    AgentId, ApplicationContent, ApplicationId, ApplicationStatus, ApplicationView,
    BorrowerProfile, Institution, InstitutionCode, LoanApplication, LoanProduct, LoanTerms,
    OriginationAgent, RoutingState, SubmissionChannel,
};
pub use fields::{ApplicationField, FieldClass, FieldPatch, ReviewDisposition};
pub use guard::{ImmutabilityGuard, ImmutabilityViolation};
pub use lookup::ApplicationBundle;
pub use repository::{
    AuditError, AuditEvent, AuditEventKind, AuditPublisher, OriginationRepository,
    RepositoryError, SubmissionCommit,
};
pub use router::origination_router;
pub use seal::{IntegrityReport, IntegritySeal, IntegritySealer, SealError, SEAL_SCHEME};
pub use service::{OriginationError, OriginationService, SubmissionReceipt};
