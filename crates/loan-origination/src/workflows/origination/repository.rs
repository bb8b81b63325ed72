use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::codec::{DateToken, TransactionId};
use super::domain::{
    AgentId, ApplicationContent, ApplicationId, Institution, InstitutionCode, LoanApplication,
    OriginationAgent,
};
use super::seal::IntegritySeal;

/// Everything submission stamps onto a draft in one write.
///
/// `content` is the exact snapshot the seal digest covers; the commit must
/// refuse to land on a record whose stored content has drifted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionCommit {
    pub transaction_id: TransactionId,
    pub seal: IntegritySeal,
    pub content: ApplicationContent,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations own three hard guarantees. `next_sequence` hands out
/// each value for a date token at most once, even under concurrent callers;
/// a caller that crashes after drawing a value leaves a gap, never a reuse.
/// `update` refuses to alter the content, transaction id, or seal of a
/// record that already carries a seal. `commit_submission` refuses to land
/// a seal on content that drifted after the digest was computed. Together
/// the last two keep every stored seal matching the stored content.
pub trait OriginationRepository: Send + Sync {
    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    fn update(&self, record: LoanApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LoanApplication>, RepositoryError>;

    /// Draws the next sequence value for `date_token`. Values start at 1 and
    /// only ever grow; the repository persists the draw before returning it.
    fn next_sequence(&self, date_token: DateToken) -> Result<u32, RepositoryError>;

    /// Stamps `{Submitted, transaction id, seal}` onto the stored record in
    /// a single atomic write. Fails with [`RepositoryError::Conflict`],
    /// without touching the record, when it is already sealed or when its
    /// stored content no longer equals `commit.content`; the second case is
    /// a draft edit that landed after the seal digest was computed.
    fn commit_submission(
        &self,
        id: &ApplicationId,
        commit: SubmissionCommit,
    ) -> Result<LoanApplication, RepositoryError>;

    fn institution(&self, code: &InstitutionCode) -> Result<Option<Institution>, RepositoryError>;
    fn agent(&self, id: &AgentId) -> Result<Option<OriginationAgent>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or is sealed against this write")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound audit hooks (e.g., compliance log adapters).
pub trait AuditPublisher: Send + Sync {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Integrity-relevant occurrences recorded outside the primary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    TamperDetected,
    AlreadySealed,
    ImmutableFieldViolation,
    CapacityExceeded,
}

impl AuditEventKind {
    pub const fn label(self) -> &'static str {
        match self {
            AuditEventKind::TamperDetected => "tamper_detected",
            AuditEventKind::AlreadySealed => "already_sealed",
            AuditEventKind::ImmutableFieldViolation => "immutable_field_violation",
            AuditEventKind::CapacityExceeded => "capacity_exceeded",
        }
    }
}

/// Audit payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

/// Audit dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}
