use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::allocator::{AllocationError, IdAllocator};
use super::codec::{IdFormatError, TransactionId};
use super::domain::{ApplicationContent, ApplicationId, LoanApplication};
use super::fields::FieldPatch;
use super::guard::{ImmutabilityGuard, ImmutabilityViolation};
use super::lookup::{assemble_bundle, ApplicationBundle};
use super::repository::{
    AuditError, AuditEvent, AuditEventKind, AuditPublisher, OriginationRepository, RepositoryError,
    SubmissionCommit,
};
use super::seal::{IntegrityReport, IntegritySealer, SealError};

/// Service composing the allocator, sealer, immutability guard, and storage.
pub struct OriginationService<R, A> {
    guard: ImmutabilityGuard,
    allocator: IdAllocator,
    sealer: IntegritySealer,
    repository: Arc<R>,
    audit: Arc<A>,
}

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("ln-{id:06}"))
}

/// Receipt returned when a draft is accepted for processing.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub transaction_id: TransactionId,
    pub display_id: String,
    pub seal_hash: String,
    pub sealed_at: DateTime<Utc>,
}

impl<R, A> OriginationService<R, A>
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self {
            guard: ImmutabilityGuard::default(),
            allocator: IdAllocator::default(),
            sealer: IntegritySealer::default(),
            repository,
            audit,
        }
    }

    /// Open a new draft, returning the repository-backed record.
    pub fn open_draft(
        &self,
        content: ApplicationContent,
    ) -> Result<LoanApplication, OriginationError> {
        let record = LoanApplication::draft(next_application_id(), content);
        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Apply a batch of field patches under the sealed-field table.
    ///
    /// The batch is all-or-nothing: one sealed-field patch against a locked
    /// record rejects the whole batch and leaves storage untouched.
    pub fn apply_updates(
        &self,
        application_id: &ApplicationId,
        patches: Vec<FieldPatch>,
    ) -> Result<LoanApplication, OriginationError> {
        let mut record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Err(violation) = self.guard.admit(&record, &patches) {
            let ImmutabilityViolation::ImmutableField { field, .. } = &violation;
            let mut details = BTreeMap::new();
            details.insert("field".to_string(), field.label().to_string());
            details.insert("status".to_string(), record.status.label().to_string());
            self.audit.publish(AuditEvent {
                kind: AuditEventKind::ImmutableFieldViolation,
                application_id: application_id.clone(),
                details,
            })?;
            return Err(violation.into());
        }

        for patch in patches {
            patch.apply(&mut record);
        }

        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Accept a draft for processing: allocate its transaction id, seal the
    /// content, and stamp both onto the record in one write.
    pub fn submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<SubmissionReceipt, OriginationError> {
        self.submit_at(application_id, Utc::now())
    }

    /// Submission with an explicit acceptance instant. The instant's date
    /// drives the transaction id's date token.
    pub fn submit_at(
        &self,
        application_id: &ApplicationId,
        accepted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, OriginationError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(existing) = record.transaction_id {
            return self.refuse_resubmission(application_id, existing.display());
        }

        let transaction_id = match self
            .allocator
            .allocate(self.repository.as_ref(), accepted_at.date_naive())
        {
            Ok(id) => id,
            Err(AllocationError::CapacityExceeded { date_token, max }) => {
                tracing::warn!(%date_token, max, "transaction id capacity exhausted");
                let mut details = BTreeMap::new();
                details.insert("date_token".to_string(), date_token.to_string());
                details.insert("max".to_string(), max.to_string());
                self.audit.publish(AuditEvent {
                    kind: AuditEventKind::CapacityExceeded,
                    application_id: application_id.clone(),
                    details,
                })?;
                return Err(AllocationError::CapacityExceeded { date_token, max }.into());
            }
            Err(other) => return Err(other.into()),
        };

        let seal = self.sealer.seal(&record.content, accepted_at)?;
        let receipt = SubmissionReceipt {
            application_id: record.application_id.clone(),
            transaction_id,
            display_id: transaction_id.display(),
            seal_hash: seal.hash.clone(),
            sealed_at: seal.sealed_at,
        };

        match self.repository.commit_submission(
            application_id,
            SubmissionCommit {
                transaction_id,
                seal,
                content: record.content,
            },
        ) {
            Ok(_) => {}
            Err(RepositoryError::Conflict) => {
                // Either a racing submission won, or a draft edit landed
                // after the digest was computed. The sequence value drawn
                // here stays burned as a gap in both cases.
                let current = self
                    .repository
                    .fetch(application_id)?
                    .ok_or(RepositoryError::NotFound)?;
                return match current.transaction_id {
                    Some(existing) => {
                        self.refuse_resubmission(application_id, existing.display())
                    }
                    None => Err(RepositoryError::Conflict.into()),
                };
            }
            Err(other) => return Err(other.into()),
        }

        tracing::info!(
            application_id = %receipt.application_id,
            transaction_id = %receipt.display_id,
            "application sealed"
        );
        Ok(receipt)
    }

    /// Recompute the digest for a sealed record and compare it to the
    /// stored seal. A mismatch is reported and audited, never repaired.
    pub fn verify_integrity(
        &self,
        application_id: &ApplicationId,
    ) -> Result<IntegrityReport, OriginationError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        let seal = record.seal.as_ref().ok_or_else(|| OriginationError::NotSealed {
            application_id: application_id.clone(),
        })?;

        let report = self.sealer.verify(&record.content, seal)?;
        if !report.valid {
            tracing::error!(
                application_id = %record.application_id,
                recorded_hash = %report.recorded_hash,
                computed_hash = %report.computed_hash,
                "integrity seal mismatch"
            );
            let mut details = BTreeMap::new();
            details.insert("recorded_hash".to_string(), report.recorded_hash.clone());
            details.insert("computed_hash".to_string(), report.computed_hash.clone());
            if let Some(transaction_id) = record.transaction_id {
                details.insert("transaction_id".to_string(), transaction_id.display());
            }
            self.audit.publish(AuditEvent {
                kind: AuditEventKind::TamperDetected,
                application_id: application_id.clone(),
                details,
            })?;
        }

        Ok(report)
    }

    /// Resolve a transaction id reference in raw or display form.
    ///
    /// `Ok(None)` is the ordinary no-match outcome; only a malformed
    /// reference is an error.
    pub fn lookup(&self, reference: &str) -> Result<Option<ApplicationBundle>, OriginationError> {
        let transaction_id = TransactionId::parse(reference)?;
        let record = match self.repository.find_by_transaction_id(&transaction_id)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let bundle = assemble_bundle(self.repository.as_ref(), record)?;
        Ok(Some(bundle))
    }

    /// Fetch an application with its directory joins for API responses.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationBundle, OriginationError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(assemble_bundle(self.repository.as_ref(), record)?)
    }

    fn refuse_resubmission(
        &self,
        application_id: &ApplicationId,
        display_id: String,
    ) -> Result<SubmissionReceipt, OriginationError> {
        let mut details = BTreeMap::new();
        details.insert("transaction_id".to_string(), display_id.clone());
        self.audit.publish(AuditEvent {
            kind: AuditEventKind::AlreadySealed,
            application_id: application_id.clone(),
            details,
        })?;
        Err(OriginationError::AlreadySealed {
            application_id: application_id.clone(),
            display_id,
        })
    }
}

/// Error raised by the origination service.
#[derive(Debug, thiserror::Error)]
pub enum OriginationError {
    #[error(transparent)]
    Immutability(#[from] ImmutabilityViolation),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Seal(#[from] SealError),
    #[error(transparent)]
    Format(#[from] IdFormatError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error("application '{application_id}' is already sealed under transaction id {display_id}")]
    AlreadySealed {
        application_id: ApplicationId,
        display_id: String,
    },
    #[error("application '{application_id}' has no integrity seal to verify")]
    NotSealed { application_id: ApplicationId },
}
