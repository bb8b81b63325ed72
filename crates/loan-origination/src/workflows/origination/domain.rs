use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::codec::TransactionId;
use super::seal::IntegritySeal;

/// Identifier wrapper for application records in storage.
///
/// This is the repository key, distinct from the [`TransactionId`] a record
/// earns at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for partner institutions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstitutionCode(pub String);

/// Identifier wrapper for licensed origination agents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for InstitutionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant data captured at intake; sealed content once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub legal_name: String,
    pub national_id: String,
    pub date_of_birth: NaiveDate,
    pub contact_email: String,
    pub gross_monthly_income: u32,
}

/// Loan product requested by the borrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanProduct {
    Personal,
    Auto,
    Mortgage,
    SmallBusiness,
}

/// Requested terms; sealed content once submitted.
///
/// The rate is kept in basis points so the sealed byte representation never
/// depends on floating point formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub product: LoanProduct,
    pub principal: u64,
    pub term_months: u16,
    pub annual_rate_bps: u16,
    pub purpose: String,
}

/// Channel the application arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionChannel {
    Branch,
    Online,
    BrokerReferral,
}

/// The full set of fields covered by the integrity seal.
///
/// Everything in here is writable while the application is in `Draft` and
/// frozen from the moment it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContent {
    pub borrower: BorrowerProfile,
    pub terms: LoanTerms,
    pub channel: SubmissionChannel,
    pub originating_agent: Option<AgentId>,
}

/// High level status tracked throughout the application lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// True once the record has passed submission and its content is frozen.
    pub const fn content_locked(self) -> bool {
        !matches!(self, ApplicationStatus::Draft)
    }
}

/// Assignment and review metadata that keeps changing after submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingState {
    pub assigned_institution: Option<InstitutionCode>,
    pub assigned_reviewer: Option<String>,
    pub review_started_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Repository record for one loan application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub application_id: ApplicationId,
    pub content: ApplicationContent,
    pub status: ApplicationStatus,
    pub transaction_id: Option<TransactionId>,
    pub seal: Option<IntegritySeal>,
    pub routing: RoutingState,
}

impl LoanApplication {
    /// Opens a fresh record in `Draft` with no id, seal, or routing yet.
    pub fn draft(application_id: ApplicationId, content: ApplicationContent) -> Self {
        Self {
            application_id,
            content,
            status: ApplicationStatus::Draft,
            transaction_id: None,
            seal: None,
            routing: RoutingState::default(),
        }
    }

    pub fn status_view(&self) -> ApplicationView {
        ApplicationView {
            application_id: self.application_id.clone(),
            status: self.status.label(),
            transaction_id: self.transaction_id.as_ref().map(TransactionId::raw),
            display_id: self.transaction_id.as_ref().map(TransactionId::display),
            seal_hash: self.seal.as_ref().map(|seal| seal.hash.clone()),
            sealed_at: self.seal.as_ref().map(|seal| seal.sealed_at),
        }
    }
}

/// Partner institution an application can be routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub code: InstitutionCode,
    pub name: String,
    pub branch_city: String,
}

/// Licensed agent who originated the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginationAgent {
    pub id: AgentId,
    pub name: String,
    pub nmls_id: String,
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sealed_at: Option<DateTime<Utc>>,
}
