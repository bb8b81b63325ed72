//! Static classification of writable application fields.
//!
//! Every write travels as a [`FieldPatch`]; every patch names the
//! [`ApplicationField`] it touches, and the field carries a fixed
//! SEALED/OPERATIONAL classification. The guard consults this table instead
//! of inspecting record shapes at runtime. The transaction id and the seal
//! itself have no patch variants, which is what makes them write-once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AgentId, ApplicationStatus, InstitutionCode, LoanApplication, LoanProduct, SubmissionChannel,
};

/// Whether a field is frozen by submission or stays writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldClass {
    Sealed,
    Operational,
}

/// Every field a write request can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationField {
    BorrowerLegalName,
    BorrowerNationalId,
    BorrowerDateOfBirth,
    BorrowerContactEmail,
    BorrowerMonthlyIncome,
    LoanProduct,
    Principal,
    TermMonths,
    AnnualRateBps,
    LoanPurpose,
    SubmissionChannel,
    OriginatingAgent,
    Status,
    AssignedInstitution,
    AssignedReviewer,
    ReviewStartedAt,
    DecidedAt,
}

impl ApplicationField {
    /// The static SEALED/OPERATIONAL table.
    pub const fn classification(self) -> FieldClass {
        match self {
            ApplicationField::BorrowerLegalName
            | ApplicationField::BorrowerNationalId
            | ApplicationField::BorrowerDateOfBirth
            | ApplicationField::BorrowerContactEmail
            | ApplicationField::BorrowerMonthlyIncome
            | ApplicationField::LoanProduct
            | ApplicationField::Principal
            | ApplicationField::TermMonths
            | ApplicationField::AnnualRateBps
            | ApplicationField::LoanPurpose
            | ApplicationField::SubmissionChannel
            | ApplicationField::OriginatingAgent => FieldClass::Sealed,
            ApplicationField::Status
            | ApplicationField::AssignedInstitution
            | ApplicationField::AssignedReviewer
            | ApplicationField::ReviewStartedAt
            | ApplicationField::DecidedAt => FieldClass::Operational,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationField::BorrowerLegalName => "borrower_legal_name",
            ApplicationField::BorrowerNationalId => "borrower_national_id",
            ApplicationField::BorrowerDateOfBirth => "borrower_date_of_birth",
            ApplicationField::BorrowerContactEmail => "borrower_contact_email",
            ApplicationField::BorrowerMonthlyIncome => "borrower_monthly_income",
            ApplicationField::LoanProduct => "loan_product",
            ApplicationField::Principal => "principal",
            ApplicationField::TermMonths => "term_months",
            ApplicationField::AnnualRateBps => "annual_rate_bps",
            ApplicationField::LoanPurpose => "loan_purpose",
            ApplicationField::SubmissionChannel => "submission_channel",
            ApplicationField::OriginatingAgent => "originating_agent",
            ApplicationField::Status => "status",
            ApplicationField::AssignedInstitution => "assigned_institution",
            ApplicationField::AssignedReviewer => "assigned_reviewer",
            ApplicationField::ReviewStartedAt => "review_started_at",
            ApplicationField::DecidedAt => "decided_at",
        }
    }
}

impl std::fmt::Display for ApplicationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-submission review statuses a patch may set.
///
/// `Draft` and `Submitted` are deliberately unrepresentable here: the only
/// way into `Submitted` is the atomic allocate-and-seal commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDisposition {
    UnderReview,
    Approved,
    Rejected,
}

impl ReviewDisposition {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            ReviewDisposition::UnderReview => ApplicationStatus::UnderReview,
            ReviewDisposition::Approved => ApplicationStatus::Approved,
            ReviewDisposition::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// One typed write to a single application field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPatch {
    BorrowerLegalName(String),
    BorrowerNationalId(String),
    BorrowerDateOfBirth(NaiveDate),
    BorrowerContactEmail(String),
    BorrowerMonthlyIncome(u32),
    LoanProduct(LoanProduct),
    Principal(u64),
    TermMonths(u16),
    AnnualRateBps(u16),
    LoanPurpose(String),
    SubmissionChannel(SubmissionChannel),
    OriginatingAgent(Option<AgentId>),
    Status(ReviewDisposition),
    AssignedInstitution(Option<InstitutionCode>),
    AssignedReviewer(Option<String>),
    ReviewStartedAt(Option<DateTime<Utc>>),
    DecidedAt(Option<DateTime<Utc>>),
}

impl FieldPatch {
    pub const fn field(&self) -> ApplicationField {
        match self {
            FieldPatch::BorrowerLegalName(_) => ApplicationField::BorrowerLegalName,
            FieldPatch::BorrowerNationalId(_) => ApplicationField::BorrowerNationalId,
            FieldPatch::BorrowerDateOfBirth(_) => ApplicationField::BorrowerDateOfBirth,
            FieldPatch::BorrowerContactEmail(_) => ApplicationField::BorrowerContactEmail,
            FieldPatch::BorrowerMonthlyIncome(_) => ApplicationField::BorrowerMonthlyIncome,
            FieldPatch::LoanProduct(_) => ApplicationField::LoanProduct,
            FieldPatch::Principal(_) => ApplicationField::Principal,
            FieldPatch::TermMonths(_) => ApplicationField::TermMonths,
            FieldPatch::AnnualRateBps(_) => ApplicationField::AnnualRateBps,
            FieldPatch::LoanPurpose(_) => ApplicationField::LoanPurpose,
            FieldPatch::SubmissionChannel(_) => ApplicationField::SubmissionChannel,
            FieldPatch::OriginatingAgent(_) => ApplicationField::OriginatingAgent,
            FieldPatch::Status(_) => ApplicationField::Status,
            FieldPatch::AssignedInstitution(_) => ApplicationField::AssignedInstitution,
            FieldPatch::AssignedReviewer(_) => ApplicationField::AssignedReviewer,
            FieldPatch::ReviewStartedAt(_) => ApplicationField::ReviewStartedAt,
            FieldPatch::DecidedAt(_) => ApplicationField::DecidedAt,
        }
    }

    /// Writes the patched value into the record.
    pub(crate) fn apply(self, record: &mut LoanApplication) {
        match self {
            FieldPatch::BorrowerLegalName(value) => record.content.borrower.legal_name = value,
            FieldPatch::BorrowerNationalId(value) => record.content.borrower.national_id = value,
            FieldPatch::BorrowerDateOfBirth(value) => {
                record.content.borrower.date_of_birth = value;
            }
            FieldPatch::BorrowerContactEmail(value) => {
                record.content.borrower.contact_email = value;
            }
            FieldPatch::BorrowerMonthlyIncome(value) => {
                record.content.borrower.gross_monthly_income = value;
            }
            FieldPatch::LoanProduct(value) => record.content.terms.product = value,
            FieldPatch::Principal(value) => record.content.terms.principal = value,
            FieldPatch::TermMonths(value) => record.content.terms.term_months = value,
            FieldPatch::AnnualRateBps(value) => record.content.terms.annual_rate_bps = value,
            FieldPatch::LoanPurpose(value) => record.content.terms.purpose = value,
            FieldPatch::SubmissionChannel(value) => record.content.channel = value,
            FieldPatch::OriginatingAgent(value) => record.content.originating_agent = value,
            FieldPatch::Status(value) => record.status = value.status(),
            FieldPatch::AssignedInstitution(value) => {
                record.routing.assigned_institution = value;
            }
            FieldPatch::AssignedReviewer(value) => record.routing.assigned_reviewer = value,
            FieldPatch::ReviewStartedAt(value) => record.routing.review_started_at = value,
            FieldPatch::DecidedAt(value) => record.routing.decided_at = value,
        }
    }
}
