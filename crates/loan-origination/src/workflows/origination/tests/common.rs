use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::origination::codec::DateToken;
use crate::workflows::origination::domain::{
    AgentId, ApplicationContent, ApplicationId, ApplicationStatus, BorrowerProfile, Institution,
    InstitutionCode, LoanApplication, LoanProduct, LoanTerms, OriginationAgent, SubmissionChannel,
};
use crate::workflows::origination::repository::{
    AuditError, AuditEvent, AuditPublisher, OriginationRepository, RepositoryError,
    SubmissionCommit,
};
use crate::workflows::origination::{origination_router, OriginationService, TransactionId};

pub(super) fn borrower() -> BorrowerProfile {
    BorrowerProfile {
        legal_name: "Maria Ramos".to_string(),
        national_id: "481-20-7734".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12).expect("valid date"),
        contact_email: "maria.ramos@example.com".to_string(),
        gross_monthly_income: 7_200,
    }
}

pub(super) fn terms() -> LoanTerms {
    LoanTerms {
        product: LoanProduct::Auto,
        principal: 28_500,
        term_months: 60,
        annual_rate_bps: 649,
        purpose: "Used vehicle purchase".to_string(),
    }
}

pub(super) fn content() -> ApplicationContent {
    ApplicationContent {
        borrower: borrower(),
        terms: terms(),
        channel: SubmissionChannel::Branch,
        originating_agent: Some(AgentId("ag-204".to_string())),
    }
}

/// Acceptance instant used across the suite; its date token is `250121`.
pub(super) fn acceptance_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 21, 15, 30, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn acceptance_token() -> DateToken {
    DateToken::from_date(NaiveDate::from_ymd_opt(2025, 1, 21).expect("valid date"))
}

pub(super) fn draft_record(suffix: &str) -> LoanApplication {
    LoanApplication::draft(ApplicationId(format!("ln-test-{suffix}")), content())
}

pub(super) fn build_service() -> (
    OriginationService<MemoryRepository, MemoryAudit>,
    Arc<MemoryRepository>,
    Arc<MemoryAudit>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = OriginationService::new(repository.clone(), audit.clone());
    (service, repository, audit)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, LoanApplication>>>,
    counters: Arc<Mutex<HashMap<DateToken, u32>>>,
    institutions: Arc<Mutex<HashMap<InstitutionCode, Institution>>>,
    agents: Arc<Mutex<HashMap<AgentId, OriginationAgent>>>,
}

impl MemoryRepository {
    /// Moves a date counter forward so capacity tests need not draw
    /// thousands of values.
    pub(super) fn set_sequence(&self, date_token: DateToken, value: u32) {
        let mut counters = self.counters.lock().expect("counter mutex poisoned");
        counters.insert(date_token, value);
    }

    pub(super) fn seed_institution(&self, institution: Institution) {
        let mut institutions = self.institutions.lock().expect("directory mutex poisoned");
        institutions.insert(institution.code.clone(), institution);
    }

    pub(super) fn seed_agent(&self, agent: OriginationAgent) {
        let mut agents = self.agents.lock().expect("directory mutex poisoned");
        agents.insert(agent.id.clone(), agent);
    }

    /// Rewrites a stored record directly, bypassing the seal protection the
    /// trait impl enforces. Stands in for out-of-band storage tampering.
    pub(super) fn tamper(&self, id: &ApplicationId, mutate: impl FnOnce(&mut LoanApplication)) {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        let record = records.get_mut(id).expect("record present");
        mutate(record);
    }
}

impl OriginationRepository for MemoryRepository {
    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        if records.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: LoanApplication) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        let existing = records
            .get(&record.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if existing.seal.is_some()
            && (record.content != existing.content
                || record.transaction_id != existing.transaction_id
                || record.seal != existing.seal)
        {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.application_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records
            .values()
            .find(|record| record.transaction_id.as_ref() == Some(transaction_id))
            .cloned())
    }

    fn next_sequence(&self, date_token: DateToken) -> Result<u32, RepositoryError> {
        let mut counters = self.counters.lock().expect("counter mutex poisoned");
        let entry = counters.entry(date_token).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    fn commit_submission(
        &self,
        id: &ApplicationId,
        commit: SubmissionCommit,
    ) -> Result<LoanApplication, RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.transaction_id.is_some()
            || record.seal.is_some()
            || record.content != commit.content
        {
            return Err(RepositoryError::Conflict);
        }
        record.status = ApplicationStatus::Submitted;
        record.transaction_id = Some(commit.transaction_id);
        record.seal = Some(commit.seal);
        Ok(record.clone())
    }

    fn institution(&self, code: &InstitutionCode) -> Result<Option<Institution>, RepositoryError> {
        let institutions = self.institutions.lock().expect("directory mutex poisoned");
        Ok(institutions.get(code).cloned())
    }

    fn agent(&self, id: &AgentId) -> Result<Option<OriginationAgent>, RepositoryError> {
        let agents = self.agents.lock().expect("directory mutex poisoned");
        Ok(agents.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAudit {
    pub(super) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditPublisher for MemoryAudit {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl OriginationRepository for UnavailableRepository {
    fn insert(&self, _record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: LoanApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_transaction_id(
        &self,
        _transaction_id: &TransactionId,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn next_sequence(&self, _date_token: DateToken) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_submission(
        &self,
        _id: &ApplicationId,
        _commit: SubmissionCommit,
    ) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn institution(
        &self,
        _code: &InstitutionCode,
    ) -> Result<Option<Institution>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn agent(&self, _id: &AgentId) -> Result<Option<OriginationAgent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn origination_router_with_service(
    service: OriginationService<MemoryRepository, MemoryAudit>,
) -> axum::Router {
    origination_router(Arc::new(service))
}
