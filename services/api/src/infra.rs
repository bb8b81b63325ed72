use chrono::NaiveDate;
use loan_origination::workflows::origination::{
    AgentId, ApplicationId, ApplicationStatus, AuditError, AuditEvent, AuditPublisher, DateToken,
    Institution, InstitutionCode, LoanApplication, OriginationAgent, OriginationRepository,
    RepositoryError, SubmissionCommit, TransactionId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOriginationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, LoanApplication>>>,
    counters: Arc<Mutex<HashMap<DateToken, u32>>>,
    institutions: Arc<Mutex<HashMap<InstitutionCode, Institution>>>,
    agents: Arc<Mutex<HashMap<AgentId, OriginationAgent>>>,
}

impl InMemoryOriginationRepository {
    pub(crate) fn seed_institution(&self, institution: Institution) {
        let mut guard = self.institutions.lock().expect("directory mutex poisoned");
        guard.insert(institution.code.clone(), institution);
    }

    pub(crate) fn seed_agent(&self, agent: OriginationAgent) {
        let mut guard = self.agents.lock().expect("directory mutex poisoned");
        guard.insert(agent.id.clone(), agent);
    }

    /// Rewrites a stored record behind the trait, bypassing the sealed-write
    /// refusal. Exists only so the demo can stage storage-level tampering.
    pub(crate) fn corrupt(&self, id: &ApplicationId, mutate: impl FnOnce(&mut LoanApplication)) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(record) = guard.get_mut(id) {
            mutate(record);
        }
    }
}

impl OriginationRepository for InMemoryOriginationRepository {
    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: LoanApplication) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let existing = guard
            .get(&record.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if existing.seal.is_some()
            && (record.content != existing.content
                || record.transaction_id != existing.transaction_id
                || record.seal != existing.seal)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.transaction_id.as_ref() == Some(transaction_id))
            .cloned())
    }

    fn next_sequence(&self, date_token: DateToken) -> Result<u32, RepositoryError> {
        let mut guard = self.counters.lock().expect("counter mutex poisoned");
        let entry = guard.entry(date_token).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    fn commit_submission(
        &self,
        id: &ApplicationId,
        commit: SubmissionCommit,
    ) -> Result<LoanApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
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
        let guard = self.institutions.lock().expect("directory mutex poisoned");
        Ok(guard.get(code).cloned())
    }

    fn agent(&self, id: &AgentId) -> Result<Option<OriginationAgent>, RepositoryError> {
        let guard = self.agents.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditPublisher {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl AuditPublisher for InMemoryAuditPublisher {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut guard = self.events.lock().expect("audit mutex poisoned");
        guard.push(event);
        Ok(())
    }
}

impl InMemoryAuditPublisher {
    pub(crate) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

/// Repository pre-loaded with the partner directory rows the lookup joins
/// expect until the real directory service is wired in.
pub(crate) fn seeded_repository() -> InMemoryOriginationRepository {
    let repository = InMemoryOriginationRepository::default();
    repository.seed_institution(Institution {
        code: InstitutionCode("FSB-014".to_string()),
        name: "First State Bank".to_string(),
        branch_city: "Cedar Rapids".to_string(),
    });
    repository.seed_institution(Institution {
        code: InstitutionCode("MWCU-022".to_string()),
        name: "Midwest Community Credit Union".to_string(),
        branch_city: "Des Moines".to_string(),
    });
    repository.seed_agent(OriginationAgent {
        id: AgentId("ag-117".to_string()),
        name: "Priya Natarajan".to_string(),
        nmls_id: "2241078".to_string(),
    });
    repository.seed_agent(OriginationAgent {
        id: AgentId("ag-204".to_string()),
        name: "Elena Ramirez".to_string(),
        nmls_id: "1203944".to_string(),
    });
    repository
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
