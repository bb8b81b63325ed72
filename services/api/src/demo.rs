use crate::infra::{seeded_repository, InMemoryAuditPublisher};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use loan_origination::error::AppError;
use loan_origination::workflows::origination::{
    AgentId, ApplicationContent, BorrowerProfile, FieldPatch, InstitutionCode, LoanProduct,
    LoanTerms, OriginationError, OriginationService, ReviewDisposition, SubmissionChannel,
    SubmissionReceipt, TransactionId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Acceptance date for the demo submissions (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) accepted_on: Option<NaiveDate>,
    /// How many applications to submit while showing the daily sequence climb.
    #[arg(long, default_value_t = 3)]
    pub(crate) submissions: u32,
    /// Skip the storage tampering portion of the demo.
    #[arg(long)]
    pub(crate) skip_tamper: bool,
}

#[derive(Args, Debug)]
pub(crate) struct IdInspectArgs {
    /// Transaction id in raw ("2501210007") or display ("250121-0007") form
    pub(crate) reference: String,
}

pub(crate) fn run_id_inspect(args: IdInspectArgs) -> Result<(), AppError> {
    let transaction_id =
        TransactionId::parse(&args.reference).map_err(OriginationError::from)?;

    println!("Transaction id {}", transaction_id.display());
    println!("- raw form:     {}", transaction_id.raw());
    println!("- display form: {}", transaction_id.display());
    println!("- date token:   {}", transaction_id.date_token());
    println!("- sequence:     {}", transaction_id.sequence());

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        accepted_on,
        submissions,
        skip_tamper,
    } = args;

    let accepted_on = accepted_on.unwrap_or_else(|| Local::now().date_naive());
    let accepted_at = acceptance_instant(accepted_on);
    let submissions = submissions.max(1);

    println!("Loan origination demo");
    println!("Acceptance date: {accepted_on}");

    let repository = Arc::new(seeded_repository());
    let audit = Arc::new(InMemoryAuditPublisher::default());
    let service = Arc::new(OriginationService::new(repository.clone(), audit.clone()));

    println!("\nDraft intake");
    let draft = match service.open_draft(demo_content(0)) {
        Ok(draft) => draft,
        Err(err) => {
            println!("  Draft rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- Opened application {} -> status {}",
        draft.application_id.0,
        draft.status.label()
    );

    match service.apply_updates(
        &draft.application_id,
        vec![FieldPatch::Principal(255_000)],
    ) {
        Ok(updated) => println!(
            "- Draft edit accepted: principal now {}",
            updated.content.terms.principal
        ),
        Err(err) => println!("- Draft edit refused: {err}"),
    }

    println!("\nSubmission and sealing");
    let receipt = match service.submit_at(&draft.application_id, accepted_at) {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Submission failed: {err}");
            return Ok(());
        }
    };
    render_receipt(&receipt);

    let mut issued = vec![receipt.transaction_id];
    for offset in 1..submissions {
        let extra = match service.open_draft(demo_content(offset)) {
            Ok(extra) => extra,
            Err(err) => {
                println!("  Draft rejected: {err}");
                break;
            }
        };
        match service.submit_at(&extra.application_id, accepted_at) {
            Ok(extra_receipt) => {
                println!("- Issued {}", extra_receipt.display_id);
                issued.push(extra_receipt.transaction_id);
            }
            Err(err) => println!("- Submission failed: {err}"),
        }
    }
    if let Some(last) = issued.last() {
        println!(
            "- Daily capacity used: {} of 9999 for token {}",
            last.sequence(),
            last.date_token()
        );
    }

    println!("\nImmutability after sealing");
    match service.submit_at(&draft.application_id, accepted_at) {
        Err(OriginationError::AlreadySealed { display_id, .. }) => {
            println!("- Resubmission refused, {display_id} stands");
        }
        Err(err) => println!("- Resubmission refused: {err}"),
        Ok(duplicate) => println!("- Unexpected duplicate receipt {}", duplicate.display_id),
    }

    match service.apply_updates(
        &draft.application_id,
        vec![FieldPatch::Principal(1_000_000)],
    ) {
        Err(err) => println!("- Sealed field edit refused: {err}"),
        Ok(_) => println!("- Unexpected edit acceptance on a sealed record"),
    }

    match service.apply_updates(
        &draft.application_id,
        vec![
            FieldPatch::AssignedInstitution(Some(InstitutionCode("FSB-014".to_string()))),
            FieldPatch::AssignedReviewer(Some("j.whitfield".to_string())),
            FieldPatch::Status(ReviewDisposition::UnderReview),
        ],
    ) {
        Ok(updated) => println!(
            "- Operational routing accepted -> status {}",
            updated.status.label()
        ),
        Err(err) => println!("- Operational routing refused: {err}"),
    }

    println!("\nIntegrity verification");
    match service.verify_integrity(&draft.application_id) {
        Ok(report) => println!("- Seal check after routing: valid = {}", report.valid),
        Err(err) => println!("- Verification unavailable: {err}"),
    }

    if !skip_tamper {
        repository.corrupt(&draft.application_id, |record| {
            record.content.terms.principal = 9_999_999;
        });
        println!("- Simulated storage corruption: principal rewritten behind the service");
        match service.verify_integrity(&draft.application_id) {
            Ok(report) => {
                println!("- Seal check after corruption: valid = {}", report.valid);
                println!("    recorded  {}", report.recorded_hash);
                println!("    computed  {}", report.computed_hash);
                println!("- Record left exactly as found for investigators");
            }
            Err(err) => println!("- Verification unavailable: {err}"),
        }
    }

    println!("\nSealed-record lookup");
    match service.lookup(&receipt.display_id) {
        Ok(Some(bundle)) => match serde_json::to_string_pretty(&bundle) {
            Ok(json) => println!("- Bundle for {}:\n{json}", receipt.display_id),
            Err(err) => println!("- Bundle unavailable: {err}"),
        },
        Ok(None) => println!("- No record behind {}", receipt.display_id),
        Err(err) => println!("- Lookup failed: {err}"),
    }

    let events = audit.events();
    if events.is_empty() {
        println!("\nAudit trail: no events recorded");
    } else {
        println!("\nAudit trail");
        for event in events {
            println!("- {} on {}", event.kind.label(), event.application_id.0);
            for (key, value) in &event.details {
                println!("    {key}: {value}");
            }
        }
    }

    Ok(())
}

fn render_receipt(receipt: &SubmissionReceipt) {
    println!(
        "- Application {} sealed at {}",
        receipt.application_id.0, receipt.sealed_at
    );
    println!("  Transaction id: {} (raw {})", receipt.display_id, receipt.transaction_id.raw());
    println!("  Seal digest:    {}", receipt.seal_hash);
}

fn demo_content(offset: u32) -> ApplicationContent {
    ApplicationContent {
        borrower: BorrowerProfile {
            legal_name: "Marcus Webb".to_string(),
            national_id: "302-55-8146".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1984, 6, 30).unwrap_or_default(),
            contact_email: "m.webb@example.com".to_string(),
            gross_monthly_income: 6_100,
        },
        terms: LoanTerms {
            product: LoanProduct::Mortgage,
            principal: 240_000 + u64::from(offset) * 5_000,
            term_months: 360,
            annual_rate_bps: 612,
            purpose: "Primary residence purchase".to_string(),
        },
        channel: SubmissionChannel::Online,
        originating_agent: Some(AgentId("ag-117".to_string())),
    }
}

fn acceptance_instant(accepted_on: NaiveDate) -> DateTime<Utc> {
    let midafternoon = accepted_on
        .and_hms_opt(15, 30, 0)
        .unwrap_or_else(|| accepted_on.and_time(chrono::NaiveTime::MIN));
    Utc.from_utc_datetime(&midafternoon)
}
