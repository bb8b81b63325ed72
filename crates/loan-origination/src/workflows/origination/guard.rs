use super::domain::LoanApplication;
use super::fields::{ApplicationField, FieldClass, FieldPatch};

/// Validation errors raised by the immutability guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImmutabilityViolation {
    #[error("field '{field}' is sealed and cannot change once the application is {status}")]
    ImmutableField {
        field: ApplicationField,
        status: &'static str,
    },
}

/// Guard enforcing the sealed-field table against inbound writes.
///
/// Drafts accept any patch. Once a record leaves `Draft` the guard admits
/// operational patches only; the first sealed-field patch rejects the whole
/// batch, so a batch is applied in full or not at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmutabilityGuard;

impl ImmutabilityGuard {
    pub fn admit(
        &self,
        record: &LoanApplication,
        patches: &[FieldPatch],
    ) -> Result<(), ImmutabilityViolation> {
        if !record.status.content_locked() {
            return Ok(());
        }

        for patch in patches {
            let field = patch.field();
            if field.classification() == FieldClass::Sealed {
                return Err(ImmutabilityViolation::ImmutableField {
                    field,
                    status: record.status.label(),
                });
            }
        }

        Ok(())
    }
}
