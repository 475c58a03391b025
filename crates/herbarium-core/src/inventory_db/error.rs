//! Store failures classified into messages an admin can act on.

use sqlx::error::ErrorKind;
use thiserror::Error;

use super::types::PlantId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    AlreadyExists(&'static str),
    #[error("Permission denied. Check database access policies.")]
    PermissionDenied,
    #[error("Table not found. Please run database migrations.")]
    MissingTable,
    #[error("{0}")]
    Constraint(String),
    #[error("Selected category does not exist.")]
    UnknownReference,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

/// Field message for a named CHECK constraint.
fn check_message(msg: &str) -> Option<&'static str> {
    const CHECKS: &[(&str, &str)] = &[
        ("chk_quantity_nonnegative", "Quantity cannot be negative."),
        ("chk_minimum_stock_nonnegative", "Minimum stock cannot be negative."),
        ("chk_unit_price_nonnegative", "Unit price cannot be negative."),
        ("chk_sku_length", "SKU is too long (maximum 50 characters)."),
        ("chk_common_name_present", "Common name is required."),
    ];
    CHECKS
        .iter()
        .find(|(name, _)| msg.contains(name))
        .map(|(_, text)| *text)
}

impl StoreError {
    /// Map a sqlx error to a user-facing classification.
    pub fn from_sqlx(err: &sqlx::Error) -> StoreError {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record".to_string()),
            sqlx::Error::Database(db) => {
                let msg = db.message();
                match db.kind() {
                    ErrorKind::UniqueViolation => {
                        if msg.contains("categories.") {
                            StoreError::AlreadyExists("Category already exists.")
                        } else if msg.contains("users.") {
                            StoreError::AlreadyExists("An admin with this email already exists.")
                        } else {
                            StoreError::AlreadyExists("A plant with this name or SKU already exists.")
                        }
                    }
                    ErrorKind::ForeignKeyViolation => StoreError::UnknownReference,
                    ErrorKind::CheckViolation => match check_message(msg) {
                        Some(text) => StoreError::Constraint(text.to_string()),
                        None => StoreError::Constraint(msg.to_string()),
                    },
                    _ if msg.contains("no such table") => StoreError::MissingTable,
                    _ if msg.contains("readonly") || msg.contains("not authorized") => {
                        StoreError::PermissionDenied
                    }
                    _ => StoreError::Other(msg.to_string()),
                }
            }
            other => StoreError::Other(other.to_string()),
        }
    }

    /// Find a store failure anywhere in an error chain.
    ///
    /// Returns `None` when the chain holds neither a `StoreError` nor a `sqlx::Error`.
    pub fn classify(err: &anyhow::Error) -> Option<StoreError> {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<StoreError>() {
                return Some(e.clone());
            }
            if let Some(e) = cause.downcast_ref::<sqlx::Error>() {
                return Some(StoreError::from_sqlx(e));
            }
        }
        None
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }
}

/// Rejected stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustError {
    #[error("plant {0} not found")]
    PlantNotFound(PlantId),
    #[error("quantity change must not be zero")]
    ZeroChange,
    #[error("adjustment would make quantity negative ({current} {change:+})")]
    NegativeResult { current: i64, change: i64 },
    #[error("adjustment is out of range ({current} {change:+})")]
    OutOfRange { current: i64, change: i64 },
}
