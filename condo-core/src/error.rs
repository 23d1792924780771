//! Error types for store and domain operations

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the line-oriented record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record {key} has {fields} fields, cannot update field {index}")]
    FieldOutOfRange {
        key: u32,
        index: usize,
        fields: usize,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound { path }
        } else {
            StoreError::Io { path, source }
        }
    }
}

/// Validation and lookup failures surfaced to the operator
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid place '{0}'. Use GRILL, HALL or POOL (PARRILLA, SUM, PILETA)")]
    UnknownPlace(String),

    #[error("Invalid date '{0}'. Use the format dd/mm/yyyy")]
    InvalidDate(String),

    #[error("Reservation date {0} is before today")]
    DateInPast(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Reservation numbers exhausted")]
    ReservationNumbersExhausted,

    #[error("No reservation found with number {0}")]
    ReservationNotFound(u32),

    #[error("Tenant {tenant} has no parking spot assigned")]
    NoParkingSpot { tenant: String },

    #[error("No tenant found with national id {0}")]
    TenantNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type DomainResult<T> = Result<T, DomainError>;
