pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod storage;

// Re-export commonly used types
pub use config::{determine_data_paths, get_config_path, Config, ConfigError, DataPaths, StoreFiles};
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use models::{
    format_date, parse_reservation_number, validate_reservation_date, ParkingSpot, Payment, Place,
    Reservation, SpotHolder, SpotRecord, Tenant,
};
pub use repository::Repository;
pub use storage::{RecordLines, RecordStore};
