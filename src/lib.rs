pub mod config;
pub mod dnssec;
pub mod error;
pub mod record;
pub mod service;
pub mod store;

pub use config::SigningConfig;
pub use error::{DnssecError, Result};
pub use record::{RecordClass, RecordType, ResourceRecord};
pub use service::DnssecService;
pub use store::{DomainDirectory, RecordStore, ZoneId};
