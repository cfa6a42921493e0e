//! # larder-ledger: Ledger Operations and Reports
//!
//! The operations that change stock, and the reports that read it back.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           larder-ledger                                 │
//! │                                                                         │
//! │  ┌───────────────────┐  ┌───────────────────┐  ┌───────────────────┐   │
//! │  │   ledger.rs       │  │   reporting.rs    │  │   config.rs       │   │
//! │  │                   │  │                   │  │                   │   │
//! │  │ accept_delivery   │  │ inventory_moves   │  │ larder.toml       │   │
//! │  │ sell_item         │  │ report_summary    │  │ LARDER_* env      │   │
//! │  │ take_stock        │  │ current_inventory │  │ validation        │   │
//! │  │                   │  │ reconcile         │  │                   │   │
//! │  └─────────┬─────────┘  └─────────┬─────────┘  └───────────────────┘   │
//! │            │ one transaction      │ no locks                            │
//! │            ▼                      ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 larder-db repositories                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  error.rs      LedgerError + ErrorKind codes                            │
//! │  telemetry.rs  tracing-subscriber setup                                 │
//! │  clock.rs      movement timestamps                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = LarderConfig::load(None)?;
//! telemetry::init_tracing(&config.logging);
//!
//! let db = Database::new(config.database.to_db_config()).await?;
//! let ledger = LedgerService::new(db.clone(), config.ledger.clone());
//! let reports = ReportService::new(db);
//!
//! ledger.sell_item(&SaleRequest::recipe(location, staff, recipe, 1)).await?;
//! let summary = reports.report_summary(location, &MovementFilter::all()).await?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reporting;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, LarderConfig, LedgerSettings};
pub use error::{ErrorBody, ErrorKind, LedgerError, LedgerResult};
pub use ledger::{DeliveryRequest, LedgerService, SaleRequest, SaleTarget, StockCountRequest};
pub use reporting::ReportService;
