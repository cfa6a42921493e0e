//! # larder-cache: Read Cache for Larder
//!
//! TTL cache for the read endpoints of the HTTP layer (reports, inventory,
//! movement listings).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  GET /api/locations/1/inventory                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReadCache::fetch ── KeyStrategy ──► "api:GET:/api/locations/1/..."    │
//! │       │                                                                 │
//! │       ├── fresh entry ──► HIT, value returned                          │
//! │       │                                                                 │
//! │       └── miss ──► loader (ReportService) ──► Ok stored, MISS          │
//! │                                                                         │
//! │  POST /api/inventory/sale                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerService (never reads through the cache)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  caller: cache.invalidate_prefix("api:GET:/api/locations/1/")          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`key`] - Request keys and key strategies
//! - [`cache`] - `TtlCache`, `ReadCache`, and the background sweeper

pub mod cache;
pub mod key;

pub use cache::{
    spawn_sweeper, CacheStats, CacheStatus, ReadCache, TtlCache, DEFAULT_SWEEP_INTERVAL,
    DEFAULT_TTL, MAX_SWEEP_INTERVAL,
};
pub use key::{DefaultKeyStrategy, KeyStrategy, PrefixedKeyStrategy, RequestKey};
