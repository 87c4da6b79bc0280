//! Workforce availability and allocation reconciliation engine.
//!
//! Matches declared staffing needs (required headcount per skill, site and
//! date range) against real people who may be absent, past contract end,
//! committed elsewhere, or based at another site. The engine classifies —
//! it never optimizes: a human picks from the plan, and the committer
//! executes the choice.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Resource`, `CompetencyGrant`,
//!   `NeedPeriod`, `Assignment`, `Absence`, `Transfer`, `DateRange`,
//!   `Coverage`
//! - **`calendar`**: Business-day collaborator contract and date bucketing
//! - **`availability`**: Per-day availability classification (priority chain)
//! - **`conflict`**: Cross-assignment conflict detection
//! - **`coverage`**: Need consolidation and coverage computation
//! - **`planner`**: Candidate bucketing for a batch of need periods
//! - **`committer`**: Batch execution of an approved plan, including
//!   automatic cross-site transfers
//! - **`grid`**: Three-layer reconciliation of the editable allocation grid
//! - **`store`**: Persistence collaborator contract and in-memory test store
//! - **`error`**: Failure taxonomy
//!
//! # Architecture
//!
//! Classification, planning and coverage are pure functions over facts read
//! from the store; only the committer writes, one independent call per step
//! — there is no transaction spanning a batch (see `committer` for the
//! failure semantics). Presentation concerns (screens, timers, toasts) live
//! entirely outside this crate.

pub mod availability;
pub mod calendar;
pub mod committer;
pub mod conflict;
pub mod coverage;
pub mod error;
pub mod grid;
pub mod models;
pub mod planner;
pub mod store;
