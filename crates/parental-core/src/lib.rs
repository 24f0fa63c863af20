//! Reconciliation core between `parental-api` and the CLI.
//!
//! - **[`Controller`]** runs one router session: a background task that
//!   polls the router, keeps the editable [`FormModel`] with its
//!   clean/dirty flag, and executes [`Command`]s one at a time.
//!   [`Controller::oneshot()`] loads once for a single CLI invocation.
//!
//! - **[`Session`]** is the pure state behind it. Refresh commits never
//!   overwrite unsaved edits unless forced.
//!
//! - **[`merge()`]** collapses per-source [`DiscoveryObservation`]s into
//!   one [`DiscoveredDevice`] per MAC.
//!
//! - **[`build()`]** turns the router's overview into a [`FormModel`];
//!   the `FormModel` edit methods keep group references consistent.
//!
//! - **[`ViewStream<T>`]** vends reactive snapshots of every view.

pub mod builder;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod integrity;
pub mod merge;
pub mod model;
pub mod session;
mod store;
pub mod stream;
pub mod usage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use builder::{build, slugify, to_save_payload, unique_id};
pub use command::{ActionOutcome, Command, CommandResult, FormEdit};
pub use config::{
    ControllerConfig, DEFAULT_ACTIVITY_LOG_LIMIT, DEFAULT_POLL_INTERVAL, TlsVerification,
};
pub use controller::Controller;
pub use error::CoreError;
pub use integrity::GroupPatch;
pub use merge::{DeviceMerger, merge};
pub use session::{CommitReport, ConnectionState, EditState, RefreshData, Session};
pub use stream::{ViewStream, ViewWatchStream};
pub use usage::{ClientUsage, UsageReport};

pub use model::{
    ActivityEntry, DiscoveredDevice, DiscoveryObservation, FormModel, GlobalKey, HealthCheck,
    HealthStatus, HealthView, MacAddress, ManagedClient, PolicyGroup,
};
