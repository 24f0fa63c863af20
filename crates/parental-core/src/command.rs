// ── Command API ──
//
// Every mutation and remote action flows through `Command`. The
// controller's session task processes them one at a time.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::integrity::GroupPatch;
use crate::model::MacAddress;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Local edits of the form model. Each one marks the session dirty when
/// it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    SetGlobal {
        key: String,
        value: String,
    },

    // ── Groups ───────────────────────────────────────────────────────
    AddGroup {
        name: String,
    },
    RenameGroup {
        id: String,
        new_id: String,
    },
    UpdateGroup {
        id: String,
        patch: GroupPatch,
    },
    RemoveGroup {
        id: String,
    },

    // ── Clients ──────────────────────────────────────────────────────
    AddClient {
        mac: MacAddress,
        name: String,
        group: String,
    },
    /// Manage a discovered device; its hostname becomes the client name.
    PromoteDevice {
        mac: MacAddress,
        group: String,
    },
    UpdateClient {
        mac: MacAddress,
        name: Option<String>,
    },
    AssignClient {
        mac: MacAddress,
        group: String,
    },
    RemoveClient {
        mac: MacAddress,
    },
}

/// All operations against a controller session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(FormEdit),

    // ── Session control ──────────────────────────────────────────────
    /// Fetch fresh data. `force` discards unsaved edits.
    Refresh {
        force: bool,
    },
    /// Persist the form model, then reload it from the router.
    Save,

    // ── Client actions ───────────────────────────────────────────────
    PauseClient {
        mac: MacAddress,
        minutes: u32,
    },
    BlockClient {
        mac: MacAddress,
    },
    UnblockClient {
        mac: MacAddress,
    },

    // ── Group actions (fan out to every member) ──────────────────────
    PauseGroup {
        group: String,
        minutes: u32,
    },
    BlockGroup {
        group: String,
    },
    UnblockGroup {
        group: String,
    },

    // ── Router-wide actions ──────────────────────────────────────────
    SyncExternalFilter,
    ApplyRules,
}

impl From<FormEdit> for Command {
    fn from(edit: FormEdit) -> Self {
        Self::Edit(edit)
    }
}

/// Result of a successfully processed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    GroupCreated(String),
    /// The identifier actually assigned.
    GroupRenamed(String),
    Refreshed {
        form_replaced: bool,
    },
    Saved,
    /// Per-client outcome of a group action.
    Batch(Vec<ActionOutcome>),
}

/// Outcome of one remote call within a group action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub mac: MacAddress,
    pub error: Option<String>,
}

impl ActionOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
