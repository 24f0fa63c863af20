// ── View store ──
//
// Watch channels for every view the session produces. The session task
// publishes after each command or refresh; subscribers only wake for
// views that actually changed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{ActivityEntry, DiscoveredDevice, FormModel, HealthView};
use crate::session::{ConnectionState, EditState, Session};
use crate::stream::ViewStream;
use crate::usage::UsageReport;

pub(crate) struct ViewStore {
    form: watch::Sender<Arc<FormModel>>,
    edit_state: watch::Sender<EditState>,
    discovered: watch::Sender<Arc<Vec<DiscoveredDevice>>>,
    health: watch::Sender<HealthView>,
    activity: watch::Sender<Arc<Vec<ActivityEntry>>>,
    usage: watch::Sender<Arc<UsageReport>>,
    connection: watch::Sender<ConnectionState>,
    last_overview_at: watch::Sender<Option<DateTime<Utc>>>,
}

impl ViewStore {
    pub(crate) fn new(session: &Session) -> Self {
        Self {
            form: watch::Sender::new(Arc::clone(session.form())),
            edit_state: watch::Sender::new(session.state()),
            discovered: watch::Sender::new(Arc::clone(session.discovered())),
            health: watch::Sender::new(session.health().clone()),
            activity: watch::Sender::new(Arc::clone(session.activity())),
            usage: watch::Sender::new(Arc::clone(session.usage())),
            connection: watch::Sender::new(session.connection().clone()),
            last_overview_at: watch::Sender::new(session.last_overview_at()),
        }
    }

    /// Push every view of `session` whose value differs from the last one
    /// published.
    pub(crate) fn publish(&self, session: &Session) {
        replace_arc(&self.form, session.form());
        replace_arc(&self.discovered, session.discovered());
        replace_arc(&self.activity, session.activity());
        replace_arc(&self.usage, session.usage());
        replace_value(&self.edit_state, session.state());
        replace_value(&self.health, session.health().clone());
        replace_value(&self.connection, session.connection().clone());
        replace_value(&self.last_overview_at, session.last_overview_at());
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub(crate) fn form_snapshot(&self) -> Arc<FormModel> {
        self.form.borrow().clone()
    }

    pub(crate) fn edit_state_snapshot(&self) -> EditState {
        *self.edit_state.borrow()
    }

    pub(crate) fn discovered_snapshot(&self) -> Arc<Vec<DiscoveredDevice>> {
        self.discovered.borrow().clone()
    }

    pub(crate) fn health_snapshot(&self) -> HealthView {
        self.health.borrow().clone()
    }

    pub(crate) fn activity_snapshot(&self) -> Arc<Vec<ActivityEntry>> {
        self.activity.borrow().clone()
    }

    pub(crate) fn usage_snapshot(&self) -> Arc<UsageReport> {
        self.usage.borrow().clone()
    }

    pub(crate) fn connection_snapshot(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    pub(crate) fn last_overview_at(&self) -> Option<DateTime<Utc>> {
        *self.last_overview_at.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub(crate) fn subscribe_form(&self) -> ViewStream<Arc<FormModel>> {
        ViewStream::new(self.form.subscribe())
    }

    pub(crate) fn subscribe_edit_state(&self) -> ViewStream<EditState> {
        ViewStream::new(self.edit_state.subscribe())
    }

    pub(crate) fn subscribe_discovered(&self) -> ViewStream<Arc<Vec<DiscoveredDevice>>> {
        ViewStream::new(self.discovered.subscribe())
    }

    pub(crate) fn subscribe_health(&self) -> ViewStream<HealthView> {
        ViewStream::new(self.health.subscribe())
    }

    pub(crate) fn subscribe_activity(&self) -> ViewStream<Arc<Vec<ActivityEntry>>> {
        ViewStream::new(self.activity.subscribe())
    }

    pub(crate) fn subscribe_usage(&self) -> ViewStream<Arc<UsageReport>> {
        ViewStream::new(self.usage.subscribe())
    }

    pub(crate) fn subscribe_connection(&self) -> ViewStream<ConnectionState> {
        ViewStream::new(self.connection.subscribe())
    }

    pub(crate) fn connection_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

fn replace_arc<T>(tx: &watch::Sender<Arc<T>>, next: &Arc<T>) {
    tx.send_if_modified(|current| {
        if Arc::ptr_eq(current, next) {
            false
        } else {
            *current = Arc::clone(next);
            true
        }
    });
}

fn replace_value<T: PartialEq>(tx: &watch::Sender<T>, next: T) {
    tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FormEdit;

    #[test]
    fn publish_only_wakes_changed_views() {
        let mut session = Session::init();
        let store = ViewStore::new(&session);
        let mut form_rx = store.form.subscribe();
        let health_rx = store.health.subscribe();

        store.publish(&session);
        assert!(!form_rx.has_changed().unwrap_or(true));

        session
            .edit(FormEdit::AddGroup {
                name: "Kids".into(),
            })
            .ok();
        store.publish(&session);

        assert!(form_rx.has_changed().unwrap_or(false));
        assert!(!health_rx.has_changed().unwrap_or(true));
        assert_eq!(store.edit_state_snapshot(), EditState::Dirty);
        assert_eq!(form_rx.borrow_and_update().groups.len(), 1);
    }
}
