//! Presence registry.
//!
//! Owns the `UserId -> ConnectionHandle` table of this process. One handle of
//! record per user: a new handshake replaces the previous handle. Going offline
//! is deferred by a grace period so that a page refresh (disconnect followed by
//! a quick reconnect) never shows the user as offline to others.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    domain::UserId,
    infrastructure::dto::websocket::{PresenceStatus, ServerEvent, UserStatusPayload},
};

use super::connection::{ConnectionHandle, ConnectionId, encode};

/// Default delay before an `offline` status is broadcast
pub const DEFAULT_OFFLINE_GRACE: Duration = Duration::from_secs(5);

struct PendingOffline {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct PresenceTable {
    handles: HashMap<UserId, ConnectionHandle>,
    pending_offline: HashMap<UserId, PendingOffline>,
    /// Users whose client already announced going offline
    announced_offline: HashSet<UserId>,
    next_generation: u64,
}

impl PresenceTable {
    fn all_handles(&self) -> Vec<ConnectionHandle> {
        self.handles.values().cloned().collect()
    }
}

/// Result of registering a connection
#[derive(Debug)]
pub struct ConnectOutcome {
    /// The previous handle of record, if the user was already connected
    pub replaced: Option<ConnectionHandle>,
    /// Whether a pending offline broadcast was cancelled
    pub resumed_within_grace: bool,
}

/// Result of unregistering a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The connection was the user's handle of record; offline is scheduled
    OfflineScheduled(UserId),
    /// The user had already announced going offline; nothing is scheduled
    AlreadyAnnounced(UserId),
    /// The connection was not (or no longer) a handle of record
    NotRegistered,
}

pub struct PresenceRegistry {
    table: Mutex<PresenceTable>,
    offline_grace: Duration,
}

impl PresenceRegistry {
    pub fn new(offline_grace: Duration) -> Self {
        Self {
            table: Mutex::new(PresenceTable::default()),
            offline_grace,
        }
    }

    /// Register `handle` as the handle of record for `user` and broadcast
    /// `online` to every connection, including the new one.
    pub async fn connect(&self, user: &UserId, handle: ConnectionHandle) -> ConnectOutcome {
        let (outcome, targets) = {
            let mut table = self.table.lock().await;
            let resumed_within_grace = match table.pending_offline.remove(user) {
                Some(pending) => {
                    pending.task.abort();
                    true
                }
                None => false,
            };
            table.announced_offline.remove(user);
            let replaced = table.handles.insert(user.clone(), handle);
            (
                ConnectOutcome {
                    replaced,
                    resumed_within_grace,
                },
                table.all_handles(),
            )
        };

        if outcome.resumed_within_grace {
            tracing::debug!(user_id = %user, "reconnected within grace period");
        }
        if let Some(old) = &outcome.replaced {
            tracing::info!(
                user_id = %user,
                replaced_connection = %old.id(),
                "replaced existing connection"
            );
        }

        fan_out(&targets, &status_event(user, PresenceStatus::Online));
        outcome
    }

    /// Unregister the connection `connection`.
    ///
    /// Only removes the mapping when `connection` is still the user's handle of
    /// record; an older, replaced connection closing leaves its successor alone.
    /// The `offline` broadcast fires after the grace period unless the user
    /// reconnects first.
    pub async fn disconnect(self: &Arc<Self>, connection: ConnectionId) -> DisconnectOutcome {
        let mut table = self.table.lock().await;

        let Some(user) = table
            .handles
            .iter()
            .find(|(_, handle)| handle.id() == connection)
            .map(|(user, _)| user.clone())
        else {
            return DisconnectOutcome::NotRegistered;
        };

        table.handles.remove(&user);

        if table.announced_offline.remove(&user) {
            return DisconnectOutcome::AlreadyAnnounced(user);
        }

        table.next_generation += 1;
        let generation = table.next_generation;
        let registry = Arc::clone(self);
        let grace = self.offline_grace;
        let pending_user = user.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry.complete_offline(&pending_user, generation).await;
        });

        if let Some(previous) = table
            .pending_offline
            .insert(user.clone(), PendingOffline { generation, task })
        {
            previous.task.abort();
        }

        tracing::debug!(user_id = %user, grace_ms = grace.as_millis() as u64, "offline scheduled");
        DisconnectOutcome::OfflineScheduled(user)
    }

    async fn complete_offline(&self, user: &UserId, generation: u64) {
        let targets = {
            let mut table = self.table.lock().await;
            match table.pending_offline.get(user) {
                Some(pending) if pending.generation == generation => {
                    table.pending_offline.remove(user);
                }
                _ => return,
            }
            if table.handles.contains_key(user) {
                return;
            }
            table.all_handles()
        };

        tracing::info!(user_id = %user, "user offline");
        fan_out(&targets, &status_event(user, PresenceStatus::Offline));
    }

    /// Broadcast `offline` for `user` right away.
    ///
    /// The mapping stays until the transport closes, but that later disconnect
    /// does not broadcast again. Returns `false` if `user` is not connected.
    pub async fn announce_offline(&self, user: &UserId) -> bool {
        let targets = {
            let mut table = self.table.lock().await;
            if !table.handles.contains_key(user) {
                return false;
            }
            table.announced_offline.insert(user.clone());
            table
                .handles
                .iter()
                .filter(|(id, _)| *id != user)
                .map(|(_, handle)| handle.clone())
                .collect::<Vec<_>>()
        };

        tracing::info!(user_id = %user, "user announced offline");
        fan_out(&targets, &status_event(user, PresenceStatus::Offline));
        true
    }

    pub async fn is_online(&self, user: &UserId) -> bool {
        self.table.lock().await.handles.contains_key(user)
    }

    pub async fn handle_for(&self, user: &UserId) -> Option<ConnectionHandle> {
        self.table.lock().await.handles.get(user).cloned()
    }

    /// Whether `connection` is the handle of record for `user`
    pub async fn is_handle_of_record(&self, user: &UserId, connection: ConnectionId) -> bool {
        self.table
            .lock()
            .await
            .handles
            .get(user)
            .is_some_and(|handle| handle.id() == connection)
    }

    /// Ids of connected users, sorted
    pub async fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.table.lock().await.handles.keys().cloned().collect();
        users.sort();
        users
    }

    /// Send `event` to every connection. Returns the number of connections reached.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        let targets = self.table.lock().await.all_handles();
        fan_out(&targets, event)
    }
}

fn status_event(user: &UserId, status: PresenceStatus) -> ServerEvent {
    ServerEvent::UserStatus(UserStatusPayload {
        user_id: user.to_string(),
        status,
    })
}

fn fan_out(targets: &[ConnectionHandle], event: &ServerEvent) -> usize {
    let Some(frame) = encode(event) else {
        return 0;
    };
    targets
        .iter()
        .filter(|handle| {
            let sent = handle.send_raw(frame.clone());
            if !sent {
                tracing::warn!(connection = %handle.id(), event = event.name(), "failed to push event");
            }
            sent
        })
        .count()
}
