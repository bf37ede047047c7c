//! Terminal output formatting.

use chrono::{DateTime, Local};

use crate::{
    reconcile::{DeliveryState, LedgerEntry},
    session::Notice,
};

fn clock(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

fn state_label(state: DeliveryState) -> &'static str {
    match state {
        DeliveryState::Pending => "sending",
        DeliveryState::Error => "failed",
        DeliveryState::Sent => "sent",
        DeliveryState::Delivered => "delivered",
        DeliveryState::Read => "read",
    }
}

pub fn entry_line(entry: &LedgerEntry, me: &str) -> String {
    if entry.sender_id == me {
        let mut line = format!(
            "[{}] you -> {}: {} ({})",
            clock(entry.created_at),
            entry.receiver_id,
            entry.content,
            state_label(entry.state)
        );
        if let Some(error) = &entry.error {
            line.push_str(&format!(" {error}"));
        }
        line
    } else {
        format!(
            "[{}] {}: {} #{}",
            clock(entry.created_at),
            entry.sender_id,
            entry.content,
            entry.id
        )
    }
}

pub fn notice_line(notice: &Notice, me: &str) -> String {
    match notice {
        Notice::Incoming(entry) => entry_line(entry, me),
        Notice::DeliveryUpdated { id, state } => format!("  {id}: {}", state_label(*state)),
        Notice::SendFailed { id, error } => format!("  {id}: failed ({error})"),
        Notice::Presence { user_id, online } => {
            format!("* {user_id} is {}", if *online { "online" } else { "offline" })
        }
        Notice::OnlineUsers(users) if users.is_empty() => "* nobody else is online".to_string(),
        Notice::OnlineUsers(users) => format!("* online: {}", users.join(", ")),
        Notice::TypingStarted(user) => format!("* {user} is typing..."),
        Notice::TypingStopped(user) => format!("* {user} stopped typing"),
        Notice::ServerError(error) => format!("! {error}"),
    }
}
