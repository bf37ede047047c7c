//! Conversation list derivation.

use std::collections::HashMap;

use super::{
    entity::{ConversationSummary, Message, UserSummary},
    value_object::UserId,
};

/// Reduce `viewer`'s messages to one summary per conversation partner.
///
/// Each summary carries the newest message with that peer and the number of
/// messages the peer sent to `viewer` that are still unread. The result is
/// sorted newest conversation first. `summary_of` supplies the peer's display
/// attributes.
pub fn summarize_conversations<F>(
    viewer: &UserId,
    messages: &[Message],
    mut summary_of: F,
) -> Vec<ConversationSummary>
where
    F: FnMut(&UserId) -> UserSummary,
{
    let mut by_peer: HashMap<UserId, ConversationSummary> = HashMap::new();

    for message in messages.iter().filter(|m| m.involves(viewer)) {
        let peer = message.peer_of(viewer);
        let unread = usize::from(&message.sender_id != viewer && !message.is_read());

        match by_peer.get_mut(peer) {
            Some(summary) => {
                if message.created_at > summary.last_message_at {
                    summary.last_message = message.content.clone();
                    summary.last_message_at = message.created_at;
                }
                summary.unread_count += unread;
            }
            None => {
                by_peer.insert(
                    peer.clone(),
                    ConversationSummary {
                        peer: summary_of(peer),
                        last_message: message.content.clone(),
                        last_message_at: message.created_at,
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_peer.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.peer.id.cmp(&b.peer.id))
    });
    summaries
}
