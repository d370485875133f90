//! Addressing strategies.
//!
//! A strategy decides which pair of identifiers a conversation is keyed
//! by. The default keeps every user's conversation in every chat
//! separate; the alternatives collapse one axis or keep forum topics
//! apart.

use serde::{Deserialize, Serialize};

/// Policy mapping an event's raw (chat, user, thread) identifiers to
/// the pair that addresses conversation state.
///
/// | strategy       | chat | user | thread  |
/// |----------------|------|------|---------|
/// | `UserInChat`   | chat | user | dropped |
/// | `Chat`         | chat | chat | dropped |
/// | `GlobalUser`   | user | user | dropped |
/// | `UserInTopic`  | chat | user | kept    |
/// | `ChatTopic`    | chat | chat | kept    |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsmStrategy {
    /// Independent state per (chat, user) pair. The default.
    #[default]
    UserInChat,
    /// One shared state per chat, whoever is talking.
    Chat,
    /// One state per user across every chat.
    GlobalUser,
    /// Like [`UserInChat`](Self::UserInChat), kept separate per forum
    /// topic.
    UserInTopic,
    /// Like [`Chat`](Self::Chat), kept separate per forum topic.
    ChatTopic,
}

impl FsmStrategy {
    /// Collapses raw event identifiers to the addressed
    /// `(chat_id, user_id, thread_id)` triple, or `None` when the event
    /// carries no usable address.
    ///
    /// A missing chat falls back to the user (direct-message style
    /// events). Chat-scoped strategies always address by the chat, so
    /// they tolerate a missing user; user-scoped strategies yield
    /// `None` without one — there is no well-defined per-user address
    /// for an event nobody sent.
    pub fn apply(
        self,
        chat_id: Option<i64>,
        user_id: Option<i64>,
        thread_id: Option<i64>,
    ) -> Option<(i64, i64, Option<i64>)> {
        let chat_id = chat_id.or(user_id)?;
        match self {
            Self::UserInChat => Some((chat_id, user_id?, None)),
            Self::Chat => Some((chat_id, chat_id, None)),
            Self::GlobalUser => {
                let user_id = user_id?;
                Some((user_id, user_id, None))
            }
            Self::UserInTopic => Some((chat_id, user_id?, thread_id)),
            Self::ChatTopic => Some((chat_id, chat_id, thread_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_in_chat_keeps_both_axes() {
        assert_eq!(
            FsmStrategy::UserInChat.apply(Some(-42), Some(42), Some(5)),
            Some((-42, 42, None))
        );
    }

    #[test]
    fn test_chat_collapses_user() {
        assert_eq!(
            FsmStrategy::Chat.apply(Some(-42), Some(42), None),
            Some((-42, -42, None))
        );
        // A missing user is no obstacle for chat scope.
        assert_eq!(
            FsmStrategy::Chat.apply(Some(-42), None, None),
            Some((-42, -42, None))
        );
    }

    #[test]
    fn test_global_user_collapses_chat() {
        assert_eq!(
            FsmStrategy::GlobalUser.apply(Some(-42), Some(42), None),
            Some((42, 42, None))
        );
    }

    #[test]
    fn test_topic_strategies_keep_thread() {
        assert_eq!(
            FsmStrategy::UserInTopic.apply(Some(-42), Some(42), Some(5)),
            Some((-42, 42, Some(5)))
        );
        assert_eq!(
            FsmStrategy::ChatTopic.apply(Some(-42), Some(42), Some(5)),
            Some((-42, -42, Some(5)))
        );
        // No thread is fine; the scope just has no topic component.
        assert_eq!(
            FsmStrategy::UserInTopic.apply(Some(-42), Some(42), None),
            Some((-42, 42, None))
        );
    }

    #[test]
    fn test_missing_chat_falls_back_to_user() {
        assert_eq!(
            FsmStrategy::UserInChat.apply(None, Some(42), None),
            Some((42, 42, None))
        );
        assert_eq!(
            FsmStrategy::Chat.apply(None, Some(42), None),
            Some((42, 42, None))
        );
    }

    #[test]
    fn test_user_scoped_strategies_need_a_user() {
        assert_eq!(FsmStrategy::UserInChat.apply(Some(-42), None, None), None);
        assert_eq!(FsmStrategy::GlobalUser.apply(Some(-42), None, None), None);
        assert_eq!(FsmStrategy::UserInTopic.apply(Some(-42), None, Some(5)), None);
    }

    #[test]
    fn test_nothing_to_address() {
        for strategy in [
            FsmStrategy::UserInChat,
            FsmStrategy::Chat,
            FsmStrategy::GlobalUser,
            FsmStrategy::UserInTopic,
            FsmStrategy::ChatTopic,
        ] {
            assert_eq!(strategy.apply(None, None, None), None);
        }
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        let json = serde_json::to_string(&FsmStrategy::UserInTopic).unwrap();
        assert_eq!(json, "\"user_in_topic\"");
        let parsed: FsmStrategy = serde_json::from_str("\"global_user\"").unwrap();
        assert_eq!(parsed, FsmStrategy::GlobalUser);
        assert!(serde_json::from_str::<FsmStrategy>("\"per_galaxy\"").is_err());
    }
}
