use std::fmt;

use chrono::Duration;

/// A normalized `like` invocation handed over by the chat front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    /// `None` for direct messages.
    pub server_id: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    /// Player UID exactly as typed by the user.
    pub uid: String,
}

impl LikeRequest {
    pub fn new(
        server_id: Option<impl Into<String>>,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            server_id: server_id.map(Into::into),
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            uid: uid.into(),
        }
    }
}

/// Which part of the request origin failed the access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    Server,
    Channel,
}

/// Everything a `like` invocation can end in. Every variant is a normal
/// result for the front end to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Success {
        uid: String,
        player: String,
        likes_before: Option<i64>,
        likes_after: Option<i64>,
        likes_added: i64,
    },
    AlreadyMaxed {
        uid: String,
    },
    PlayerNotFound {
        uid: String,
    },
    ServiceUnavailable,
    Timeout,
    InvalidInput {
        reason: String,
    },
    UnexpectedError,
    NotAuthorized {
        scope: AccessScope,
    },
    OnCooldown {
        remaining: Duration,
    },
}

impl LikeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LikeOutcome::Success { .. })
    }
}

/// Format a duration as `"{h}h {m}m"`, dropping seconds.
pub fn format_remaining(remaining: Duration) -> String {
    let minutes = remaining.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn or_na(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string())
}

impl fmt::Display for LikeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeOutcome::Success {
                uid,
                player,
                likes_before,
                likes_after,
                likes_added,
            } => write!(
                f,
                "Likes sent to {player} ({uid}): +{likes_added} (before: {}, after: {})",
                or_na(*likes_before),
                or_na(*likes_after)
            ),
            LikeOutcome::AlreadyMaxed { uid } => {
                write!(f, "UID {uid} has already received the max likes today")
            }
            LikeOutcome::PlayerNotFound { uid } => {
                write!(f, "The UID {uid} does not exist or is not accessible")
            }
            LikeOutcome::ServiceUnavailable => {
                write!(f, "The like service is not responding at the moment")
            }
            LikeOutcome::Timeout => write!(f, "The like service took too long to respond"),
            LikeOutcome::InvalidInput { reason } => write!(f, "Invalid UID: {reason}"),
            LikeOutcome::UnexpectedError => {
                write!(f, "An unexpected error occurred. Please try again later")
            }
            LikeOutcome::NotAuthorized {
                scope: AccessScope::Server,
            } => write!(f, "This server is not allowed to use this command"),
            LikeOutcome::NotAuthorized {
                scope: AccessScope::Channel,
            } => write!(f, "Use this command in an approved channel"),
            LikeOutcome::OnCooldown { remaining } => {
                write!(f, "On cooldown, try again in {}", format_remaining(*remaining))
            }
        }
    }
}
