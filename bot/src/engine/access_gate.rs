use crate::store::config_store::ConfigDocument;

/// Result of checking where a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Authorized,
    ServerNotAuthorized,
    ChannelNotAuthorized,
}

/// Decide whether a request from `server_id`/`channel_id` may use the command.
///
/// Requests without a server (direct messages) are always authorized. A
/// server must have an entry in the document; if that entry lists channels,
/// the request's channel must be one of them.
pub fn check(doc: &ConfigDocument, server_id: Option<&str>, channel_id: &str) -> GateDecision {
    let Some(server_id) = server_id else {
        return GateDecision::Authorized;
    };

    let Some(rule) = doc.servers.get(server_id) else {
        return GateDecision::ServerNotAuthorized;
    };

    if !rule.like_channels.is_empty() && !rule.like_channels.contains(channel_id) {
        return GateDecision::ChannelNotAuthorized;
    }

    GateDecision::Authorized
}
