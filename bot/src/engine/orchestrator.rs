use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::access_gate::{self, GateDecision};
use super::cooldown::{CooldownDecision, CooldownTracker};
use super::outcome::{AccessScope, LikeOutcome, LikeRequest};
use super::validation;
use crate::config::BotConfig;
use crate::service::like_client::{LikePayload, LikeServiceClient, ServiceResult};
use crate::store::config_store::ConfigStore;

/// Runs a `like` request end to end: access check, cooldown, UID
/// validation, then the service call. Owns the cooldown table and the HTTP
/// client; shares the access store with whatever administers it.
pub struct LikeOrchestrator {
    store: Arc<ConfigStore>,
    client: LikeServiceClient,
    cooldowns: CooldownTracker,
}

impl LikeOrchestrator {
    pub fn new(store: Arc<ConfigStore>, client: LikeServiceClient, cooldowns: CooldownTracker) -> Self {
        Self {
            store,
            client,
            cooldowns,
        }
    }

    /// Build the store, client and cooldown table described by `config`.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let store = ConfigStore::open(&config.storage.access_file).with_context(|| {
            format!("failed to open access file {}", config.storage.access_file)
        })?;
        let client = LikeServiceClient::new(
            config.like_service.base_url.clone(),
            config.credential(),
            config.timeout(),
        )?;
        let cooldowns = CooldownTracker::new(config.cooldown_window(), config.privileged_users());

        Ok(Self::new(Arc::new(store), client, cooldowns))
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub async fn handle(&self, request: LikeRequest) -> LikeOutcome {
        self.handle_at(request, Utc::now()).await
    }

    /// Handle `request` as if it arrived at `now`.
    pub async fn handle_at(&self, request: LikeRequest, now: DateTime<Utc>) -> LikeOutcome {
        let doc = self.store.snapshot();
        match access_gate::check(&doc, request.server_id.as_deref(), &request.channel_id) {
            GateDecision::Authorized => {}
            GateDecision::ServerNotAuthorized => {
                debug!(server_id = ?request.server_id, "like rejected: server not authorized");
                return LikeOutcome::NotAuthorized {
                    scope: AccessScope::Server,
                };
            }
            GateDecision::ChannelNotAuthorized => {
                debug!(
                    server_id = ?request.server_id,
                    channel_id = %request.channel_id,
                    "like rejected: channel not authorized"
                );
                return LikeOutcome::NotAuthorized {
                    scope: AccessScope::Channel,
                };
            }
        }
        drop(doc);

        if let CooldownDecision::Denied { remaining } =
            self.cooldowns.check_and_record(&request.user_id, now)
        {
            debug!(user_id = %request.user_id, remaining_secs = remaining.num_seconds(), "like rejected: on cooldown");
            return LikeOutcome::OnCooldown { remaining };
        }

        if let Err(reason) = validation::validate_uid(&request.uid) {
            return LikeOutcome::InvalidInput { reason };
        }

        let uid = request.uid;
        let outcome = match self.client.fetch_like(&uid).await {
            ServiceResult::Payload(LikePayload::Liked(report)) => LikeOutcome::Success {
                uid,
                player: report.player,
                likes_before: report.likes_before,
                likes_after: report.likes_after,
                likes_added: report.likes_added,
            },
            ServiceResult::Payload(LikePayload::Maxed) => LikeOutcome::AlreadyMaxed { uid },
            ServiceResult::NotFound => LikeOutcome::PlayerNotFound { uid },
            ServiceResult::Unavailable { .. } => LikeOutcome::ServiceUnavailable,
            ServiceResult::Timeout => LikeOutcome::Timeout,
            ServiceResult::Unexpected(reason) => {
                error!(uid = %uid, reason = %reason, "unexpected error in like command");
                LikeOutcome::UnexpectedError
            }
        };

        info!(user_id = %request.user_id, outcome = ?outcome, "like request handled");
        outcome
    }

    /// Release the HTTP client.
    pub fn shutdown(self) {
        self.client.close();
        info!("like orchestrator shut down");
    }
}
