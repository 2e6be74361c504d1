//! Periodic timeline discovery
//!
//! Polls one account's timeline on a fixed schedule, filters posts by
//! keyword, and feeds matches into the registration workflow as synthetic
//! derivative submissions. A failed tick is logged and the next tick
//! proceeds independently; nothing here ever stops the schedule.

use crate::asset_lock::AssetLockManager;
use crate::error::Result;
use crate::processed::ProcessedPostsStore;
use crate::workflow::{DerivativeSubmission, Workflow, WorkflowOptions};
use parking_lot::Mutex;
use pinata::Pinning;
use std::sync::Arc;
use std::time::Duration;
use story::{Address, IpGateway};
use timeline::Timeline;
use tracing::{debug, info, warn};

/// Case-insensitive substring match against the tracked keyword set
pub fn matches_keywords(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Discovery schedule and filtering settings
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Handle whose timeline is polled
    pub username: String,
    /// Parent asset every discovered post derives from
    pub parent_asset: Address,
    /// Lowercased keywords that make a post eligible
    pub keywords: Vec<String>,
    /// Wall-clock period between ticks
    pub interval: Duration,
    /// Page size for each timeline fetch
    pub max_results: u32,
}

pub struct DiscoveryJob<T, P, G> {
    timeline: Arc<T>,
    pinning: Arc<P>,
    gateway: Arc<G>,
    options: WorkflowOptions,
    settings: DiscoverySettings,
    processed: ProcessedPostsStore,
    locks: AssetLockManager,
    // User ID is stable; resolved once and cached
    user_id: Mutex<Option<String>>,
}

impl<T: Timeline, P: Pinning, G: IpGateway> DiscoveryJob<T, P, G> {
    pub fn new(
        timeline: Arc<T>,
        pinning: Arc<P>,
        gateway: Arc<G>,
        options: WorkflowOptions,
        settings: DiscoverySettings,
        processed: ProcessedPostsStore,
        locks: AssetLockManager,
    ) -> Self {
        Self {
            timeline,
            pinning,
            gateway,
            options,
            settings,
            processed,
            locks,
            user_id: Mutex::new(None),
        }
    }

    /// Run the schedule forever. The first check fires immediately.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Watching @{} every {:?} for keywords {:?}",
            self.settings.username, self.settings.interval, self.settings.keywords
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        loop {
            interval.tick().await;
            match self.tick().await {
                Ok(0) => debug!("Tick complete, no new matching posts"),
                Ok(count) => info!("Tick complete, registered {} derivative(s)", count),
                Err(e) => warn!("Discovery tick failed: {}", e),
            }
        }
    }

    /// One poll of the timeline. Returns how many posts were registered.
    pub async fn tick(&self) -> Result<usize> {
        let user_id = self.resolve_user_id().await?;
        let posts = self
            .timeline
            .recent_posts(&user_id, self.settings.max_results)
            .await?;

        let mut registered = 0;
        for post in posts {
            if !matches_keywords(&post.text, &self.settings.keywords) {
                continue;
            }
            if self.processed.contains(&post.id) {
                debug!("Post {} already processed, skipping", post.id);
                continue;
            }
            let Some(_guard) = self.locks.try_lock(self.settings.parent_asset) else {
                warn!(
                    "Parent asset {} busy, deferring post {} to a later tick",
                    self.settings.parent_asset, post.id
                );
                continue;
            };

            info!("Found relevant post {}: {}", post.id, post.text);
            let submission = DerivativeSubmission {
                name: format!("Post {} by @{}", post.id, self.settings.username),
                description: post.text.clone(),
                parent_asset: self.settings.parent_asset,
                image: None,
                existing_license_token: None,
                source_post_id: Some(post.id.clone()),
            };

            let workflow = Workflow::new(
                self.pinning.clone(),
                self.gateway.clone(),
                self.options.clone(),
            );
            match workflow.run(submission).await {
                Ok(record) => {
                    info!("Registered post {} as asset {}", post.id, record.asset_id);
                    registered += 1;
                    if let Err(e) = self.processed.mark(&post.id) {
                        warn!("Failed to persist processed post {}: {}", post.id, e);
                    }
                }
                // Left unmarked so the next tick can retry it
                Err(e) => warn!("Failed to register post {}: {}", post.id, e),
            }
        }

        Ok(registered)
    }

    async fn resolve_user_id(&self) -> Result<String> {
        if let Some(id) = self.user_id.lock().clone() {
            return Ok(id);
        }
        let id = self
            .timeline
            .user_id_by_handle(&self.settings.username)
            .await?;
        debug!("Resolved @{} to user id {}", self.settings.username, id);
        *self.user_id.lock() = Some(id.clone());
        Ok(id)
    }
}
