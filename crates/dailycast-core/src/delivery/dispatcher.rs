use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ai::DigestSummarizer;
use crate::delivery::{DeliveryStatus, Digest};
use crate::messaging::{templates, MessageGateway};
use crate::news::ContentSource;
use crate::speech::DigestNarrator;
use crate::storage::{Database, DeliveryRepository, EventLevel, EventSink, SubscriberRepository};
use crate::subscribers::Subscriber;
use crate::Result;

const RECENT_ARTICLE_LIMIT: u32 = 10;
const BACKFILL_COUNT: u32 = 10;
const CAPTION_HEADER: &str = "Daily News Summary";
const CAPTION_SUMMARY_CHARS: usize = 200;

/// How one language group's pipeline ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Fan-out ran; sent of total subscribers received the digest
    Delivered { sent: u32, total: u32 },
    /// No active subscribers for the language
    NoSubscribers,
    /// Nothing to deliver even after a backfill fetch
    NoArticles,
    /// Summary generation failed
    NoSummary,
    /// Audio synthesis failed
    NoAudio,
}

/// Aggregate of one delivery run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Subscribers whose delivery was attempted
    pub attempted: u32,
    /// Subscribers who received the digest
    pub delivered: u32,
    /// Per-language outcomes in language order
    pub groups: Vec<(String, GroupOutcome)>,
}

/// Drives the per-language digest pipeline and the per-subscriber
/// fan-out. Every collaborator comes in behind a seam; a fault in one
/// language group or one subscriber never touches the others, and no
/// error escapes a run. A failed delivery is retried by the next
/// scheduled run, not within this one.
pub struct DeliveryDispatcher {
    db: Database,
    content: Arc<dyn ContentSource>,
    summarizer: Arc<dyn DigestSummarizer>,
    narrator: Arc<dyn DigestNarrator>,
    gateway: Arc<dyn MessageGateway>,
    events: Arc<dyn EventSink>,
}

/// Caption for the audio message: fixed header plus the leading chunk
/// of the digest text.
fn build_caption(summary: &str) -> String {
    let lead: String = summary.chars().take(CAPTION_SUMMARY_CHARS).collect();
    format!("{}\n\n{}...", CAPTION_HEADER, lead)
}

impl DeliveryDispatcher {
    pub fn new(
        db: Database,
        content: Arc<dyn ContentSource>,
        summarizer: Arc<dyn DigestSummarizer>,
        narrator: Arc<dyn DigestNarrator>,
        gateway: Arc<dyn MessageGateway>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            db,
            content,
            summarizer,
            narrator,
            gateway,
            events,
        }
    }

    /// One full delivery run across every language with active subscribers
    pub async fn run(&self) -> Result<RunSummary> {
        let subscribers = SubscriberRepository::new(&self.db).list_active().await?;

        if subscribers.is_empty() {
            self.events
                .record(EventLevel::Info, "No active subscribers; delivery run skipped")
                .await;
            return Ok(RunSummary {
                attempted: 0,
                delivered: 0,
                groups: Vec::new(),
            });
        }

        let mut by_language: BTreeMap<String, Vec<Subscriber>> = BTreeMap::new();
        for subscriber in subscribers {
            by_language
                .entry(subscriber.language.clone())
                .or_default()
                .push(subscriber);
        }

        let mut summary = RunSummary {
            attempted: 0,
            delivered: 0,
            groups: Vec::new(),
        };

        for (language, group) in by_language {
            let outcome = self.process_group(&language, &group).await;
            if let GroupOutcome::Delivered { sent, total } = outcome {
                summary.attempted += total;
                summary.delivered += sent;
            }
            summary.groups.push((language, outcome));
        }

        self.events
            .record(
                EventLevel::Info,
                &format!(
                    "Daily digest delivered to {} of {} subscribers",
                    summary.delivered, summary.attempted
                ),
            )
            .await;

        Ok(summary)
    }

    /// Manually triggered delivery for a single language
    pub async fn run_language(&self, language: &str) -> Result<GroupOutcome> {
        let group = SubscriberRepository::new(&self.db)
            .list_active_by_language(language)
            .await?;

        if group.is_empty() {
            self.events
                .record(
                    EventLevel::Warning,
                    &format!("No active subscribers for language '{}'", language),
                )
                .await;
            return Ok(GroupOutcome::NoSubscribers);
        }

        Ok(self.process_group(language, &group).await)
    }

    /// Articles for the group: stored first, one backfill fetch when the
    /// store has nothing. Read or fetch failures degrade to empty.
    async fn collect_articles(&self, language: &str) -> Vec<crate::news::Article> {
        let stored = match self
            .content
            .recent_articles(language, RECENT_ARTICLE_LIMIT)
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!("Failed to read articles for language '{}': {}", language, e),
                    )
                    .await;
                Vec::new()
            }
        };

        if !stored.is_empty() {
            return stored;
        }

        match self.content.fetch_news(language, BACKFILL_COUNT).await {
            Ok(articles) => articles,
            Err(e) => {
                self.events
                    .record(
                        EventLevel::Error,
                        &format!("Backfill fetch failed for language '{}': {}", language, e),
                    )
                    .await;
                Vec::new()
            }
        }
    }

    /// The per-group pipeline: collect, summarize, synthesize, fan out.
    /// Early exits are normal terminations of the group, not errors.
    async fn process_group(&self, language: &str, subscribers: &[Subscriber]) -> GroupOutcome {
        let articles = self.collect_articles(language).await;
        if articles.is_empty() {
            self.events
                .record(
                    EventLevel::Warning,
                    &format!(
                        "No articles available for language '{}'; group skipped",
                        language
                    ),
                )
                .await;
            return GroupOutcome::NoArticles;
        }

        let summary = match self.summarizer.create_daily_summary(&articles, language).await {
            Some(summary) => summary,
            None => {
                tracing::warn!("No digest summary for language '{}'; group skipped", language);
                return GroupOutcome::NoSummary;
            }
        };

        let audio_file = match self.narrator.create_daily_audio(&summary, language).await {
            Some(artifact) => artifact,
            None => {
                tracing::warn!("No digest audio for language '{}'; group skipped", language);
                return GroupOutcome::NoAudio;
            }
        };

        let digest = Digest {
            language: language.to_string(),
            summary,
            audio_file,
        };

        let mut sent = 0;
        for subscriber in subscribers {
            if self.deliver(subscriber, &digest).await {
                sent += 1;
            }
        }

        self.events
            .record(
                EventLevel::Info,
                &format!(
                    "Sent digest to {}/{} subscribers for language '{}'",
                    sent,
                    subscribers.len(),
                    language
                ),
            )
            .await;

        GroupOutcome::Delivered {
            sent,
            total: subscribers.len() as u32,
        }
    }

    /// One delivery attempt for one subscriber. Exactly one delivery
    /// record is appended regardless of outcome.
    async fn deliver(&self, subscriber: &Subscriber, digest: &Digest) -> bool {
        let subscriber_repo = SubscriberRepository::new(&self.db);
        let delivery_repo = DeliveryRepository::new(&self.db);

        let link = self.narrator.public_url(&digest.audio_file);
        let caption = build_caption(&digest.summary);

        match self
            .gateway
            .send_audio(&subscriber.address, &link, Some(&caption))
            .await
        {
            Ok(message_id) => {
                tracing::debug!(
                    "Delivered digest to {} (message {})",
                    subscriber.address,
                    message_id
                );

                if let Err(e) = subscriber_repo.touch_last_delivery(subscriber.id).await {
                    tracing::warn!(
                        "Failed to record delivery time for {}: {}",
                        subscriber.address,
                        e
                    );
                }
                if let Err(e) = delivery_repo
                    .append(subscriber.id, None, DeliveryStatus::Sent, None)
                    .await
                {
                    tracing::warn!(
                        "Failed to log delivery for {}: {}",
                        subscriber.address,
                        e
                    );
                }

                true
            }
            Err(e) => {
                let detail = e.to_string();

                if let Err(log_err) = delivery_repo
                    .append(subscriber.id, None, DeliveryStatus::Failed, Some(&detail))
                    .await
                {
                    tracing::warn!(
                        "Failed to log failed delivery for {}: {}",
                        subscriber.address,
                        log_err
                    );
                }

                self.events
                    .record(
                        EventLevel::Error,
                        &format!("Delivery failed for {}: {}", subscriber.address, detail),
                    )
                    .await;

                // Best-effort notice; its failure is only traced
                if let Err(apology_err) = self
                    .gateway
                    .send_text(&subscriber.address, templates::apology(&subscriber.language))
                    .await
                {
                    tracing::warn!(
                        "Failed to send apology to {}: {}",
                        subscriber.address,
                        apology_err
                    );
                }

                false
            }
        }
    }
}
