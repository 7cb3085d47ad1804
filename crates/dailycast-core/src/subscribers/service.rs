use std::sync::Arc;

use super::address::normalize_address;
use super::models::Subscriber;
use crate::messaging::{templates, MessageGateway};
use crate::storage::{Database, EventLevel, EventSink, SubscriberRepository};
use crate::{Error, Result};

/// How a subscribe call ended
#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    /// A new subscriber row was created
    Created(Subscriber),
    /// An inactive subscriber came back; language follows the new request
    Reactivated(Subscriber),
    /// The address already has an active subscription
    AlreadyActive(Subscriber),
}

/// Subscription lifecycle: subscribe, unsubscribe, admin toggling.
/// Confirmation texts go out best-effort when a gateway is attached.
pub struct SubscriptionService {
    db: Database,
    events: Arc<dyn EventSink>,
    gateway: Option<Arc<dyn MessageGateway>>,
    languages: Vec<String>,
}

impl SubscriptionService {
    pub fn new(db: Database, events: Arc<dyn EventSink>, languages: Vec<String>) -> Self {
        Self {
            db,
            events,
            gateway: None,
            languages,
        }
    }

    /// Attach a messaging gateway for confirmation texts
    pub fn with_gateway(mut self, gateway: Arc<dyn MessageGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    fn check_language(&self, language: &str) -> Result<()> {
        if self.languages.iter().any(|l| l == language) {
            Ok(())
        } else {
            Err(Error::UnsupportedLanguage(language.to_string()))
        }
    }

    /// Send a confirmation text if a gateway is attached. A send failure
    /// never fails the surrounding operation.
    async fn send_confirmation(&self, address: &str, body: &str) {
        if let Some(gateway) = &self.gateway {
            if let Err(e) = gateway.send_text(address, body).await {
                tracing::warn!("Failed to send confirmation to {}: {}", address, e);
            }
        }
    }

    /// Subscribe an address, reactivating a previous subscription when
    /// one exists. Never creates a second row for the same address.
    pub async fn subscribe(&self, raw_address: &str, language: &str) -> Result<SubscribeOutcome> {
        let address = normalize_address(raw_address)?;
        self.check_language(language)?;

        let repo = SubscriberRepository::new(&self.db);

        if let Some(existing) = repo.find_by_address(&address).await? {
            if existing.is_active {
                return Ok(SubscribeOutcome::AlreadyActive(existing));
            }

            repo.set_active(existing.id, true).await?;
            repo.set_language(existing.id, language).await?;
            let subscriber = repo
                .find_by_id(existing.id)
                .await?
                .ok_or_else(|| Error::SubscriberNotFound(existing.id.to_string()))?;

            self.events
                .record(
                    EventLevel::Info,
                    &format!("Reactivated subscriber {} ({})", address, language),
                )
                .await;
            self.send_confirmation(&address, templates::welcome(language)).await;

            return Ok(SubscribeOutcome::Reactivated(subscriber));
        }

        let subscriber = repo.create(&address, language).await?;

        self.events
            .record(
                EventLevel::Info,
                &format!("New subscriber {} ({})", address, language),
            )
            .await;
        self.send_confirmation(&address, templates::welcome(language)).await;

        Ok(SubscribeOutcome::Created(subscriber))
    }

    /// Deactivate an address. Returns false when no active subscription
    /// matches; the row itself always survives.
    pub async fn unsubscribe(&self, raw_address: &str) -> Result<bool> {
        let address = normalize_address(raw_address)?;
        let repo = SubscriberRepository::new(&self.db);

        let existing = match repo.find_by_address(&address).await? {
            Some(subscriber) if subscriber.is_active => subscriber,
            _ => return Ok(false),
        };

        repo.set_active(existing.id, false).await?;

        self.events
            .record(
                EventLevel::Info,
                &format!("Unsubscribed {}", address),
            )
            .await;
        self.send_confirmation(&address, templates::goodbye(&existing.language))
            .await;

        Ok(true)
    }

    /// Admin flag flip; returns the new active state
    pub async fn toggle(&self, raw_address: &str) -> Result<bool> {
        let address = normalize_address(raw_address)?;
        let repo = SubscriberRepository::new(&self.db);

        let existing = repo
            .find_by_address(&address)
            .await?
            .ok_or_else(|| Error::SubscriberNotFound(address.clone()))?;

        let new_state = !existing.is_active;
        repo.set_active(existing.id, new_state).await?;

        self.events
            .record(
                EventLevel::Info,
                &format!(
                    "Subscriber {} toggled {}",
                    address,
                    if new_state { "active" } else { "inactive" }
                ),
            )
            .await;

        Ok(new_state)
    }

    /// List every subscriber, newest first
    pub async fn list_all(&self) -> Result<Vec<Subscriber>> {
        SubscriberRepository::new(&self.db).list_all().await
    }
}
