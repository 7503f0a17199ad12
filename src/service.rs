use crate::domain::{
    EmailBody, ListSubscribersBody, NewSubscriber, Pagination, Subscriber, SubscriberEmail,
    SubscriberUpdate, UpdateSubscriberBody,
};
use crate::store::{StoreError, SubscriberStore};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Subscriber {0} already exists.")]
    Conflict(String),
    #[error("Failed to access the subscriber store: {0}")]
    Persistence(#[source] StoreError),
}

impl std::fmt::Debug for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { email, .. } => ServiceError::Conflict(email),
            err => ServiceError::Persistence(err),
        }
    }
}

/// The error body both front-ends send back, whatever their protocol.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl From<&ServiceError> for ErrorEnvelope {
    fn from(err: &ServiceError) -> Self {
        ErrorEnvelope {
            error: err.to_string(),
        }
    }
}

/// Protocol agnostic operations on subscribers.
///
/// Validates request shaped input before it reaches the store and maps store failures
/// onto `ServiceError`, so every front-end reports the same failure the same way.
#[derive(Clone, Debug)]
pub struct SubscriberService {
    store: SubscriberStore,
}

impl SubscriberService {
    pub fn new(store: SubscriberStore) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        name = "Creating a new subscriber",
        skip(self, body),
        fields(subscriber_email = %body.email)
    )]
    pub async fn create(&self, body: EmailBody) -> Result<Subscriber, ServiceError> {
        let new_subscriber: NewSubscriber = body.try_into().map_err(ServiceError::Validation)?;

        self.store.create(&new_subscriber.email).await?;

        self.reload(&new_subscriber.email).await
    }

    /// `Ok(None)` when no subscriber has this email.
    #[tracing::instrument(name = "Getting a subscriber", skip(self))]
    pub async fn get(&self, email: &str) -> Result<Option<Subscriber>, ServiceError> {
        Ok(self.store.get(email).await?)
    }

    #[tracing::instrument(
        name = "Updating a subscriber",
        skip(self, body),
        fields(subscriber_email = %body.email)
    )]
    pub async fn update(&self, body: UpdateSubscriberBody) -> Result<Subscriber, ServiceError> {
        let update: SubscriberUpdate = body.try_into().map_err(ServiceError::Validation)?;

        self.store.update(&update).await?;

        self.reload(&update.email).await
    }

    /// Opts the subscriber out and returns the row as it now stands, `Ok(None)` when
    /// the email is unknown.
    #[tracing::instrument(name = "Deleting a subscriber", skip(self))]
    pub async fn delete(&self, email: &str) -> Result<Option<Subscriber>, ServiceError> {
        self.store.delete(email).await?;

        let subscriber = self.store.get(email).await?;
        if subscriber.is_none() {
            tracing::info!("Nothing to delete, subscriber does not exist");
        }

        Ok(subscriber)
    }

    #[tracing::instrument(
        name = "Listing subscribers",
        skip(self, body),
        fields(page = %body.page, count = %body.count)
    )]
    pub async fn list(&self, body: ListSubscribersBody) -> Result<Vec<Subscriber>, ServiceError> {
        let pagination: Pagination = body.try_into().map_err(ServiceError::Validation)?;

        Ok(self.store.list(&pagination).await?)
    }

    async fn reload(&self, email: &SubscriberEmail) -> Result<Subscriber, ServiceError> {
        let subscriber = self
            .store
            .get(email.as_ref())
            .await?
            .ok_or_else(|| ServiceError::Persistence(StoreError::Missing(email.to_string())))?;

        tracing::info!(
            subscriber_id = subscriber.id,
            status = subscriber.status().as_ref(),
            "Subscriber stored"
        );

        Ok(subscriber)
    }
}
