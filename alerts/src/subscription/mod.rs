//! Push subscribers: identity, storage and the subscribe/unsubscribe flow.

pub mod model;
pub mod repository;
pub mod repository_sqlx;
pub mod service;

pub use model::{Fingerprint, PushSubscription, SubscriptionKeys};
pub use repository::SubscriptionRepository;
pub use repository_sqlx::SqlxSubscriptionRepository;
pub use service::{SubscribeOutcome, SubscriptionError, SubscriptionService, UnsubscribeOutcome};
