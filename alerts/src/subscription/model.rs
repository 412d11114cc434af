use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Browser push subscription as produced by `PushManager.subscribe()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,

    #[serde(rename = "expirationTime", default)]
    pub expiration_time: Option<i64>,

    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl PushSubscription {
    /// Identity of the subscription in storage.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_auth(&self.keys.auth)
    }
}

/// Lowercase hex SHA-256 of a subscription's auth secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_auth(auth: &str) -> Self {
        Self(hex::encode(Sha256::digest(auth.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
