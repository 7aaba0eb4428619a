//! Signed, single-use upload tickets.
//!
//! A ticket is `{expires_unix}.{owner_id}.{nonce}.{hex hmac}` where the MAC
//! is HMAC-SHA256 over `{expires_unix}.{owner_id}.{nonce}`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::shared::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Issues and redeems upload tickets.
pub struct TicketSigner {
    secret: Vec<u8>,
    ttl: Duration,
    /// Redeemed nonces and their expiry, so a ticket works once.
    redeemed: DashMap<String, i64>,
}

impl TicketSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl: Duration::seconds(ttl_secs as i64),
            redeemed: DashMap::new(),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("invalid signing key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Create a ticket for `owner_id` valid until `now + ttl`.
    pub fn issue(
        &self,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.ttl;
        let payload = format!(
            "{}.{}.{}",
            expires_at.timestamp(),
            owner_id,
            Uuid::new_v4().simple()
        );
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok((format!("{}.{}", payload, signature), expires_at))
    }

    /// Check signature and expiry, then burn the ticket. Returns the owner.
    pub fn redeem(&self, ticket: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        let invalid = || AppError::Unauthorized("Invalid upload ticket".into());

        let (payload, signature) = ticket.rsplit_once('.').ok_or_else(invalid)?;
        let mut parts = payload.splitn(3, '.');
        let (Some(expires), Some(owner_id), Some(nonce)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let signature = hex::decode(signature).map_err(|_| invalid())?;

        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let expires: i64 = expires.parse().map_err(|_| invalid())?;
        let owner_id: i64 = owner_id.parse().map_err(|_| invalid())?;
        let expires_at = Utc.timestamp_opt(expires, 0).single().ok_or_else(invalid)?;
        if expires_at < now {
            return Err(AppError::Unauthorized("Upload ticket has expired".into()));
        }

        self.redeemed.retain(|_, exp| *exp >= now.timestamp());
        if self.redeemed.insert(nonce.to_string(), expires).is_some() {
            return Err(AppError::Unauthorized("Upload ticket already used".into()));
        }

        Ok(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_is_single_use() {
        let signer = TicketSigner::new("secret", 60);
        let now = Utc::now();
        let (ticket, _) = signer.issue(42, now).unwrap();

        assert_eq!(signer.redeem(&ticket, now).unwrap(), 42);
        assert!(signer.redeem(&ticket, now).is_err());
    }

    #[test]
    fn test_tampered_ticket_is_rejected() {
        let signer = TicketSigner::new("secret", 60);
        let now = Utc::now();
        let (ticket, _) = signer.issue(1, now).unwrap();
        let tampered = format!("9{}", ticket);

        assert!(signer.redeem(&tampered, now).is_err());
        assert!(TicketSigner::new("other", 60).redeem(&ticket, now).is_err());
    }

    #[test]
    fn test_expired_ticket_is_rejected() {
        let signer = TicketSigner::new("secret", 60);
        let now = Utc::now();
        let (ticket, _) = signer.issue(1, now).unwrap();

        assert!(signer.redeem(&ticket, now + Duration::seconds(120)).is_err());
    }
}
