//! Per-client rate limiting for credential endpoints.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};

use crate::error::{ApiError, ApiResult};

type KeyedLimiter<C> =
    RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Keyed on client IP. Cloning shares the same buckets.
pub struct LoginRateLimiter<C: Clock = DefaultClock> {
    limiter: Arc<KeyedLimiter<C>>,
}

impl<C: Clock> Clone for LoginRateLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl LoginRateLimiter {
    /// `per_minute` attempts per IP, replenished continuously. Zero is treated as one.
    pub fn per_minute(per_minute: u32) -> Self {
        Self::with_clock(per_minute, &DefaultClock::default())
    }
}

impl<C: Clock> LoginRateLimiter<C> {
    fn with_clock(per_minute: u32, clock: &C) -> Self {
        let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::new(
                Quota::per_minute(burst),
                DefaultKeyedStateStore::default(),
                clock,
            )),
        }
    }

    pub fn check(&self, ip: IpAddr) -> ApiResult<()> {
        self.limiter.check_key(&ip).map_err(|_| {
            tracing::warn!("Rate limit exceeded for {}", ip);
            ApiError::RateLimited
        })
    }

    /// Drops buckets that have fully replenished. Run periodically so the
    /// key set only holds recently active clients.
    pub fn prune(&self) {
        let before = self.tracked_clients();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(
            before,
            after = self.tracked_clients(),
            "Pruned login rate limiter"
        );
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::clock::FakeRelativeClock;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    #[test]
    fn test_limit_is_per_ip() {
        let limiter = LoginRateLimiter::per_minute(2);
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check(first).is_ok());
        assert!(limiter.check(first).is_ok());
        assert!(matches!(limiter.check(first), Err(ApiError::RateLimited)));

        assert!(limiter.check(second).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let limiter = LoginRateLimiter::per_minute(1);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);

        assert!(limiter.clone().check(ip).is_ok());
        assert!(limiter.check(ip).is_err());
    }

    #[test]
    fn test_prune_drops_replenished_clients() {
        let clock = FakeRelativeClock::default();
        let limiter = LoginRateLimiter::with_clock(5, &clock);

        for last in 1..=200u8 {
            limiter
                .check(IpAddr::V4(Ipv4Addr::new(10, 0, 1, last)))
                .expect("first attempt");
        }
        assert_eq!(limiter.tracked_clients(), 200);

        // Still draining, so nothing is dropped yet
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 200);

        clock.advance(Duration::from_secs(60));
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_prune_keeps_recent_clients() {
        let clock = FakeRelativeClock::default();
        let limiter = LoginRateLimiter::with_clock(1, &clock);
        let stale = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let recent = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        limiter.check(stale).expect("stale");
        clock.advance(Duration::from_secs(45));
        limiter.check(recent).expect("recent");
        clock.advance(Duration::from_secs(90));

        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.check(stale).is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }
}
