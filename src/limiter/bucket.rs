//! Continuous-refill token bucket.

// crates.io
use tokio::time::Instant;

/// Token bucket that refills at `rate` tokens per second up to `burst`.
///
/// Buckets start full. Taking from an empty bucket fails immediately; callers are never
/// queued.
#[derive(Clone, Debug)]
pub struct TokenBucket {
	rate: f64,
	burst: f64,
	tokens: f64,
	last_refill: Instant,
}
impl TokenBucket {
	/// Creates a full bucket anchored at `now`.
	pub fn new(rate: f64, burst: u32, now: Instant) -> Self {
		let burst = f64::from(burst);

		Self { rate, burst, tokens: burst, last_refill: now }
	}

	/// Tries to consume one token at `now`.
	pub fn try_take(&mut self, now: Instant) -> bool {
		self.refill(now);

		if self.tokens >= 1. {
			self.tokens -= 1.;

			true
		} else {
			false
		}
	}

	/// Tokens available at `now`, without consuming any.
	pub fn available(&self, now: Instant) -> f64 {
		let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();

		(self.tokens + elapsed * self.rate).min(self.burst)
	}

	fn refill(&mut self, now: Instant) {
		if now <= self.last_refill {
			return;
		}

		self.tokens = self.available(now);
		self.last_refill = now;
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration;
	// self
	use super::*;

	#[test]
	fn burst_is_consumed_then_denied() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(2., 5, start);

		for _ in 0..5 {
			assert!(bucket.try_take(start));
		}

		assert!(!bucket.try_take(start), "The burst + 1 request must be denied.");
	}

	#[test]
	fn refill_grants_one_token_per_interval() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(2., 5, start);

		for _ in 0..5 {
			bucket.try_take(start);
		}

		assert!(!bucket.try_take(start + Duration::from_millis(250)));
		assert!(bucket.try_take(start + Duration::from_millis(500)));
		assert!(!bucket.try_take(start + Duration::from_millis(500)));
		assert!(bucket.try_take(start + Duration::from_millis(1_000)));
	}

	#[test]
	fn refill_is_capped_at_burst() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(2., 3, start);

		bucket.try_take(start);

		let later = start + Duration::from_secs(3_600);

		assert_eq!(bucket.available(later), 3.);

		for _ in 0..3 {
			assert!(bucket.try_take(later));
		}

		assert!(!bucket.try_take(later));
	}

	#[test]
	fn clock_going_backwards_does_not_mint_tokens() {
		let start = Instant::now() + Duration::from_secs(10);
		let mut bucket = TokenBucket::new(1., 1, start);

		assert!(bucket.try_take(start));
		assert!(!bucket.try_take(start - Duration::from_secs(5)));
		assert!(!bucket.try_take(start));
	}
}
