use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError, GovernorLayer,
};

use crate::error::AppError;

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Applied to the whole API.
pub fn general() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("general rate limit is non-zero"),
	)
}

/// Applied to login, the assistant and card rendering, which are expensive
/// or worth brute-forcing.
pub fn strict() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(2)
			.burst_size(5)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("strict rate limit is non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// The rate limits of a running server. Tests run without any, since they
/// have no peer address to key on.
#[derive(Clone)]
pub struct Limits {
	pub general: Config,
	pub strict: Config,
}

impl Limits {
	pub fn new() -> Self {
		Self {
			general: general(),
			strict: strict(),
		}
	}

	pub fn general_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.general.clone(),
		}
	}

	pub fn strict_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.strict.clone(),
		}
	}

	pub fn spawn_cleanup(&self) {
		cleanup_old_limits(&[&self.general, &self.strict]);
	}
}

pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
