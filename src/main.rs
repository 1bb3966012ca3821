#![warn(clippy::pedantic)]

mod assistant;
mod card;
mod config;
mod error;
mod extract;
mod garden;
mod model;
mod openapi;
mod preferences;
mod ratelimit;
mod route;
mod session;
mod store;
#[cfg(test)]
mod test;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::Request, Extension, Router, ServiceExt};
use tower::{Layer, ServiceBuilder};
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	assistant::{Assistant, GeminiClient},
	config::{Config, ConfigError},
	ratelimit::Limits,
	route::auth::{route::SetupError, Events},
	store::{Database, MemoryStore, PgStore},
};

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, the password hasher or the assistant client.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub config: Arc<Config>,
	pub assistant: Assistant,
	pub events: Events,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Trace(#[from] trace::Error),
	#[error("failed to open the store: {0}")]
	Store(#[from] store::Error),
	#[error("failed to create the admin account: {0}")]
	Setup(#[from] SetupError),
	#[error("failed to build the assistant client: {0}")]
	Client(#[from] reqwest::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Builds the whole API. Rate limits need the peer address, so they are left
/// out when `limits` is `None`.
pub fn app(state: State, limits: Option<&Limits>) -> Router {
	let mut api = OpenApi::default();

	let strict = |router: ApiRouter<AppState>| match limits {
		Some(limits) => router.layer(limits.strict_layer()),
		None => router,
	};

	let router = ApiRouter::new()
		.nest(
			"/auth",
			strict(route::auth::login_routes()).merge(route::auth::routes()),
		)
		.nest("/posts", route::post::routes())
		.nest("/visits", route::visit::routes())
		.nest("/assistant", strict(route::assistant::routes()))
		.nest("/cards", strict(route::card::routes()))
		.nest("/preferences", route::preferences::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.with_state(state)
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		);

	match limits {
		Some(limits) => router.layer(limits.general_layer()),
		None => router,
	}
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for ctrl-c, running until killed");

		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	let database: Database = match &config.database_url {
		Some(url) => Arc::new(PgStore::connect(url).await?),
		None => {
			tracing::warn!("DATABASE_URL is not set, nothing will survive a restart");

			Arc::new(MemoryStore::new())
		}
	};

	let hasher = Argon2::default();

	match &config.admin {
		Some(account) => {
			route::auth::ensure_user(&database, &hasher, account).await?;
		}
		None => tracing::warn!("ADMIN_EMAIL is not set, nobody will be able to sign in"),
	}

	let generator = GeminiClient::new(
		config.gemini_api_key.clone(),
		config.gemini_model.clone(),
		config.gemini_base_url.clone(),
	)?;
	let assistant = Assistant::new(
		Arc::new(generator),
		assistant::instructions(&config.site_title, &config.site_author),
	);

	let address = SocketAddr::new(config.host, config.port);
	let state = State {
		database,
		hasher,
		config: Arc::new(config),
		assistant,
		events: route::auth::channel(),
	};

	let limits = Limits::new();
	limits.spawn_cleanup();

	let app = NormalizePathLayer::trim_trailing_slash().layer(app(state, Some(&limits)));
	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!("listening on {address}");

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}
