//! Helpers shared by the HTTP tests.

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use axum_test::TestServerConfig;

pub use axum_test::TestServer;
pub use serde_json::{json, Value};

use crate::{
	assistant::{self, fake::FakeGenerator, Assistant, Generator},
	config::{AdminAccount, Config},
	route::auth,
	store::MemoryStore,
	State,
};

pub const ADMIN_EMAIL: &str = "admin@garden.test";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Argon2 with the smallest sensible cost, so each login stays fast.
fn hasher() -> Argon2<'static> {
	let params = Params::new(1024, 1, 1, None).unwrap();

	Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// State backed by an empty in-memory store holding only the admin account.
pub async fn state(generator: Arc<dyn Generator>) -> State {
	let config = Config::for_tests();
	let state = State {
		database: Arc::new(MemoryStore::new()),
		hasher: hasher(),
		assistant: Assistant::new(
			generator,
			assistant::instructions(&config.site_title, &config.site_author),
		),
		config: Arc::new(config),
		events: auth::channel(),
	};

	auth::ensure_user(
		&state.database,
		&state.hasher,
		&AdminAccount {
			email: ADMIN_EMAIL.into(),
			username: ADMIN_USERNAME.into(),
			password: ADMIN_PASSWORD.into(),
		},
	)
	.await
	.unwrap();

	state
}

pub async fn app_with_generator(generator: Arc<dyn Generator>) -> (TestServer, State) {
	let state = state(generator).await;
	let server = TestServer::new_with_config(
		crate::app(state.clone(), None),
		TestServerConfig {
			save_cookies: true,
			..TestServerConfig::default()
		},
	)
	.unwrap();

	(server, state)
}

/// A server that keeps cookies between requests, like a browser.
pub async fn app() -> (TestServer, State) {
	app_with_generator(Arc::new(FakeGenerator::default())).await
}

pub async fn login(server: &TestServer) {
	let response = server
		.post("/auth/login")
		.json(&json!({
			"login": ADMIN_EMAIL,
			"password": ADMIN_PASSWORD,
		}))
		.await;

	assert_eq!(response.status_code(), 200);
}

pub async fn create_post(server: &TestServer, body: Value) -> Value {
	let response = server.post("/posts").json(&body).await;

	assert_eq!(response.status_code(), 200, "{}", response.text());

	response.json()
}
