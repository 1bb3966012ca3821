use std::{env, net::IpAddr};

use crate::assistant;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{name} is not valid: {reason}")]
	Invalid { name: &'static str, reason: String },
	#[error("{0} must be set together with ADMIN_EMAIL and ADMIN_PASSWORD")]
	IncompleteAdmin(&'static str),
}

/// Credentials of the account created at startup if it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminAccount {
	pub email: String,
	pub username: String,
	pub password: String,
}

/// Settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// `None` keeps everything in memory.
	pub database_url: Option<String>,
	pub admin: Option<AdminAccount>,
	/// Appended to logins that have no `@`.
	pub login_domain: Option<String>,
	pub gemini_api_key: Option<String>,
	pub gemini_model: String,
	pub gemini_base_url: String,
	pub site_title: String,
	pub site_author: String,
	pub site_url: String,
	pub otlp_endpoint: Option<String>,
}

fn var(name: &'static str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	var(name).map_or(Ok(default), |value| {
		value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
			name,
			reason: e.to_string(),
		})
	})
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
			(Some(email), Some(password)) => Some(AdminAccount {
				username: var("ADMIN_USERNAME").unwrap_or_else(|| {
					email.split('@').next().unwrap_or_default().to_owned()
				}),
				email,
				password,
			}),
			(None, None) => None,
			(Some(_), None) => return Err(ConfigError::IncompleteAdmin("ADMIN_PASSWORD")),
			(None, Some(_)) => return Err(ConfigError::IncompleteAdmin("ADMIN_EMAIL")),
		};

		let site_url = var("SITE_URL").unwrap_or_else(|| "http://localhost:3000".into());

		if !site_url.starts_with("http://") && !site_url.starts_with("https://") {
			return Err(ConfigError::Invalid {
				name: "SITE_URL",
				reason: "must start with http:// or https://".into(),
			});
		}

		Ok(Self {
			host: parse("HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parse("PORT", 3000)?,
			database_url: var("DATABASE_URL"),
			admin,
			login_domain: var("LOGIN_DOMAIN").map(|domain| domain.trim_start_matches('@').to_owned()),
			gemini_api_key: var("GEMINI_API_KEY"),
			gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| assistant::DEFAULT_MODEL.into()),
			gemini_base_url: var("GEMINI_BASE_URL")
				.unwrap_or_else(|| assistant::DEFAULT_BASE_URL.into()),
			site_title: var("SITE_TITLE").unwrap_or_else(|| "Digital Garden".into()),
			site_author: var("SITE_AUTHOR").unwrap_or_else(|| "the author".into()),
			site_url: site_url.trim_end_matches('/').to_owned(),
			otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}

	/// Resolves a login to an email address, appending the login domain to
	/// shorthand logins.
	pub fn resolve_login(&self, login: &str) -> String {
		let login = login.trim();

		match &self.login_domain {
			Some(domain) if !login.contains('@') => format!("{login}@{domain}"),
			_ => login.to_owned(),
		}
	}

	/// Public link to a post.
	pub fn post_url(&self, id: uuid::Uuid) -> String {
		format!("{}/post/{id}", self.site_url)
	}
}

#[cfg(test)]
impl Config {
	pub fn for_tests() -> Self {
		Self {
			host: IpAddr::from([127, 0, 0, 1]),
			port: 0,
			database_url: None,
			admin: None,
			login_domain: Some("garden.test".into()),
			gemini_api_key: None,
			gemini_model: assistant::DEFAULT_MODEL.into(),
			gemini_base_url: assistant::DEFAULT_BASE_URL.into(),
			site_title: "Test Garden".into(),
			site_author: "Tester".into(),
			site_url: "https://garden.test".into(),
			otlp_endpoint: None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::Config;

	#[test]
	fn test_resolve_login() {
		let mut config = Config::for_tests();

		assert_eq!(config.resolve_login(" admin "), "admin@garden.test");
		assert_eq!(config.resolve_login("me@mail.com"), "me@mail.com");

		config.login_domain = None;
		assert_eq!(config.resolve_login("admin"), "admin");
	}

	#[test]
	fn test_post_url() {
		let config = Config::for_tests();

		assert_eq!(
			config.post_url(uuid::Uuid::nil()),
			"https://garden.test/post/00000000-0000-0000-0000-000000000000"
		);
	}
}
