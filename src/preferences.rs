//! Reader preferences, persisted in cookies so that they survive between visits.

use std::str::FromStr;

use cookie::{time::Duration, Cookie, SameSite};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const THEME_COOKIE: &str = "theme";
pub const LANGUAGE_COOKIE: &str = "lang";
pub const FONT_SIZE_COOKIE: &str = "font_size";

pub const MIN_FONT_SIZE: u8 = 12;
pub const MAX_FONT_SIZE: u8 = 24;
pub const DEFAULT_FONT_SIZE: u8 = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	#[default]
	Dark,
	Light,
}

impl Theme {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dark => "dark",
			Self::Light => "light",
		}
	}
}

impl FromStr for Theme {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"dark" => Ok(Self::Dark),
			"light" => Ok(Self::Light),
			_ => Err(()),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	#[default]
	En,
	Id,
}

impl Language {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::En => "en",
			Self::Id => "id",
		}
	}
}

impl FromStr for Language {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"en" => Ok(Self::En),
			"id" => Ok(Self::Id),
			_ => Err(()),
		}
	}
}

/// Display preferences of one reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Preferences {
	pub theme: Theme,
	pub language: Language,
	/// Base font size in pixels.
	pub font_size: u8,
}

impl Default for Preferences {
	fn default() -> Self {
		Self {
			theme: Theme::default(),
			language: Language::default(),
			font_size: DEFAULT_FONT_SIZE,
		}
	}
}

impl Preferences {
	/// Reads preferences from request cookies. Unknown or out of range values
	/// fall back to their defaults.
	pub fn from_cookies<'c>(cookies: impl IntoIterator<Item = Cookie<'c>>) -> Self {
		let mut preferences = Self::default();

		for cookie in cookies {
			match cookie.name() {
				THEME_COOKIE => {
					if let Ok(theme) = cookie.value().parse() {
						preferences.theme = theme;
					}
				}
				LANGUAGE_COOKIE => {
					if let Ok(language) = cookie.value().parse() {
						preferences.language = language;
					}
				}
				FONT_SIZE_COOKIE => {
					if let Some(size) = cookie
						.value()
						.parse::<u8>()
						.ok()
						.filter(|size| (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(size))
					{
						preferences.font_size = size;
					}
				}
				_ => {}
			}
		}

		preferences
	}

	/// Persistent cookies storing every preference.
	pub fn cookies(&self) -> [Cookie<'static>; 3] {
		[
			persistent(THEME_COOKIE, self.theme.as_str().to_owned()),
			persistent(LANGUAGE_COOKIE, self.language.as_str().to_owned()),
			persistent(FONT_SIZE_COOKIE, self.font_size.to_string()),
		]
	}
}

fn persistent(name: &'static str, value: String) -> Cookie<'static> {
	Cookie::build((name, value))
		.path("/")
		.same_site(SameSite::Lax)
		.max_age(Duration::days(365))
		.into()
}

#[cfg(test)]
mod test {
	use cookie::Cookie;

	use super::{Language, Preferences, Theme, DEFAULT_FONT_SIZE};

	#[test]
	fn test_from_cookies() {
		let preferences = Preferences::from_cookies(Cookie::split_parse("theme=light; lang=id; font_size=20").flatten());

		assert_eq!(preferences.theme, Theme::Light);
		assert_eq!(preferences.language, Language::Id);
		assert_eq!(preferences.font_size, 20);
	}

	#[test]
	fn test_invalid_cookies_fall_back() {
		let preferences = Preferences::from_cookies(Cookie::split_parse("theme=sepia; lang=fr; font_size=99").flatten());

		assert_eq!(preferences, Preferences::default());
		assert_eq!(preferences.font_size, DEFAULT_FONT_SIZE);
	}

	#[test]
	fn test_cookies_round_trip() {
		let preferences = Preferences {
			theme: Theme::Light,
			language: Language::Id,
			font_size: 14,
		};

		let header = preferences
			.cookies()
			.iter()
			.map(|c| c.stripped().to_string())
			.collect::<Vec<_>>()
			.join("; ");

		assert_eq!(Preferences::from_cookies(Cookie::split_parse(header.as_str()).flatten()), preferences);
	}
}
