//! Share cards: a post or profile summary rasterized into a PNG.

mod font;

use std::io::Cursor;

use image::{ImageOutputFormat, Rgb, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::preferences::Theme;

pub const WIDTH: u32 = 1080;

const PADDING: u32 = 96;
const GAP: u32 = 48;
const ACCENT_HEIGHT: u32 = 12;
const DIVIDER_HEIGHT: u32 = 2;

const TITLE_SCALE: u32 = 8;
const CAPTION_SCALE: u32 = 5;
const FOOTER_SCALE: u32 = 4;
const MAX_TITLE_LINES: usize = 4;
const ELLIPSIS: &str = "...";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to encode card: {0}")]
	Encode(#[from] image::ImageError),
	#[error("card render task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}

/// Shape of the rendered card. Every shape is [`WIDTH`] pixels wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
	/// As tall as the content needs.
	#[default]
	Auto,
	/// 4:5
	Portrait,
	/// 1:1
	Square,
	/// 9:16
	Story,
}

impl AspectRatio {
	pub fn height(self) -> Option<u32> {
		match self {
			Self::Auto => None,
			Self::Portrait => Some(WIDTH * 5 / 4),
			Self::Square => Some(WIDTH),
			Self::Story => Some(WIDTH * 16 / 9),
		}
	}
}

/// The text shown on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
	pub title: String,
	pub caption: String,
	pub footer: String,
}

struct Palette {
	background: Rgb<u8>,
	text: Rgb<u8>,
	muted: Rgb<u8>,
	accent: Rgb<u8>,
}

impl Palette {
	fn of(theme: Theme) -> Self {
		match theme {
			Theme::Dark => Self {
				background: Rgb([0x18, 0x18, 0x1B]),
				text: Rgb([0xFA, 0xFA, 0xFA]),
				muted: Rgb([0xA1, 0xA1, 0xAA]),
				accent: Rgb([0x34, 0xD3, 0x99]),
			},
			Theme::Light => Self {
				background: Rgb([0xFA, 0xFA, 0xFA]),
				text: Rgb([0x18, 0x18, 0x1B]),
				muted: Rgb([0x71, 0x71, 0x7A]),
				accent: Rgb([0x05, 0x96, 0x69]),
			},
		}
	}
}

/// Characters per line at a text scale.
fn columns(scale: u32) -> usize {
	((WIDTH - 2 * PADDING) / (font::ADVANCE * scale)) as usize
}

fn line_height(scale: u32) -> u32 {
	font::LINE_HEIGHT * scale
}

/// Height of everything below the caption: divider, footer line and padding.
fn footer_block() -> u32 {
	GAP + DIVIDER_HEIGHT + GAP / 2 + line_height(FOOTER_SCALE) + PADDING
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
	let mut lines = Vec::new();

	for paragraph in text.lines() {
		let mut line = String::new();

		for word in paragraph.split_whitespace() {
			let mut chars = word.chars().collect::<Vec<_>>();

			while chars.len() > width {
				if !line.is_empty() {
					lines.push(std::mem::take(&mut line));
				}

				lines.push(chars.drain(..width).collect());
			}

			if chars.is_empty() {
				continue;
			}

			let word = chars.into_iter().collect::<String>();
			let length = line.chars().count();

			if length == 0 {
				line = word;
			} else if length + 1 + word.chars().count() <= width {
				line.push(' ');
				line.push_str(&word);
			} else {
				lines.push(std::mem::replace(&mut line, word));
			}
		}

		if !line.is_empty() {
			lines.push(line);
		}
	}

	lines
}

/// Keeps at most `max` lines, marking the cut with an ellipsis.
fn truncate(mut lines: Vec<String>, max: usize, width: usize) -> Vec<String> {
	if lines.len() <= max {
		return lines;
	}

	lines.truncate(max);

	if let Some(last) = lines.last_mut() {
		let keep = width.saturating_sub(ELLIPSIS.len());

		*last = last.chars().take(keep).collect::<String>().trim_end().to_owned();
		last.push_str(ELLIPSIS);
	}

	lines
}

struct Layout {
	height: u32,
	title: Vec<String>,
	caption: Vec<String>,
	footer: String,
}

fn layout(card: &Card, ratio: AspectRatio) -> Layout {
	let title = truncate(
		wrap(&card.title, columns(TITLE_SCALE)),
		MAX_TITLE_LINES,
		columns(TITLE_SCALE),
	);
	let caption = wrap(&card.caption, columns(CAPTION_SCALE));
	let footer = truncate(wrap(&card.footer, columns(FOOTER_SCALE)), 1, columns(FOOTER_SCALE))
		.pop()
		.unwrap_or_default();

	let header = PADDING + title.len() as u32 * line_height(TITLE_SCALE) + GAP;

	match ratio.height() {
		None => Layout {
			height: header + caption.len() as u32 * line_height(CAPTION_SCALE) + footer_block(),
			title,
			caption,
			footer,
		},
		Some(height) => {
			let room = height.saturating_sub(header + footer_block());
			let max = (room / line_height(CAPTION_SCALE)) as usize;

			Layout {
				height,
				title,
				caption: truncate(caption, max, columns(CAPTION_SCALE)),
				footer,
			}
		}
	}
}

fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
	for (i, c) in text.chars().enumerate() {
		let rows = font::glyph(c);
		let left = x + i as u32 * font::ADVANCE * scale;

		for gy in 0..font::GLYPH_HEIGHT {
			for gx in 0..font::GLYPH_WIDTH {
				if !font::is_set(rows, gx, gy) {
					continue;
				}

				for dy in 0..scale {
					for dx in 0..scale {
						let (px, py) = (left + gx * scale + dx, y + gy * scale + dy);

						if px < image.width() && py < image.height() {
							image.put_pixel(px, py, color);
						}
					}
				}
			}
		}
	}
}

fn fill(image: &mut RgbImage, y: u32, height: u32, left: u32, right: u32, color: Rgb<u8>) {
	for py in y..(y + height).min(image.height()) {
		for px in left..right.min(image.width()) {
			image.put_pixel(px, py, color);
		}
	}
}

/// Rasterizes a card into PNG bytes. CPU bound; see [`render_png`].
pub fn render(card: &Card, theme: Theme, ratio: AspectRatio) -> Result<Vec<u8>, Error> {
	let palette = Palette::of(theme);
	let layout = layout(card, ratio);
	let mut image = RgbImage::from_pixel(WIDTH, layout.height, palette.background);

	fill(&mut image, 0, ACCENT_HEIGHT, 0, WIDTH, palette.accent);

	let mut y = PADDING;
	for line in &layout.title {
		draw_text(&mut image, PADDING, y, line, TITLE_SCALE, palette.text);
		y += line_height(TITLE_SCALE);
	}

	y += GAP;
	for line in &layout.caption {
		draw_text(&mut image, PADDING, y, line, CAPTION_SCALE, palette.muted);
		y += line_height(CAPTION_SCALE);
	}

	let footer_y = layout.height - PADDING - line_height(FOOTER_SCALE);
	fill(
		&mut image,
		footer_y - GAP / 2 - DIVIDER_HEIGHT,
		DIVIDER_HEIGHT,
		PADDING,
		WIDTH - PADDING,
		palette.muted,
	);
	draw_text(&mut image, PADDING, footer_y, &layout.footer, FOOTER_SCALE, palette.accent);

	let mut bytes = Vec::new();
	image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;

	Ok(bytes)
}

/// Renders a card on the blocking thread pool.
pub async fn render_png(card: Card, theme: Theme, ratio: AspectRatio) -> Result<Vec<u8>, Error> {
	tokio::task::spawn_blocking(move || render(&card, theme, ratio)).await?
}

#[cfg(test)]
mod test {
	use image::{GenericImageView, Rgb};

	use super::{columns, layout, render, render_png, wrap, AspectRatio, Card, CAPTION_SCALE, WIDTH};
	use crate::preferences::Theme;

	fn card(caption: &str) -> Card {
		Card {
			title: "Water Treatment Basics".into(),
			caption: caption.into(),
			footer: "garden.example - 3 min read".into(),
		}
	}

	#[test]
	fn test_wrap_respects_width() {
		let lines = wrap("the quick brown fox jumps over the lazy dog", 10);

		assert_eq!(lines, ["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
		assert_eq!(wrap("abcdefghijkl", 5), ["abcde", "fghij", "kl"]);
		assert!(wrap("   ", 5).is_empty());
	}

	#[test]
	fn test_fixed_ratios_have_fixed_size() {
		for (ratio, height) in [
			(AspectRatio::Portrait, 1350),
			(AspectRatio::Square, 1080),
			(AspectRatio::Story, 1920),
		] {
			let png = render(&card("Short caption."), Theme::Dark, ratio).unwrap();
			let image = image::load_from_memory(&png).unwrap();

			assert_eq!(image.dimensions(), (WIDTH, height));
		}
	}

	#[test]
	fn test_auto_grows_with_content() {
		let short = layout(&card("One line."), AspectRatio::Auto);
		let long = layout(&card(&"word ".repeat(200)), AspectRatio::Auto);

		assert!(long.height > short.height);
		assert!(!long.caption.iter().any(|line| line.ends_with("...")));
	}

	#[test]
	fn test_overflowing_caption_is_truncated() {
		let layout = layout(&card(&"word ".repeat(500)), AspectRatio::Square);
		let last = layout.caption.last().unwrap();

		assert!(last.ends_with("..."));
		assert!(last.chars().count() <= columns(CAPTION_SCALE));
	}

	#[test]
	fn test_theme_sets_background() {
		let dark = image::load_from_memory(&render(&card(""), Theme::Dark, AspectRatio::Square).unwrap())
			.unwrap()
			.to_rgb8();
		let light = image::load_from_memory(&render(&card(""), Theme::Light, AspectRatio::Square).unwrap())
			.unwrap()
			.to_rgb8();

		assert_eq!(dark.get_pixel(WIDTH - 1, WIDTH - 1), &Rgb([0x18, 0x18, 0x1B]));
		assert_eq!(light.get_pixel(WIDTH - 1, WIDTH - 1), &Rgb([0xFA, 0xFA, 0xFA]));
	}

	#[tokio::test]
	async fn test_render_off_runtime() {
		let png = render_png(card("Caption with unicode: café"), Theme::Light, AspectRatio::Auto)
			.await
			.unwrap();

		assert_eq!(&png[1..4], b"PNG");
	}
}
