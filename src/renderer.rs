//! # Render Dispatching
//!
//! This module turns a [`CycleOutcome`] into a completed, flushed frame. It
//! owns the single mode decision: a successful cycle gets the prayer-times
//! layout, a failed one gets the error panel. Rendering has no failure mode
//! of its own; draw calls that fall outside the frame clip silently.
//!
//! The display collaborator is the [`FrameSink`] trait: hand out a frame to
//! draw on, then flush it through the panel's full-refresh cycle. Rendering
//! is idempotent per call; every frame starts from a cleared white target,
//! so the same outcome always produces byte-identical pixels.
//!
//! Layout geometry comes from the declarative [`Theme`] instead of being
//! baked into the draw code, so alternate panel sizes and layouts are a
//! config change, not a second renderer.

use crate::config::DisplayConfig;
use crate::epd7in3f::{FrameBuffer, Paint};
use crate::icons::{self, Pictogram};
use crate::{CycleOutcome, DisplaySnapshot, FailureReason};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_6X13};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::Text;

/// The display collaborator seam: a frame to draw on, then a flush that
/// drives the panel through its documented full-refresh sequence.
pub trait FrameSink {
    type Target: DrawTarget<Color = Paint>;

    /// The frame being built. The render dispatcher clears it first; sinks
    /// never hand out stale pixels.
    fn frame(&mut self) -> &mut Self::Target;

    /// Commit the completed frame and park the panel.
    fn flush(&mut self);
}

/// In-memory sink for tests and development mode.
pub struct BufferSink {
    buffer: FrameBuffer,
    pub flush_count: usize,
}

impl BufferSink {
    pub fn new(width: u32, height: u32) -> Self {
        BufferSink {
            buffer: FrameBuffer::new(width, height),
            flush_count: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }
}

impl FrameSink for BufferSink {
    type Target = FrameBuffer;

    fn frame(&mut self) -> &mut FrameBuffer {
        &mut self.buffer
    }

    fn flush(&mut self) {
        self.flush_count += 1;
    }
}

/// Declarative layout values, derived from the display config.
#[derive(Clone, Debug)]
pub struct Theme {
    pub width: u32,
    pub height: u32,
    /// Vertical pitch of one prayer row
    pub row_height: u32,
    /// Left edge of the prayer name column
    pub label_x: i32,
    /// Right edge the time values are aligned against
    pub time_right_x: i32,
    /// Number of forecast cards drawn
    pub forecast_cards: usize,
}

impl Theme {
    pub fn from_config(display: &DisplayConfig) -> Self {
        Theme {
            width: display.width,
            height: display.height,
            row_height: display.row_height,
            label_x: display.label_x as i32,
            time_right_x: display.time_right_x as i32,
            forecast_cards: display.forecast_cards,
        }
    }
}

/// Pixel width of `text` in the given mono font, for right alignment.
fn text_width(text: &str, font: &MonoFont) -> i32 {
    let advance = font.character_size.width + font.character_spacing;
    (text.chars().count() as u32 * advance) as i32
}

/// Render an outcome to a completed, flushed frame.
pub fn render<S: FrameSink>(outcome: &CycleOutcome, theme: &Theme, sink: &mut S) {
    let frame = sink.frame();
    frame.clear(Paint::White).ok();

    match outcome {
        CycleOutcome::Rendered(snapshot) => draw_snapshot(frame, theme, snapshot),
        CycleOutcome::Failed(reason) => draw_error(frame, theme, reason),
    }

    sink.flush();
}

// -- Success layout --

fn draw_snapshot<D: DrawTarget<Color = Paint>>(
    frame: &mut D,
    theme: &Theme,
    snapshot: &DisplaySnapshot,
) {
    draw_header(frame, theme, &snapshot.prayers.location);
    draw_prayer_rows(frame, theme, snapshot);
    draw_weather(frame, theme, snapshot);
    draw_forecast_cards(frame, theme, snapshot);

    if !snapshot.updated.is_empty() {
        let footer = format!("Updated: {}", snapshot.updated);
        let small = MonoTextStyle::new(&FONT_6X10, Paint::Black);
        Text::new(
            &footer,
            Point::new(theme.label_x, theme.height as i32 - 12),
            small,
        )
        .draw(frame)
        .ok();
    }
}

fn draw_header<D: DrawTarget<Color = Paint>>(frame: &mut D, theme: &Theme, location: &str) {
    let style = MonoTextStyle::new(&FONT_10X20, Paint::Black);
    let title = if location.is_empty() {
        "Prayer Times".to_string()
    } else {
        format!("Prayer Times - {location}")
    };
    Text::new(&title, Point::new(theme.label_x, 40), style)
        .draw(frame)
        .ok();

    Line::new(
        Point::new(theme.label_x, 55),
        Point::new(theme.width as i32 - theme.label_x, 55),
    )
    .into_styled(PrimitiveStyle::with_stroke(Paint::Black, 2))
    .draw(frame)
    .ok();
}

fn draw_prayer_rows<D: DrawTarget<Color = Paint>>(
    frame: &mut D,
    theme: &Theme,
    snapshot: &DisplaySnapshot,
) {
    let label_style = MonoTextStyle::new(&FONT_10X20, Paint::Black);
    let rule = PrimitiveStyle::with_stroke(Paint::Black, 1);
    let top = 80;

    for (row, (name, time)) in snapshot.prayers.rows().iter().enumerate() {
        let baseline = top + (row as u32 * theme.row_height) as i32 + 20;

        // Fajr is the row this display exists for
        let ink = if row == 0 { Paint::Red } else { Paint::Black };
        let time_style = MonoTextStyle::new(&FONT_10X20, ink);

        Text::new(name, Point::new(theme.label_x, baseline), label_style)
            .draw(frame)
            .ok();

        // Right-align the time on its measured width so values line up
        // regardless of digit count
        let time_x = theme.time_right_x - text_width(time, &FONT_10X20);
        Text::new(time, Point::new(time_x, baseline), time_style)
            .draw(frame)
            .ok();

        let rule_y = baseline + 14;
        Line::new(
            Point::new(theme.label_x, rule_y),
            Point::new(theme.time_right_x, rule_y),
        )
        .into_styled(rule)
        .draw(frame)
        .ok();
    }
}

fn draw_weather<D: DrawTarget<Color = Paint>>(
    frame: &mut D,
    theme: &Theme,
    snapshot: &DisplaySnapshot,
) {
    let weather = &snapshot.weather;
    let x = theme.time_right_x + 60;
    let style = MonoTextStyle::new(&FONT_10X20, Paint::Black);
    let small = MonoTextStyle::new(&FONT_6X13, Paint::Black);

    let pictogram = icons::classify(&weather.icon, &weather.condition);
    icons::draw_pictogram(frame, pictogram, Point::new(x, 80), 96);

    let text_x = x + 120;
    let temperature = format!("{} C", weather.temperature);
    Text::new(&temperature, Point::new(text_x, 110), style)
        .draw(frame)
        .ok();
    Text::new(&weather.condition, Point::new(text_x, 138), small)
        .draw(frame)
        .ok();

    let details = format!(
        "feels {} C  {}%  {:.1} m/s",
        weather.feels_like, weather.humidity, weather.wind_speed
    );
    Text::new(&details, Point::new(x, 200), small)
        .draw(frame)
        .ok();
}

fn draw_forecast_cards<D: DrawTarget<Color = Paint>>(
    frame: &mut D,
    theme: &Theme,
    snapshot: &DisplaySnapshot,
) {
    let small = MonoTextStyle::new(&FONT_6X13, Paint::Black);
    let card_width: u32 = 104;
    let card_height: u32 = 130;
    let gap: u32 = 16;
    let left = theme.time_right_x + 40;
    let top = 240;

    for (slot, entry) in snapshot
        .forecast
        .iter()
        .take(theme.forecast_cards)
        .enumerate()
    {
        let card_x = left + (slot as u32 * (card_width + gap)) as i32;

        RoundedRectangle::with_equal_corners(
            Rectangle::new(
                Point::new(card_x, top),
                Size::new(card_width, card_height),
            ),
            Size::new(8, 8),
        )
        .into_styled(PrimitiveStyle::with_stroke(Paint::Black, 2))
        .draw(frame)
        .ok();

        Text::new(&entry.date, Point::new(card_x + 10, top + 22), small)
            .draw(frame)
            .ok();

        let pictogram = icons::classify("", &entry.condition);
        icons::draw_pictogram(frame, pictogram, Point::new(card_x + 28, top + 34), 48);

        let range = format!("{}/{}", entry.high, entry.low);
        Text::new(&range, Point::new(card_x + 10, top + 112), small)
            .draw(frame)
            .ok();
    }
}

// -- Error layout --

fn draw_error<D: DrawTarget<Color = Paint>>(frame: &mut D, theme: &Theme, reason: &FailureReason) {
    let headline = MonoTextStyle::new(&FONT_10X20, Paint::Red);
    let body = MonoTextStyle::new(&FONT_10X20, Paint::Black);

    Text::new("Error:", Point::new(theme.label_x, 60), headline)
        .draw(frame)
        .ok();
    let text = reason.to_string();
    Text::new(&text, Point::new(theme.label_x, 120), body)
        .draw(frame)
        .ok();
}

// -- ASCII development mode --

/// Render an outcome to the terminal for `--stdout` development runs.
pub fn draw_ascii(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Failed(reason) => {
            println!("Error: {reason}");
        }
        CycleOutcome::Rendered(snapshot) => {
            if snapshot.prayers.location.is_empty() {
                println!("Prayer Times");
            } else {
                println!("Prayer Times - {}", snapshot.prayers.location);
            }
            println!("{}", "-".repeat(28));
            for (name, time) in snapshot.prayers.rows() {
                println!("{name:<10}{time:>10}");
            }
            println!();
            let weather = &snapshot.weather;
            println!(
                "Now: {} C ({}), {}% humidity, {:.1} m/s wind",
                weather.temperature, weather.condition, weather.humidity, weather.wind_speed
            );
            for entry in &snapshot.forecast {
                println!("  {:<8}{:>3}/{:<3} {}", entry.date, entry.high, entry.low, entry.condition);
            }
            if !snapshot.updated.is_empty() {
                println!("\nUpdated: {}", snapshot.updated);
            }
        }
    }
}
