//! # Weather Pictogram Classification and Drawing
//!
//! The payload describes weather two ways: current conditions carry an
//! OpenWeatherMap icon code ("01d".."50n"), forecast entries only a
//! free-text condition label ("Rain", "Clouds", ...). Both collapse into
//! one closed set of pictogram categories here.
//!
//! Classification is ordered: exact numeric-prefix codes are checked before
//! condition keywords, and the first match wins. Anything unrecognized gets
//! the bare Unknown marker rather than an error; an unfamiliar icon code is
//! a cosmetic anomaly, never a cycle failure.
//!
//! Drawing uses embedded-graphics primitives only (circles, lines, filled
//! triangles, rounded rectangles), sized to a square bounding box so the
//! same routines serve the large current-weather icon and the small
//! forecast-card ones.

use crate::epd7in3f::Paint;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, Line, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle,
};

/// Closed set of weather pictogram categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pictogram {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
    Unknown,
}

/// Classify an icon code and/or condition label into a pictogram.
///
/// The icon code's two-digit prefix is authoritative when present (current
/// weather always has one); the keyword scan over the condition label covers
/// forecast entries, which carry no code. First match wins.
pub fn classify(icon: &str, condition: &str) -> Pictogram {
    // OpenWeatherMap numeric prefixes, exact match, checked first
    match icon.get(..2) {
        Some("01") => return Pictogram::Clear,
        Some("02") => return Pictogram::PartlyCloudy,
        Some("03") | Some("04") => return Pictogram::Cloudy,
        Some("09") | Some("10") => return Pictogram::Rain,
        Some("11") => return Pictogram::Thunderstorm,
        Some("13") => return Pictogram::Snow,
        Some("50") => return Pictogram::Mist,
        _ => {}
    }

    // Free-text condition keywords, fixed priority order
    let text = condition.to_ascii_lowercase();
    if text.contains("thunder") || text.contains("storm") {
        Pictogram::Thunderstorm
    } else if text.contains("snow") || text.contains("sleet") {
        Pictogram::Snow
    } else if text.contains("rain") || text.contains("drizzle") || text.contains("shower") {
        Pictogram::Rain
    } else if text.contains("mist") || text.contains("fog") || text.contains("haze") {
        Pictogram::Mist
    } else if text.contains("cloud") || text.contains("overcast") {
        Pictogram::Cloudy
    } else if text.contains("clear") || text.contains("sun") {
        Pictogram::Clear
    } else {
        Pictogram::Unknown
    }
}

/// Draw a pictogram into the square box at `top_left` with edge `size`.
pub fn draw_pictogram<D>(target: &mut D, pictogram: Pictogram, top_left: Point, size: u32)
where
    D: DrawTarget<Color = Paint>,
{
    match pictogram {
        Pictogram::Clear => draw_sun(target, top_left, size),
        Pictogram::PartlyCloudy => {
            // Sun peeking out behind an offset cloud
            let sun_size = size * 6 / 10;
            draw_sun(target, top_left, sun_size);
            let cloud_origin = Point::new(
                top_left.x + size as i32 / 4,
                top_left.y + size as i32 * 2 / 5,
            );
            draw_cloud(target, cloud_origin, size * 3 / 4);
        }
        Pictogram::Cloudy => draw_cloud(target, top_left, size),
        Pictogram::Rain => {
            draw_cloud(target, top_left, size * 3 / 4);
            draw_drops(target, top_left, size, Paint::Blue);
        }
        Pictogram::Thunderstorm => {
            draw_cloud(target, top_left, size * 3 / 4);
            draw_bolt(target, top_left, size);
        }
        Pictogram::Snow => {
            draw_cloud(target, top_left, size * 3 / 4);
            draw_flakes(target, top_left, size);
        }
        Pictogram::Mist => draw_mist(target, top_left, size),
        Pictogram::Unknown => {
            // Bare marker shape: an empty circle
            Circle::new(top_left, size)
                .into_styled(PrimitiveStyle::with_stroke(Paint::Black, 2))
                .draw(target)
                .ok();
        }
    }
}

fn draw_sun<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32) {
    let margin = size as i32 / 5;
    let disc = size - 2 * margin as u32;
    Circle::new(Point::new(top_left.x + margin, top_left.y + margin), disc)
        .into_styled(PrimitiveStyle::with_fill(Paint::Yellow))
        .draw(target)
        .ok();

    // Four straight rays
    let center = Point::new(
        top_left.x + size as i32 / 2,
        top_left.y + size as i32 / 2,
    );
    let reach = size as i32 / 2;
    let inner = reach - margin / 2;
    let style = PrimitiveStyle::with_stroke(Paint::Orange, 2);
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        Line::new(
            Point::new(center.x + dx * inner, center.y + dy * inner),
            Point::new(center.x + dx * reach, center.y + dy * reach),
        )
        .into_styled(style)
        .draw(target)
        .ok();
    }
}

fn draw_cloud<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32) {
    let fill = PrimitiveStyle::with_fill(Paint::Black);
    let lobe = size / 2;

    // Two overlapping lobes over a flat rounded base
    Circle::new(Point::new(top_left.x, top_left.y + size as i32 / 5), lobe)
        .into_styled(fill)
        .draw(target)
        .ok();
    Circle::new(
        Point::new(top_left.x + size as i32 * 2 / 5, top_left.y),
        lobe,
    )
    .into_styled(fill)
    .draw(target)
    .ok();
    RoundedRectangle::with_equal_corners(
        Rectangle::new(
            Point::new(top_left.x, top_left.y + size as i32 * 2 / 5),
            Size::new(size, size * 3 / 10),
        ),
        Size::new(size / 8, size / 8),
    )
    .into_styled(fill)
    .draw(target)
    .ok();
}

fn draw_drops<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32, ink: Paint) {
    let style = PrimitiveStyle::with_stroke(ink, 2);
    let base_y = top_left.y + size as i32 * 7 / 10;
    let length = size as i32 / 5;
    for i in 0..3 {
        let x = top_left.x + size as i32 * (2 * i + 1) / 8;
        // Slanted streaks
        Line::new(
            Point::new(x + length / 3, base_y),
            Point::new(x, base_y + length),
        )
        .into_styled(style)
        .draw(target)
        .ok();
    }
}

fn draw_bolt<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32) {
    let s = size as i32;
    let x = top_left.x + s / 3;
    let y = top_left.y + s * 3 / 5;
    Triangle::new(
        Point::new(x + s / 6, y),
        Point::new(x, y + s / 4),
        Point::new(x + s / 8, y + s / 4),
    )
    .into_styled(PrimitiveStyle::with_fill(Paint::Yellow))
    .draw(target)
    .ok();
    Triangle::new(
        Point::new(x + s / 8, y + s / 8),
        Point::new(x + s / 4, y + s / 8),
        Point::new(x + s / 16, y + s * 2 / 5),
    )
    .into_styled(PrimitiveStyle::with_fill(Paint::Yellow))
    .draw(target)
    .ok();
}

fn draw_flakes<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32) {
    let style = PrimitiveStyle::with_fill(Paint::Blue);
    let base_y = top_left.y + size as i32 * 7 / 10;
    let dot = (size / 10).max(2);
    for i in 0..3 {
        let x = top_left.x + size as i32 * (2 * i + 1) / 8;
        Circle::new(Point::new(x, base_y + (i % 2) * dot as i32), dot)
            .into_styled(style)
            .draw(target)
            .ok();
    }
}

fn draw_mist<D: DrawTarget<Color = Paint>>(target: &mut D, top_left: Point, size: u32) {
    let style = PrimitiveStyle::with_stroke(Paint::Black, 2);
    for i in 0..4 {
        let y = top_left.y + size as i32 * (i * 2 + 2) / 10;
        let inset = if i % 2 == 0 { 0 } else { size as i32 / 8 };
        Line::new(
            Point::new(top_left.x + inset, y),
            Point::new(top_left.x + size as i32 - inset, y),
        )
        .into_styled(style)
        .draw(target)
        .ok();
    }
}
