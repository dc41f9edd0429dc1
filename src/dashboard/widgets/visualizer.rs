//! The central amplitude visualizer (spec §4.9): a circle whose radius
//! and color track the current [`Mode`](crate::dashboard::state::Mode).
//!
//! Grounded on ColdVox's `Gauge`/`Sparkline` audio-level widgets, swapped
//! for a `ratatui::widgets::canvas::Circle` since the spec specifically
//! calls for a pulsing circle rather than a bar.

use crate::dashboard::state::{DashboardState, Mode};
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::canvas::{Canvas, Circle};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use std::time::Instant;

/// Rotating marker angle for `Thinking` mode and breathing phase for
/// `Idle`/`Listening`, derived from wall-clock time so no extra state is
/// threaded through [`DashboardState`] just for animation.
fn phase(started_at: Instant, hz: f32) -> f32 {
    let t = started_at.elapsed().as_secs_f32();
    (t * hz * std::f32::consts::TAU).sin()
}

pub fn render(frame: &mut Frame, area: Rect, state: &DashboardState, started_at: Instant) {
    let color = state.mode.color();
    let base_radius = state.visualizer_radius() as f64;

    // Character cells are roughly twice as tall as wide; halve the
    // y-distance so the rendered shape reads as a circle (spec §4.9).
    let y_scale = 0.5;

    let breathing = match state.mode {
        Mode::Idle => 1.0 + 0.1 * phase(started_at, 0.3),
        Mode::Listening => 1.0 + 0.15 * phase(started_at, 0.6),
        Mode::Thinking => 1.0,
        Mode::Speaking | Mode::Error => 1.0,
    };

    let radius = (base_radius * breathing as f64).max(0.5);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(state.mode.label());

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([-12.0, 12.0])
        .y_bounds([-12.0, 12.0])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius,
                color,
            });
            if state.mode == Mode::Thinking {
                let angle = started_at.elapsed().as_secs_f64() * 2.0;
                let marker_x = radius * angle.cos();
                let marker_y = radius * angle.sin() * y_scale;
                ctx.draw(&Circle {
                    x: marker_x,
                    y: marker_y,
                    radius: 0.5,
                    color: Color::White,
                });
            }
        });

    frame.render_widget(canvas, area);
}
