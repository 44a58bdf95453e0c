//! Flow chart rendering
//!
//! Draws the smoothed flow curve with breath markers and a dashed zero-flow
//! line into an in-memory RGB buffer, then encodes it as PNG. Text is drawn
//! with a built-in 5x7 glyph font by [`GlyphBackend`], so rendering works on
//! headless machines without any system fonts.

use std::io::Cursor;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_backend::{
    text_anchor, BackendColor, BackendCoord, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

use crate::config::PlotConfig;
use crate::error::AnalysisError;
use crate::signal::detector::BreathTrace;

const CURVE_COLOR: RGBColor = RGBColor(31, 119, 180);
const ZERO_LINE_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Render the breath trace as PNG bytes
///
/// `x_range` is the time span of the raw (unsmoothed) flow series.
pub fn render_flow_chart(
    trace: &BreathTrace,
    x_range: (f64, f64),
    config: &PlotConfig,
) -> Result<Vec<u8>, AnalysisError> {
    let (width, height) = (config.width.max(64), config.height.max(64));
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    {
        let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
        let root = GlyphBackend::new(backend).into_drawing_area();
        draw_chart(&root, trace, x_range).map_err(|e| AnalysisError::Render(e.to_string()))?;
        root.present().map_err(|e| AnalysisError::Render(e.to_string()))?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| AnalysisError::Render("chart buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| AnalysisError::Render(format!("Failed to encode PNG: {}", e)))?;
    Ok(png)
}

fn y_bounds(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0, f64::min);
    let hi = values.iter().copied().fold(0.0, f64::max);
    let margin = ((hi - lo) * 0.05).max(0.05);
    (lo - margin, hi + margin)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    trace: &BreathTrace,
    (x_lo, x_hi): (f64, f64),
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let x_hi = if x_hi > x_lo { x_hi } else { x_lo + 1.0 };
    let (y_lo, y_hi) = y_bounds(&trace.smoothed);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Time (Seconds)")
        .y_desc("Flow (Liters/Second)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.1}", v))
        .draw()?;

    // Dashed zero-flow reference
    let dash = (x_hi - x_lo) / 120.0;
    chart.draw_series((0..60).map(|i| {
        let start = x_lo + 2.0 * dash * i as f64;
        PathElement::new(
            vec![(start, 0.0), ((start + dash).min(x_hi), 0.0)],
            ZERO_LINE_COLOR.stroke_width(1),
        )
    }))?;

    chart.draw_series(LineSeries::new(
        trace
            .grid
            .iter()
            .copied()
            .zip(trace.smoothed.iter().copied()),
        CURVE_COLOR.stroke_width(2),
    ))?;

    chart.draw_series(
        trace
            .peaks
            .iter()
            .map(|&i| Cross::new((trace.grid[i], trace.smoothed[i]), 4, BLACK.stroke_width(1))),
    )?;

    Ok(())
}

/// Backend wrapper that renders all text with the built-in glyph font
pub struct GlyphBackend<DB> {
    inner: DB,
}

impl<DB> GlyphBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self { inner }
    }
}

/// Integer scale factor of the 5x7 glyphs for a font size in points
fn glyph_scale(size: f64) -> i32 {
    ((size / 10.0).round() as i32).max(1)
}

/// Unrotated pixel extent of `text` at `scale`
fn text_extent(text: &str, scale: i32) -> (i32, i32) {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        return (0, 0);
    }
    let width = chars * (GLYPH_WIDTH + 1) - 1;
    (width * scale, GLYPH_HEIGHT as i32 * scale)
}

impl<DB: DrawingBackend> DrawingBackend for GlyphBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: plotters_backend::BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: plotters_backend::BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: plotters_backend::BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: plotters_backend::BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 || text.trim().is_empty() {
            return Ok(());
        }

        let scale = glyph_scale(style.size());
        let (width, height) = text_extent(text, scale);
        let dx = match style.anchor().h_pos {
            text_anchor::HPos::Left => 0,
            text_anchor::HPos::Right => -width,
            text_anchor::HPos::Center => -width / 2,
        };
        let dy = match style.anchor().v_pos {
            text_anchor::VPos::Top => 0,
            text_anchor::VPos::Center => -height / 2,
            text_anchor::VPos::Bottom => -height,
        };
        let transform = style.transform();

        let mut cursor = 0;
        for ch in text.chars() {
            if let Some(rows) = glyph(ch) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                            continue;
                        }
                        for sx in 0..scale {
                            for sy in 0..scale {
                                let x = dx + cursor + col * scale + sx;
                                let y = dy + row as i32 * scale + sy;
                                let (tx, ty) = transform.transform(x, y);
                                self.inner
                                    .draw_pixel((pos.0 + tx, pos.1 + ty), color)?;
                            }
                        }
                    }
                }
            }
            cursor += (GLYPH_WIDTH + 1) * scale;
        }
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let (w, h) = text_extent(text, glyph_scale(style.size()));
        Ok((w as u32, h as u32))
    }
}

const GLYPH_WIDTH: i32 = 5;
const GLYPH_HEIGHT: usize = 7;

/// 5x7 bitmap for `ch`; letters are drawn upper-case, unknown chars blank
fn glyph(ch: char) -> Option<[u8; GLYPH_HEIGHT]> {
    let rows = match ch.to_ascii_uppercase() {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '/' => [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        _ => return None,
    };
    Some(rows)
}
