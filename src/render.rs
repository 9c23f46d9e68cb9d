//! Drawing a [`MapContext`] to **SVG** or **PNG** (or an in-memory RGB buffer).
//!
//! - Features are drawn in layer order, so the selected feature is on top
//! - Unstyled (neutral) features use the stock web-map path style
//! - Legend rows, info box, title and attribution are drawn as overlays
//!
//! No font is bundled, so text is only emitted for SVG output; bitmap output
//! carries geometry and legend swatches.

use crate::error::{MapError, Result};
use crate::legend::{LegendControl, html_to_text};
use crate::map::{MapContext, Viewport};
use crate::palette::Rgb;
use crate::style::PathStyle;
use crate::text::{estimate_text_width_px, truncate_to_width};
use geo::{Coord, LineString};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

const BACKGROUND: RGBColor = RGBColor(242, 242, 240);
/// Stroke used for features that have no style of their own.
const NEUTRAL_STROKE: RGBColor = RGBColor(0x33, 0x88, 0xff);
const NEUTRAL_WEIGHT: f64 = 3.0;
const NEUTRAL_FILL_OPACITY: f64 = 0.2;
const PANEL_BG: RGBAColor = RGBAColor(255, 255, 255, 0.85);
const ATTRIBUTION_TEXT: RGBColor = RGBColor(80, 80, 80);
const FONT_PX: u32 = 13;
const INFO_MAX_PX: u32 = 320;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    /// Draw text (title, info box, legend labels, attribution). SVG only.
    pub labels: bool,
    pub legend: bool,
    /// Fit the whole layer into the canvas instead of using the map's viewport.
    pub fit: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
            title: None,
            labels: true,
            legend: true,
            fit: false,
        }
    }
}

impl RenderOptions {
    /// Viewport the map will be drawn with.
    pub fn viewport_for(&self, ctx: &MapContext) -> Result<Viewport> {
        let view = ctx.view().ok_or(MapError::NotLoaded("map"))?;
        if self.fit {
            if let Some(bounds) = ctx.layer().and_then(|l| l.bounds()) {
                return Ok(Viewport::fit_bounds(
                    bounds,
                    (self.width, self.height),
                    f64::from(view.tiles.max_zoom),
                ));
            }
        }
        Ok(view.viewport)
    }
}

fn render_err<E: std::fmt::Debug>(e: E) -> MapError {
    MapError::Render(format!("{e:?}"))
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Render to `out_path`; `.svg` selects the SVG backend, anything else PNG.
pub fn render_map<P: AsRef<Path>>(ctx: &MapContext, out_path: P, opts: &RenderOptions) -> Result<()> {
    let out_path = out_path.as_ref();
    let viewport = opts.viewport_for(ctx)?;
    let size = (opts.width, opts.height);

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(out_path, size).into_drawing_area();
        draw_map(&root, ctx, &viewport, opts)?;
        root.present().map_err(render_err)?;
    } else {
        if opts.labels {
            log::warn!("bitmap output has no font; labels are skipped");
        }
        let opts = RenderOptions {
            labels: false,
            ..opts.clone()
        };
        let root = BitMapBackend::new(out_path, size).into_drawing_area();
        draw_map(&root, ctx, &viewport, &opts)?;
        root.present().map_err(render_err)?;
    }
    log::info!("wrote map to {}", out_path.display());
    Ok(())
}

/// Render into an RGB buffer (`width * height * 3` bytes), without text.
pub fn render_rgb(ctx: &MapContext, viewport: &Viewport, size: (u32, u32)) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size.0 as usize * size.1 as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
        let opts = RenderOptions {
            width: size.0,
            height: size.1,
            labels: false,
            legend: false,
            ..Default::default()
        };
        draw_map(&root, ctx, viewport, &opts)?;
        root.present().map_err(render_err)?;
    }
    Ok(buf)
}

fn ring_pixels(ring: &LineString<f64>, viewport: &Viewport, size: (u32, u32)) -> Vec<(i32, i32)> {
    ring.coords()
        .map(|c: &Coord<f64>| {
            let (x, y) = viewport.project(*c, size);
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

/// Draw the whole map onto `root`.
pub fn draw_map<DB>(
    root: &DrawingArea<DB, Shift>,
    ctx: &MapContext,
    viewport: &Viewport,
    opts: &RenderOptions,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&BACKGROUND).map_err(render_err)?;
    let size = root.dim_in_pixel();

    let geometry = ctx.geometry().ok_or(MapError::NotLoaded("geometry"))?;
    let layer = ctx.layer().ok_or(MapError::NotLoaded("geometry layer"))?;

    for entry in layer.draw_order() {
        let feature = &geometry.features[entry.feature];
        draw_feature(root, &feature.geometry, &entry.style, viewport, size)?;
    }

    let view = ctx.view().ok_or(MapError::NotLoaded("map"))?;
    if opts.legend {
        if let Some(legend) = &view.legend {
            draw_legend(root, legend, size, opts.labels)?;
        }
    }
    if opts.labels {
        draw_text_box(root, &view.info.lines(), (size.0 as i32 - 12, 12))?;
        if let Some(title) = &opts.title {
            let style = TextStyle::from((FontFamily::SansSerif, FONT_PX + 5)).color(&BLACK);
            root.draw(&Text::new(title.clone(), (14, 14), style))
                .map_err(render_err)?;
        }
        let attribution = view.attribution.text();
        let style = TextStyle::from((FontFamily::SansSerif, FONT_PX - 2)).color(&ATTRIBUTION_TEXT);
        root.draw(&Text::new(attribution, (6, size.1 as i32 - 16), style))
            .map_err(render_err)?;
    }
    Ok(())
}

fn draw_feature<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    geometry: &geo::MultiPolygon<f64>,
    style: &PathStyle,
    viewport: &Viewport,
    size: (u32, u32),
) -> Result<()> {
    let dash = style.dash_pattern();
    let (stroke, weight, opacity, fill, fill_opacity) = if style.is_neutral() {
        (NEUTRAL_STROKE, NEUTRAL_WEIGHT, 1.0, NEUTRAL_STROKE, NEUTRAL_FILL_OPACITY)
    } else {
        let stroke = style.color.map(rgb).unwrap_or(NEUTRAL_STROKE);
        let fill = style.fill_color.map(rgb).unwrap_or(stroke);
        (
            stroke,
            style.weight.unwrap_or(NEUTRAL_WEIGHT),
            style.opacity.unwrap_or(1.0),
            fill,
            // Without a class color the fill falls back to a faint stroke tint.
            if style.fill_color.is_some() {
                style.fill_opacity.unwrap_or(NEUTRAL_FILL_OPACITY)
            } else {
                NEUTRAL_FILL_OPACITY
            },
        )
    };

    for polygon in geometry {
        let exterior = ring_pixels(polygon.exterior(), viewport, size);
        if exterior.len() < 3 {
            continue;
        }
        root.draw(&Polygon::new(exterior.clone(), fill.mix(fill_opacity).filled()))
            .map_err(render_err)?;
        let line = stroke.mix(opacity).stroke_width(weight.round().max(1.0) as u32);
        // Holes are outlined, not cut out.
        let rings = std::iter::once(exterior)
            .chain(polygon.interiors().iter().map(|r| ring_pixels(r, viewport, size)));
        for ring in rings {
            for run in dash_runs(&ring, &dash) {
                root.draw(&PathElement::new(run, line)).map_err(render_err)?;
            }
        }
    }
    Ok(())
}

/// Split a polyline into the "on" runs of a stroke/gap dash pattern.
fn dash_runs(points: &[(i32, i32)], pattern: &[f64]) -> Vec<Vec<(i32, i32)>> {
    if pattern.is_empty() || points.len() < 2 {
        return vec![points.to_vec()];
    }
    let mut runs = Vec::new();
    let mut current = vec![points[0]];
    let mut on = true;
    let mut idx = 0;
    let mut left = pattern[0];
    for pair in points.windows(2) {
        let a = (f64::from(pair[0].0), f64::from(pair[0].1));
        let b = (f64::from(pair[1].0), f64::from(pair[1].1));
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        let mut pos = 0.0;
        while len - pos > left {
            pos += left;
            let t = pos / len;
            current.push((
                (a.0 + (b.0 - a.0) * t).round() as i32,
                (a.1 + (b.1 - a.1) * t).round() as i32,
            ));
            if on {
                runs.push(std::mem::take(&mut current));
            }
            on = !on;
            idx = (idx + 1) % pattern.len();
            left = pattern[idx];
        }
        left -= len - pos;
        if on {
            current.push(pair[1]);
        }
    }
    if on && current.len() > 1 {
        runs.push(current);
    }
    runs
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    legend: &LegendControl,
    size: (u32, u32),
    labels: bool,
) -> Result<()> {
    const ROW_H: i32 = 20;
    const SWATCH: i32 = 16;
    let box_w = if labels { 110 } else { SWATCH + 16 };
    let box_h = legend.rows.len() as i32 * ROW_H + 12;
    let x0 = size.0 as i32 - box_w - 12;
    let y0 = size.1 as i32 - box_h - 28;

    root.draw(&Rectangle::new([(x0, y0), (x0 + box_w, y0 + box_h)], PANEL_BG.filled()))
        .map_err(render_err)?;
    for (i, row) in legend.rows.iter().enumerate() {
        let y = y0 + 6 + i as i32 * ROW_H;
        let swatch = match row.color {
            Some(c) => rgb(c).filled(),
            None => TRANSPARENT.filled(),
        };
        root.draw(&Rectangle::new([(x0 + 8, y), (x0 + 8 + SWATCH, y + SWATCH)], swatch))
            .map_err(render_err)?;
        if labels {
            let style = TextStyle::from((FontFamily::SansSerif, FONT_PX)).color(&BLACK);
            root.draw(&Text::new(row.label(), (x0 + 8 + SWATCH + 8, y + 2), style))
                .map_err(render_err)?;
        }
    }
    Ok(())
}

/// Boxed lines of text with its top-right corner at `anchor`.
fn draw_text_box<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    lines: &[String],
    anchor: (i32, i32),
) -> Result<()> {
    let lines: Vec<String> = lines
        .iter()
        .map(|l| truncate_to_width(&html_to_text(l), FONT_PX, INFO_MAX_PX))
        .collect();
    let line_h = FONT_PX as i32 + 5;
    let width = lines
        .iter()
        .map(|l| estimate_text_width_px(l, FONT_PX) as i32)
        .max()
        .unwrap_or(0)
        + 16;
    let height = lines.len() as i32 * line_h + 10;
    let x0 = anchor.0 - width;
    let y0 = anchor.1;

    root.draw(&Rectangle::new([(x0, y0), (x0 + width, y0 + height)], PANEL_BG.filled()))
        .map_err(render_err)?;
    for (i, line) in lines.iter().enumerate() {
        let style = TextStyle::from((FontFamily::SansSerif, FONT_PX)).color(&BLACK);
        root.draw(&Text::new(
            line.clone(),
            (x0 + 8, y0 + 5 + i as i32 * line_h),
            style,
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_line_is_one_run() {
        let pts = [(0, 0), (10, 0)];
        assert_eq!(dash_runs(&pts, &[]), vec![pts.to_vec()]);
    }

    #[test]
    fn dashes_alternate_along_the_path() {
        let runs = dash_runs(&[(0, 0), (10, 0)], &[3.0]);
        assert_eq!(
            runs,
            vec![vec![(0, 0), (3, 0)], vec![(6, 0), (9, 0)]]
        );
    }

    #[test]
    fn dash_continues_around_corners() {
        let runs = dash_runs(&[(0, 0), (2, 0), (2, 2)], &[3.0]);
        assert_eq!(runs[0], vec![(0, 0), (2, 0), (2, 1)]);
    }
}
