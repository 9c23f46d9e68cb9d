//! Web Mercator viewport maths and the base tile layer descriptor.

use geo::{Coord, Rect, coord};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Pixel size of a zoom-0 world.
pub const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Map centre (`x` = longitude, `y` = latitude) and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coord<f64>,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(lat: f64, lon: f64, zoom: f64) -> Self {
        Self {
            center: coord! { x: lon, y: lat },
            zoom,
        }
    }

    /// Canvas pixel of a geographic coordinate for a canvas of `size` pixels.
    pub fn project(&self, c: Coord<f64>, size: (u32, u32)) -> (f64, f64) {
        let (cx, cy) = world_pixel(self.center, self.zoom);
        let (px, py) = world_pixel(c, self.zoom);
        (
            px - cx + f64::from(size.0) / 2.0,
            py - cy + f64::from(size.1) / 2.0,
        )
    }

    /// Geographic coordinate under a canvas pixel.
    pub fn unproject(&self, pixel: (f64, f64), size: (u32, u32)) -> Coord<f64> {
        let (cx, cy) = world_pixel(self.center, self.zoom);
        let wx = pixel.0 - f64::from(size.0) / 2.0 + cx;
        let wy = pixel.1 - f64::from(size.1) / 2.0 + cy;
        from_world_pixel((wx, wy), self.zoom)
    }

    /// Centre on `bounds` (in projected space) at the largest whole zoom, up
    /// to `max_zoom`, that shows all of it.
    pub fn fit_bounds(bounds: Rect<f64>, size: (u32, u32), max_zoom: f64) -> Self {
        let (x0, y0) = world_pixel(coord! { x: bounds.min().x, y: bounds.max().y }, 0.0);
        let (x1, y1) = world_pixel(coord! { x: bounds.max().x, y: bounds.min().y }, 0.0);
        let (dx, dy) = ((x1 - x0).abs(), (y1 - y0).abs());
        let sx = if dx > 0.0 { f64::from(size.0) / dx } else { f64::INFINITY };
        let sy = if dy > 0.0 { f64::from(size.1) / dy } else { f64::INFINITY };
        let scale = sx.min(sy);
        let zoom = if scale.is_finite() {
            scale.log2().floor().clamp(0.0, max_zoom)
        } else {
            max_zoom
        };
        Self {
            center: from_world_pixel(((x0 + x1) / 2.0, (y0 + y1) / 2.0), 0.0),
            zoom,
        }
    }
}

/// Position of `c` on the world pixel plane at `zoom`.
pub fn world_pixel(c: Coord<f64>, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (c.x + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

fn from_world_pixel(p: (f64, f64), zoom: f64) -> Coord<f64> {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lon = p.0 / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * p.1 / scale;
    let lat = n.sinh().atan().to_degrees();
    coord! { x: lon, y: lat }
}

/// Base tile layer. Tiles are referenced, never fetched or drawn by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayer {
    /// Template with `{id}`, `{z}`, `{x}`, `{y}` and `{accessToken}` placeholders.
    pub url: String,
    pub id: String,
    pub access_token: Option<String>,
    pub max_zoom: u8,
    pub tile_size: u32,
    pub zoom_offset: i32,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url: "https://api.mapbox.com/styles/v1/{id}/tiles/{z}/{x}/{y}?access_token={accessToken}"
                .into(),
            id: "mapbox/light-v9".into(),
            access_token: None,
            max_zoom: 18,
            tile_size: 512,
            zoom_offset: -1,
            attribution: "Map data &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors, \
                          Imagery &copy; <a href=\"https://www.mapbox.com/\">Mapbox</a>"
                .into(),
        }
    }
}

impl TileLayer {
    /// URL of tile `(x, y)` at map zoom `z`, with the zoom offset applied.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        let z = (i32::from(z) + self.zoom_offset).max(0);
        self.url
            .replace("{id}", &self.id)
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{accessToken}", self.access_token.as_deref().unwrap_or(""))
    }

    /// Tile indices containing `c` at tile zoom `z`.
    pub fn tile_for(c: Coord<f64>, z: u8) -> (u32, u32) {
        let (x, y) = world_pixel(c, f64::from(z));
        ((x / TILE_SIZE) as u32, (y / TILE_SIZE) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_projects_to_canvas_middle() {
        let v = Viewport::new(-23.0, -45.0, 8.0);
        let (x, y) = v.project(v.center, (800, 600));
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn unproject_inverts_project() {
        let v = Viewport::new(-22.5, -46.0, 7.0);
        let c = coord! { x: -45.3, y: -23.7 };
        let p = v.project(c, (1000, 700));
        let back = v.unproject(p, (1000, 700));
        assert!((back.x - c.x).abs() < 1e-9);
        assert!((back.y - c.y).abs() < 1e-9);
    }

    #[test]
    fn fit_bounds_shows_everything() {
        let bounds = Rect::new(coord! { x: -48.0, y: -25.0 }, coord! { x: -44.0, y: -20.0 });
        let size = (1000, 700);
        let v = Viewport::fit_bounds(bounds, size, 18.0);
        assert!((v.center.x - bounds.center().x).abs() < 1e-9);
        for corner in [bounds.min(), bounds.max()] {
            let (x, y) = v.project(corner, size);
            assert!((0.0..=1000.0).contains(&x) && (0.0..=700.0).contains(&y));
        }
        let tighter = Viewport { zoom: v.zoom + 1.0, ..v };
        let (x, _) = tighter.project(bounds.min(), size);
        let (_, y) = tighter.project(bounds.min(), size);
        assert!(x < 0.0 || y > 700.0);
    }

    #[test]
    fn tile_urls() {
        let layer = TileLayer {
            access_token: Some("tok".into()),
            ..Default::default()
        };
        assert_eq!(
            layer.tile_url(8, 95, 145),
            "https://api.mapbox.com/styles/v1/mapbox/light-v9/tiles/7/95/145?access_token=tok"
        );
        assert_eq!(TileLayer::tile_for(coord! { x: 0.0, y: 0.0 }, 1), (1, 1));
        assert_eq!(TileLayer::tile_for(coord! { x: -179.9, y: 85.0 }, 3), (0, 0));
    }
}
