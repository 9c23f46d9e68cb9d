mod common;

use ivm_map::render::{self, RenderOptions};
use ivm_map::{Loader, MapConfig, MapContext};
use std::fs;

fn ready_map() -> MapContext {
    let (_dir, source) = common::temp_source(true, true);
    let mut map = MapContext::new(MapConfig::default());
    map.init(&Loader::default(), &source).unwrap();
    map.add_legend().unwrap();
    map
}

#[test]
fn svg_has_features_legend_and_labels() {
    let mut map = ready_map();
    map.click("002").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let opts = RenderOptions {
        title: Some("IVM-COVID-19".into()),
        fit: true,
        ..Default::default()
    };
    render::render_map(&map, &path, &opts).unwrap();

    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<polygon"));
    assert!(svg.contains("Cubatão"));
    assert!(svg.contains("0.8+"));
    assert!(svg.contains("INPE"));
}

#[test]
fn png_is_written() {
    let map = ready_map();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.png");
    render::render_map(&map, &path, &RenderOptions::default()).unwrap();
    let meta = fs::metadata(&path).expect("file created");
    assert!(meta.len() > 0, "png has content");
}

#[test]
fn rgb_buffer_matches_canvas() {
    let map = ready_map();
    let viewport = RenderOptions {
        width: 200,
        height: 100,
        fit: true,
        ..Default::default()
    }
    .viewport_for(&map)
    .unwrap();
    let buf = render::render_rgb(&map, &viewport, (200, 100)).unwrap();
    assert_eq!(buf.len(), 200 * 100 * 3);
    // The layer fills the centre of a fitted view, so it is not background.
    let centre = (50 * 200 + 100) * 3;
    assert_ne!(&buf[centre..centre + 3], &[242, 242, 240]);
}

#[test]
fn rendering_requires_a_map() {
    let map = MapContext::new(MapConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let err = render::render_map(&map, dir.path().join("x.svg"), &RenderOptions::default());
    assert!(err.is_err());
}
