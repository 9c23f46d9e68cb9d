use ivm_map::models::LegendConfig;
use ivm_map::{Classifier, Method};

fn series() -> Vec<f64> {
    vec![0.12, 0.55, 0.31, 0.78, 0.64, 0.05, 0.47, 0.91, 0.33, 0.29, 0.70, 0.58]
}

#[test]
fn classification_is_deterministic() {
    for method in [Method::Jenks, Method::Quantile, Method::EqualInterval] {
        let classifier = Classifier::new(5, method, "RdYlGn");
        let a = classifier.classify(&series()).unwrap();
        let mut shuffled = series();
        shuffled.reverse();
        let b = classifier.classify(&shuffled).unwrap();
        assert_eq!(a, b, "{method} depends on input order");
        assert_eq!(a.breaks.len(), 6);
        assert!(a.breaks.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(a.breaks[0], 0.05);
        assert_eq!(a.breaks[5], 0.91);
    }
}

#[test]
fn every_value_gets_a_class() {
    let c = Classifier::default().classify(&series()).unwrap();
    assert_eq!(c.classes(), 10);
    for v in series() {
        assert!(c.color(v).is_some(), "{v} has no color");
    }
}

#[test]
fn legend_document_overrides_only_what_it_sets() {
    let legend = LegendConfig {
        palette: Some("Blues".into()),
        method: Some("bogus".into()),
        ..Default::default()
    };
    let c = Classifier::default().with_legend(&legend);
    assert_eq!(c.palette, "Blues");
    assert_eq!(c.classes, 10);
    assert_eq!(c.method, Method::Jenks);
}
