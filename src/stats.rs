use crate::classify::Classification;
use crate::models::FeatureCollection;
use crate::palette::Rgb;
use serde::{Deserialize, Serialize};

/// Summary statistics of the indicator over all features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub count: usize,
    /// Features without an indicator value.
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Number of features in one class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassCount {
    pub class: usize,
    pub from: f64,
    pub to: f64,
    pub color: Rgb,
    pub count: usize,
}

pub fn summary(features: &FeatureCollection) -> Summary {
    let mut vals = features.indicator_series();
    let missing = features.len() - vals.len();
    vals.sort_by(f64::total_cmp);
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary { count, missing, min, max, mean, median }
}

/// Features per class of `classification`.
pub fn class_counts(features: &FeatureCollection, classification: &Classification) -> Vec<ClassCount> {
    let mut counts = vec![0usize; classification.classes()];
    for v in features.indicator_series() {
        if let Some(i) = classification.class_of(v) {
            counts[i] += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(class, count)| ClassCount {
            class,
            from: classification.breaks[class],
            to: classification.breaks[class + 1],
            color: classification.colors[class],
            count,
        })
        .collect()
}
