//! Classification of an indicator series into colored classes.
//!
//! A [`Classifier`] holds the number of classes, the method and the palette.
//! [`Classifier::classify`] turns a series into a [`Classification`] (the
//! "brew"): `classes + 1` ascending breakpoints and one color per class.
//! The classification is recomputed from scratch for every indicator update.

use crate::error::ClassifyError;
use crate::models::LegendConfig;
use crate::palette::{self, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binning method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    EqualInterval,
    Quantile,
    /// Jenks natural breaks (minimum within-class variance).
    Jenks,
}

impl FromStr for Method {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "equal_interval" => Ok(Method::EqualInterval),
            "quantile" => Ok(Method::Quantile),
            "jenks" => Ok(Method::Jenks),
            _ => Err(ClassifyError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::EqualInterval => "equal_interval",
            Method::Quantile => "quantile",
            Method::Jenks => "jenks",
        })
    }
}

/// Classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub classes: usize,
    pub method: Method,
    pub palette: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            classes: 10,
            method: Method::Jenks,
            palette: "RdYlGn".into(),
        }
    }
}

impl Classifier {
    pub fn new(classes: usize, method: Method, palette: impl Into<String>) -> Self {
        Self {
            classes,
            method,
            palette: palette.into(),
        }
    }

    /// Settings with palette, class count and method taken from a legend
    /// document where it provides them.
    pub fn with_legend(&self, legend: &LegendConfig) -> Self {
        let mut out = self.clone();
        if let Some(p) = &legend.palette {
            out.palette = p.clone();
        }
        if let Some(n) = legend.num_classes {
            out.classes = n;
        }
        if let Some(m) = &legend.method {
            match m.parse() {
                Ok(m) => out.method = m,
                Err(e) => log::warn!("legend file: {e}; keeping {}", out.method),
            }
        }
        out
    }

    /// Classify `series`. Non-finite values are ignored.
    ///
    /// When the series has fewer distinct values than the requested number of
    /// classes, the class count shrinks to the number of distinct values.
    pub fn classify(&self, series: &[f64]) -> Result<Classification, ClassifyError> {
        if self.classes == 0 {
            return Err(ClassifyError::ZeroClasses);
        }
        let max = palette::max_classes(&self.palette)?;
        if self.classes > max {
            return Err(ClassifyError::TooManyClasses {
                palette: self.palette.clone(),
                requested: self.classes,
                max,
            });
        }

        let mut sorted: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Err(ClassifyError::EmptySeries);
        }
        sorted.sort_by(f64::total_cmp);

        let mut distinct = sorted.clone();
        distinct.dedup();
        let k = self.classes.min(distinct.len()).max(1);

        let breaks = match self.method {
            Method::EqualInterval => equal_interval_breaks(&sorted, k),
            Method::Quantile => quantile_breaks(&sorted, k),
            Method::Jenks => jenks_breaks(&sorted, k),
        };
        let colors = palette::colors(&self.palette, k)?;

        log::debug!(
            "classified {} values into {} classes ({}): {:?}",
            sorted.len(),
            k,
            self.method,
            breaks
        );

        Ok(Classification {
            method: self.method,
            palette: self.palette.clone(),
            breaks,
            colors,
        })
    }
}

/// Result of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub method: Method,
    pub palette: String,
    /// `classes + 1` ascending breakpoints; the first is the series minimum,
    /// the last the maximum.
    pub breaks: Vec<f64>,
    pub colors: Vec<Rgb>,
}

impl Classification {
    pub fn classes(&self) -> usize {
        self.colors.len()
    }

    /// Index of the class `value` falls into. Bounds are inclusive; a value on
    /// a breakpoint belongs to the lower class.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        (0..self.colors.len()).find(|&i| value >= self.breaks[i] && value <= self.breaks[i + 1])
    }

    /// Color of the class containing `value`, `None` for NaN or out-of-range values.
    pub fn color(&self, value: f64) -> Option<Rgb> {
        self.class_of(value).map(|i| self.colors[i])
    }
}

fn equal_interval_breaks(sorted: &[f64], k: usize) -> Vec<f64> {
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mut breaks: Vec<f64> = (0..k)
        .map(|i| min + (max - min) * i as f64 / k as f64)
        .collect();
    breaks.push(max);
    breaks
}

fn quantile_breaks(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    let mut breaks = Vec::with_capacity(k + 1);
    breaks.push(sorted[0]);
    for i in 1..k {
        let pos = (i * n).div_ceil(k).max(1) - 1;
        breaks.push(sorted[pos]);
    }
    breaks.push(sorted[n - 1]);
    breaks
}

/// Fisher-Jenks natural breaks over a sorted series, `k <= sorted.len()`.
fn jenks_breaks(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    if k == 1 {
        return vec![sorted[0], sorted[n - 1]];
    }

    // 1-based tables as in the textbook formulation: lower[l][j] is the
    // 1-based index of the first value of class j when the first l values
    // are split into j classes.
    let mut lower = vec![vec![0usize; k + 1]; n + 1];
    let mut cost = vec![vec![0.0f64; k + 1]; n + 1];
    for j in 1..=k {
        lower[1][j] = 1;
        cost[1][j] = 0.0;
        for row in cost.iter_mut().skip(2) {
            row[j] = f64::INFINITY;
        }
    }

    for l in 2..=n {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut weight = 0.0;
        let mut variance = 0.0;
        for m in 1..=l {
            let first = l - m + 1;
            let v = sorted[first - 1];
            weight += 1.0;
            sum += v;
            sum_sq += v * v;
            variance = sum_sq - (sum * sum) / weight;
            let prev = first - 1;
            if prev != 0 {
                for j in 2..=k {
                    let candidate = variance + cost[prev][j - 1];
                    if cost[l][j] >= candidate {
                        lower[l][j] = first;
                        cost[l][j] = candidate;
                    }
                }
            }
        }
        lower[l][1] = 1;
        cost[l][1] = variance;
    }

    let mut breaks = vec![0.0; k + 1];
    breaks[0] = sorted[0];
    breaks[k] = sorted[n - 1];
    let mut upto = n;
    for j in (2..=k).rev() {
        let first = lower[upto][j];
        breaks[j - 1] = sorted[first.saturating_sub(2)];
        upto = first.saturating_sub(1).max(1);
    }
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing() {
        assert_eq!("jenks".parse::<Method>().unwrap(), Method::Jenks);
        assert_eq!("Equal-Interval".parse::<Method>().unwrap(), Method::EqualInterval);
        assert!("kmeans".parse::<Method>().is_err());
    }

    #[test]
    fn jenks_finds_clusters() {
        let data = [20.0, 1.0, 11.0, 2.0, 21.0, 3.0, 10.0, 22.0, 12.0];
        let c = Classifier::new(3, Method::Jenks, "RdYlGn").classify(&data).unwrap();
        assert_eq!(c.breaks, vec![1.0, 3.0, 12.0, 22.0]);
    }

    #[test]
    fn quantile_positions() {
        let c = Classifier::new(2, Method::Quantile, "Blues")
            .classify(&[4.0, 1.0, 3.0, 2.0])
            .unwrap();
        assert_eq!(c.breaks, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn equal_interval_even_steps() {
        let data: Vec<f64> = (0..=10).map(f64::from).collect();
        let c = Classifier::new(5, Method::EqualInterval, "Reds").classify(&data).unwrap();
        assert_eq!(c.breaks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(c.class_of(2.0), Some(0));
        assert_eq!(c.class_of(2.5), Some(1));
        assert_eq!(c.class_of(10.0), Some(4));
    }

    #[test]
    fn color_lookup_is_graceful() {
        let c = Classifier::new(3, Method::EqualInterval, "RdYlGn")
            .classify(&[0.0, 0.5, 1.0])
            .unwrap();
        assert_eq!(c.color(f64::NAN), None);
        assert_eq!(c.color(1.5), None);
        assert_eq!(c.color(-0.1), None);
        assert_eq!(c.color(0.0), Some(c.colors[0]));
        assert_eq!(c.color(1.0), Some(c.colors[2]));
    }

    #[test]
    fn short_series_shrinks_classes() {
        let c = Classifier::default().classify(&[0.7, 0.0]).unwrap();
        assert_eq!(c.classes(), 2);
        assert_eq!(c.breaks.len(), 3);
        assert_eq!(c.color(0.7), Some(c.colors[1]));
    }

    #[test]
    fn constant_series_is_one_class() {
        let c = Classifier::default().classify(&[0.3, 0.3, 0.3]).unwrap();
        assert_eq!(c.classes(), 1);
        assert_eq!(c.color(0.3), Some(c.colors[0]));
    }

    #[test]
    fn errors() {
        assert_eq!(Classifier::default().classify(&[]), Err(ClassifyError::EmptySeries));
        assert_eq!(
            Classifier::default().classify(&[f64::NAN]),
            Err(ClassifyError::EmptySeries)
        );
        assert!(matches!(
            Classifier::new(12, Method::Jenks, "RdYlGn").classify(&[1.0]),
            Err(ClassifyError::TooManyClasses { max: 11, .. })
        ));
    }

    #[test]
    fn legend_overrides() {
        let legend = LegendConfig {
            palette: Some("Blues".into()),
            num_classes: Some(5),
            method: Some("nonsense".into()),
            ..Default::default()
        };
        let c = Classifier::default().with_legend(&legend);
        assert_eq!(c.palette, "Blues");
        assert_eq!(c.classes, 5);
        assert_eq!(c.method, Method::Jenks);
    }
}
