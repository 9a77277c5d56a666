//! Category-level exploratory statistics
//!
//! Numeric counterparts of the event-volume histograms and yes-price box
//! plots: bin edges and counts, quartiles, summary stats.

use crate::config::AnalysisConfig;
use crate::types::Event;
use serde::Serialize;
use std::collections::HashMap;

pub const UNKNOWN_CATEGORY: &str = "(unknown)";
pub const OTHER_GROUP: &str = "Other";

/// Values grouped by raw category label, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryValues {
    groups: Vec<(String, Vec<f64>)>,
    index: HashMap<String, usize>,
}

impl CategoryValues {
    pub fn push(&mut self, category: &str, value: f64) {
        let idx = match self.index.get(category) {
            Some(&i) => i,
            None => {
                self.groups.push((category.to_string(), Vec::new()));
                self.index.insert(category.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[idx].1.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, category: &str) -> Option<&[f64]> {
        self.index.get(category).map(|&i| self.groups[i].1.as_slice())
    }

    /// Groups by descending size; ties keep first-seen order
    pub fn by_count(&self) -> Vec<(&str, &[f64])> {
        let mut items: Vec<(&str, &[f64])> = self
            .groups
            .iter()
            .map(|(c, v)| (c.as_str(), v.as_slice()))
            .collect();
        items.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        items
    }

    /// The `max_groups - 1` largest groups plus the rest pooled into "Other"
    /// when there are more than `max_groups`
    pub fn top_with_other(&self, max_groups: usize) -> Vec<(String, Vec<f64>)> {
        let items = self.by_count();
        if items.len() <= max_groups || max_groups == 0 {
            return items
                .into_iter()
                .map(|(c, v)| (c.to_string(), v.to_vec()))
                .collect();
        }
        let keep = max_groups - 1;
        let mut shown: Vec<(String, Vec<f64>)> = items[..keep]
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_vec()))
            .collect();
        let other: Vec<f64> = items[keep..].iter().flat_map(|(_, v)| v.iter().copied()).collect();
        shown.push((OTHER_GROUP.to_string(), other));
        shown
    }
}

fn category_or_unknown(event: &Event) -> &str {
    event.category_label().unwrap_or(UNKNOWN_CATEGORY)
}

/// Volume of every event that has one
pub fn load_volumes(events: &[Event]) -> Vec<f64> {
    events.iter().filter_map(Event::effective_volume).collect()
}

pub fn volumes_by_category(events: &[Event]) -> CategoryValues {
    let mut out = CategoryValues::default();
    for event in events {
        if let Some(v) = event.effective_volume() {
            out.push(category_or_unknown(event), v);
        }
    }
    out
}

/// "Yes" prices of every market, grouped by its event's category
pub fn yes_prices_by_category(events: &[Event]) -> CategoryValues {
    let mut out = CategoryValues::default();
    for event in events {
        let category = category_or_unknown(event);
        for market in &event.markets {
            for p in market.yes_prices() {
                out.push(category, p);
            }
        }
    }
    out
}

pub fn log_volume(v: f64) -> f64 {
    (v + 1.0).log10()
}

/// Equal-width histogram. The last bin is closed on the right; a degenerate
/// range is widened by 0.5 on each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::with_range(&finite, bins, min, max)
    }

    pub fn with_range(values: &[f64], bins: usize, min: f64, max: f64) -> Option<Self> {
        if bins == 0 || !min.is_finite() || !max.is_finite() || min > max {
            return None;
        }
        let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in values {
            if !v.is_finite() || v < lo || v > hi {
                continue;
            }
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Self { edges, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    pub max: f64,
}

impl SummaryStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }
        let n = sorted.len();
        Some(Self {
            count: n,
            min: sorted[0],
            median: quantile(&sorted, 0.5),
            mean: sorted.iter().sum::<f64>() / n as f64,
            max: sorted[n - 1],
        })
    }
}

/// Five-number summary plus mean, for box plots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxSummary {
    pub fn from_values(category: &str, values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }
        let n = sorted.len();
        Some(Self {
            category: category.to_string(),
            count: n,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
        })
    }
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation quantile of sorted values
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryHistogram {
    pub category: String,
    pub count: usize,
    pub histogram: Histogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Everything the EDA stage reports
#[derive(Debug, Clone, Serialize)]
pub struct EdaReport {
    pub volume_summary: Option<SummaryStats>,
    pub log_volume_histogram: Option<Histogram>,
    pub category_counts: Vec<CategoryCount>,
    pub category_histograms: Vec<CategoryHistogram>,
    pub yes_price_counts: Vec<CategoryCount>,
    pub yes_price_boxes: Vec<BoxSummary>,
}

#[derive(Debug, Clone, Copy)]
pub struct EdaOptions {
    pub bins: usize,
    pub category_bins: usize,
    pub max_categories: usize,
    pub max_price_categories: usize,
}

impl Default for EdaOptions {
    fn default() -> Self {
        Self {
            bins: 60,
            category_bins: 50,
            max_categories: 12,
            max_price_categories: 16,
        }
    }
}

impl EdaOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            bins: config.histogram_bins,
            category_bins: config.category_histogram_bins,
            max_categories: config.max_categories,
            max_price_categories: config.max_price_categories,
        }
    }
}

impl EdaReport {
    pub fn build(events: &[Event], opts: EdaOptions) -> Self {
        let volumes = load_volumes(events);
        let logs: Vec<f64> = volumes.iter().copied().map(log_volume).collect();

        let by_category = volumes_by_category(events);
        let shown = by_category.top_with_other(opts.max_categories);
        let shown_logs: Vec<(String, Vec<f64>)> = shown
            .into_iter()
            .map(|(c, v)| (c, v.into_iter().map(log_volume).collect()))
            .collect();
        // one x-range across every category
        let all_logs = shown_logs.iter().flat_map(|(_, v)| v.iter().copied());
        let (min, max) = all_logs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let category_histograms = shown_logs
            .iter()
            .filter_map(|(c, v)| {
                Histogram::with_range(v, opts.category_bins, min, max).map(|histogram| {
                    CategoryHistogram {
                        category: c.clone(),
                        count: v.len(),
                        histogram,
                    }
                })
            })
            .collect();

        let yes = yes_prices_by_category(events);
        let yes_price_boxes = yes
            .top_with_other(opts.max_price_categories)
            .iter()
            .filter_map(|(c, v)| BoxSummary::from_values(c, v))
            .collect();

        Self {
            volume_summary: SummaryStats::from_values(&volumes),
            log_volume_histogram: Histogram::new(&logs, opts.bins),
            category_counts: counts(&by_category),
            category_histograms,
            yes_price_counts: counts(&yes),
            yes_price_boxes,
        }
    }
}

fn counts(values: &CategoryValues) -> Vec<CategoryCount> {
    values
        .by_count()
        .into_iter()
        .map(|(c, v)| CategoryCount {
            category: c.to_string(),
            count: v.len(),
        })
        .collect()
}

/// One row per raw category label: event count and volume statistics
#[derive(Debug, Clone, Serialize)]
pub struct CategoryVolumeRow {
    pub category: String,
    pub events: usize,
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    pub max: f64,
    pub mean_log_volume: f64,
}

/// Volume table ordered by event count
pub fn category_volume_table(events: &[Event]) -> Vec<CategoryVolumeRow> {
    let by_category = volumes_by_category(events);
    by_category
        .by_count()
        .into_iter()
        .filter_map(|(category, values)| {
            let stats = SummaryStats::from_values(values)?;
            let logs: Vec<f64> = values.iter().copied().map(log_volume).collect();
            Some(CategoryVolumeRow {
                category: category.to_string(),
                events: stats.count,
                min: stats.min,
                median: stats.median,
                mean: stats.mean,
                max: stats.max,
                mean_log_volume: logs.iter().sum::<f64>() / logs.len() as f64,
            })
        })
        .collect()
}
