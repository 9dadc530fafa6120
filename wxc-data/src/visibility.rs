//! Per-metric visibility and the comparison configuration built on it.

use crate::cache::ComparisonCache;
use crate::metrics::Metric;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use wxc_core::location::Location;

/// How a metric takes part in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricVisibility {
    /// Shown and voted on.
    #[default]
    Scored,
    /// Shown, never voted on.
    DisplayOnly,
    /// Neither shown nor voted on.
    Hidden,
}

/// Visibility of every metric. Metrics without an entry are scored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricSettings {
    overrides: BTreeMap<Metric, MetricVisibility>,
}

impl MetricSettings {
    pub fn visibility(&self, metric: Metric) -> MetricVisibility {
        self.overrides.get(&metric).copied().unwrap_or_default()
    }

    /// Change one metric's visibility, returning the previous value.
    pub fn set(&mut self, metric: Metric, visibility: MetricVisibility) -> MetricVisibility {
        let previous = match visibility {
            MetricVisibility::Scored => self.overrides.remove(&metric),
            v => self.overrides.insert(metric, v),
        };
        previous.unwrap_or_default()
    }

    /// Metrics that cast votes: scored and carrying a scoring rule.
    pub fn scored_set(&self) -> BTreeSet<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.visibility(*m) == MetricVisibility::Scored)
            .filter(|m| m.scoring_rule().is_some())
            .collect()
    }

    /// Hidden and display-only metrics.
    pub fn non_scored(&self) -> BTreeSet<Metric> {
        self.overrides.keys().copied().collect()
    }

    pub fn is_shown(&self, metric: Metric) -> bool {
        self.visibility(metric) != MetricVisibility::Hidden
    }

    pub fn with_visibility(&self, visibility: MetricVisibility) -> BTreeSet<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.visibility(*m) == visibility)
            .collect()
    }

    /// Build settings from hidden and display-only key lists.
    ///
    /// Unknown keys are ignored. A metric listed in both is hidden.
    pub fn from_sets<H, D>(hidden: H, display: D) -> MetricSettings
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut settings = MetricSettings::default();
        for key in display {
            if let Some(metric) = known_metric(key.as_ref()) {
                settings.set(metric, MetricVisibility::DisplayOnly);
            }
        }
        for key in hidden {
            if let Some(metric) = known_metric(key.as_ref()) {
                if settings.set(metric, MetricVisibility::Hidden) == MetricVisibility::DisplayOnly {
                    log::warn!("Metric {metric} is both hidden and display-only, hiding it");
                }
            }
        }
        settings
    }

    /// Hidden and display-only key lists, in canonical metric order.
    pub fn to_sets(&self) -> (Vec<String>, Vec<String>) {
        let keys = |v: MetricVisibility| -> Vec<String> {
            self.with_visibility(v)
                .into_iter()
                .map(|m| m.key().to_string())
                .collect()
        };
        (
            keys(MetricVisibility::Hidden),
            keys(MetricVisibility::DisplayOnly),
        )
    }
}

fn known_metric(key: &str) -> Option<Metric> {
    match key.parse::<Metric>() {
        Ok(metric) => Some(metric),
        Err(e) => {
            log::warn!("Ignoring {e}");
            None
        }
    }
}

/// The two locations being compared and which metrics count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigSnapshot", into = "ConfigSnapshot")]
pub struct ComparisonConfig {
    pub loc1: Location,
    pub loc2: Location,
    pub metrics: MetricSettings,
}

/// Persisted form of [`ComparisonConfig`].
#[derive(Serialize, Deserialize)]
struct ConfigSnapshot {
    loc1: Location,
    loc2: Location,
    #[serde(default)]
    hidden_metrics: Vec<String>,
    #[serde(default)]
    display_metrics: Vec<String>,
}

impl From<ConfigSnapshot> for ComparisonConfig {
    fn from(snapshot: ConfigSnapshot) -> Self {
        ComparisonConfig {
            loc1: snapshot.loc1,
            loc2: snapshot.loc2,
            metrics: MetricSettings::from_sets(snapshot.hidden_metrics, snapshot.display_metrics),
        }
    }
}

impl From<ComparisonConfig> for ConfigSnapshot {
    fn from(config: ComparisonConfig) -> Self {
        let (hidden_metrics, display_metrics) = config.metrics.to_sets();
        ConfigSnapshot {
            loc1: config.loc1,
            loc2: config.loc2,
            hidden_metrics,
            display_metrics,
        }
    }
}

impl ComparisonConfig {
    /// A configuration that scores every metric.
    pub fn new(loc1: Location, loc2: Location) -> ComparisonConfig {
        ComparisonConfig {
            loc1,
            loc2,
            metrics: MetricSettings::default(),
        }
    }

    /// True when `loc1` sorts first by location key.
    pub fn is_canonical(&self) -> bool {
        Location::is_canonical_order(&self.loc1, &self.loc2)
    }

    /// The same configuration with the locations exchanged.
    pub fn swapped(&self) -> ComparisonConfig {
        ComparisonConfig {
            loc1: self.loc2.clone(),
            loc2: self.loc1.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Change a metric's visibility.
    ///
    /// The cached result for the configuration as it was before the change is
    /// dropped first. Returns false when the visibility was already `visibility`.
    pub fn set_visibility(
        &mut self,
        metric: Metric,
        visibility: MetricVisibility,
        cache: &ComparisonCache,
    ) -> bool {
        if self.metrics.visibility(metric) == visibility {
            return false;
        }
        cache.invalidate(self);
        self.metrics.set(metric, visibility);
        true
    }
}
