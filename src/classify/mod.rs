//! Market-text classification
//!
//! Assigns every market a normalized [`Category`] and an [`OptionClass`].
//! Category resolution order:
//! 1. the event's own category label, normalized
//! 2. keyword rules over the question
//! 3. naive Bayes trained on the markets resolved by 1 and 2
//! 4. `Other`

pub mod bayes;
pub mod eda;
pub mod rules;
pub mod text;


pub use bayes::{ClassCounts, ClassifierEvaluation, NaiveBayes};
pub use eda::{
    category_volume_table, BoxSummary, CategoryVolumeRow, EdaOptions, EdaReport, Histogram,
    SummaryStats,
};
pub use rules::{keyword_category, normalize_label, option_class};
pub use text::tokenize;

use crate::error::Result;
use crate::ingest::{MarketCatalog, MarketEntry};
use crate::types::{Category, OptionClass};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Where a market's category came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelSource {
    EventLabel,
    Keywords,
    Model,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketLabel {
    pub category: Category,
    pub source: LabelSource,
    /// 1.0 for rule-based labels, the posterior for model labels
    pub confidence: f64,
    pub option_class: OptionClass,
}

/// Category counts by label source and option class over a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationSummary {
    pub markets: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub naked: usize,
    pub replicable: usize,
}

/// Rules plus a naive Bayes fallback
#[derive(Debug, Clone, Default)]
pub struct MarketClassifier {
    model: NaiveBayes,
}

/// Category from the event label or keywords, without the model
pub fn rule_category(entry: &MarketEntry) -> Option<(Category, LabelSource)> {
    if let Some(c) = entry.category_label().and_then(normalize_label) {
        return Some((c, LabelSource::EventLabel));
    }
    keyword_category(&entry.market.question).map(|c| (c, LabelSource::Keywords))
}

/// (question + description, category) for every rule-labelled market
pub fn labelled_examples(catalog: &MarketCatalog) -> Vec<(String, Category)> {
    catalog
        .entries()
        .iter()
        .filter_map(|e| rule_category(e).map(|(c, _)| (e.market.text(), c)))
        .collect()
}

impl MarketClassifier {
    pub fn new(model: NaiveBayes) -> Self {
        Self { model }
    }

    /// Train on every rule-labelled market in the catalog
    pub fn train(catalog: &MarketCatalog) -> Self {
        let examples = labelled_examples(catalog);
        let mut model = NaiveBayes::default();
        model.train(examples.iter().map(|(t, c)| (t.as_str(), *c)));
        debug!(
            "Trained classifier on {} markets, vocabulary {}",
            examples.len(),
            model.vocabulary_size()
        );
        Self { model }
    }

    /// Hold out part of the labelled markets to score the model, then train
    /// the returned classifier on all of them
    pub fn train_and_evaluate(
        catalog: &MarketCatalog,
        test_fraction: f64,
    ) -> Result<(Self, ClassifierEvaluation)> {
        let examples = labelled_examples(catalog);
        let (_, evaluation) = NaiveBayes::evaluate(&examples, test_fraction, 1.0)?;
        info!(
            "Classifier hold-out accuracy {:.3} on {} markets",
            evaluation.accuracy, evaluation.test_size
        );
        let mut model = NaiveBayes::default();
        model.train(examples.iter().map(|(t, c)| (t.as_str(), *c)));
        Ok((Self { model }, evaluation))
    }

    pub fn model(&self) -> &NaiveBayes {
        &self.model
    }

    pub fn classify(&self, entry: &MarketEntry) -> MarketLabel {
        let option_class = option_class(&entry.market.question);
        if let Some((category, source)) = rule_category(entry) {
            return MarketLabel {
                category,
                source,
                confidence: 1.0,
                option_class,
            };
        }
        match self.model.predict(&entry.market.text()) {
            Some((category, posterior)) => MarketLabel {
                category,
                source: LabelSource::Model,
                confidence: posterior,
                option_class,
            },
            None => MarketLabel {
                category: Category::Other,
                source: LabelSource::Default,
                confidence: 0.0,
                option_class,
            },
        }
    }

    /// Label every market in the catalog, in catalog order
    pub fn classify_all<'a>(&self, catalog: &'a MarketCatalog) -> Vec<(&'a MarketEntry, MarketLabel)> {
        catalog
            .entries()
            .iter()
            .map(|e| (e, self.classify(e)))
            .collect()
    }

    pub fn summarize(&self, catalog: &MarketCatalog) -> ClassificationSummary {
        let mut summary = ClassificationSummary::default();
        for (_, label) in self.classify_all(catalog) {
            summary.markets += 1;
            *summary.by_category.entry(label.category).or_default() += 1;
            *summary.by_source.entry(format!("{:?}", label.source)).or_default() += 1;
            match label.option_class {
                OptionClass::Naked => summary.naked += 1,
                OptionClass::Replicable => summary.replicable += 1,
            }
        }
        summary
    }
}
