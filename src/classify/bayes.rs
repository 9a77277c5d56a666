//! Multinomial naive Bayes over question tokens

use super::text::tokenize;
use crate::error::{ResearchError, Result};
use crate::types::Category;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Hold-out evaluation of a trained model
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifierEvaluation {
    pub train_size: usize,
    pub test_size: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Per true class: (test examples, correctly predicted)
    pub per_class: BTreeMap<Category, ClassCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassCounts {
    pub total: usize,
    pub correct: usize,
}

/// Multinomial naive Bayes with Laplace smoothing
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    alpha: f64,
    doc_counts: HashMap<Category, usize>,
    token_counts: HashMap<Category, HashMap<String, usize>>,
    token_totals: HashMap<Category, usize>,
    vocabulary: HashSet<String>,
    total_docs: usize,
}

impl Default for NaiveBayes {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl NaiveBayes {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            doc_counts: HashMap::new(),
            token_counts: HashMap::new(),
            token_totals: HashMap::new(),
            vocabulary: HashSet::new(),
            total_docs: 0,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.total_docs > 0
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn classes(&self) -> Vec<Category> {
        let mut classes: Vec<Category> = self.doc_counts.keys().copied().collect();
        classes.sort();
        classes
    }

    pub fn add_example(&mut self, text: &str, category: Category) {
        let tokens = tokenize(text);
        *self.doc_counts.entry(category).or_default() += 1;
        self.total_docs += 1;
        let counts = self.token_counts.entry(category).or_default();
        for token in &tokens {
            *counts.entry(token.clone()).or_default() += 1;
            self.vocabulary.insert(token.clone());
        }
        *self.token_totals.entry(category).or_default() += tokens.len();
    }

    pub fn train<'a, I>(&mut self, examples: I)
    where
        I: IntoIterator<Item = (&'a str, Category)>,
    {
        for (text, category) in examples {
            self.add_example(text, category);
        }
    }

    /// Most probable class and its posterior. `None` before training or when
    /// the text has no known tokens.
    pub fn predict(&self, text: &str) -> Option<(Category, f64)> {
        if !self.is_trained() {
            return None;
        }
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| self.vocabulary.contains(t))
            .collect();
        if tokens.is_empty() {
            return None;
        }

        let vocab = self.vocabulary.len() as f64;
        let scores: Vec<(Category, f64)> = self
            .classes()
            .into_iter()
            .map(|class| {
                let docs = self.doc_counts.get(&class).copied().unwrap_or(0) as f64;
                let total = self.token_totals.get(&class).copied().unwrap_or(0) as f64;
                let counts = self.token_counts.get(&class);
                let denom = total + self.alpha * vocab;
                let mut score = (docs / self.total_docs as f64).ln();
                for token in &tokens {
                    let count = counts.and_then(|c| c.get(token)).copied().unwrap_or(0) as f64;
                    score += ((count + self.alpha) / denom).ln();
                }
                (class, score)
            })
            .collect();

        let max = scores.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = scores.iter().map(|(_, s)| (s - max).exp()).sum();
        let (best, best_score) = scores
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        Some((best, (best_score - max).exp() / norm))
    }

    /// Train on one part of `examples` and score on the rest. Every
    /// `round(1 / test_fraction)`-th example is held out.
    pub fn evaluate(
        examples: &[(String, Category)],
        test_fraction: f64,
        alpha: f64,
    ) -> Result<(NaiveBayes, ClassifierEvaluation)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ResearchError::Model(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        let stride = ((1.0 / test_fraction).round() as usize).max(2);
        let (test, train): (Vec<_>, Vec<_>) = examples
            .iter()
            .enumerate()
            .partition(|(i, _)| i % stride == stride - 1);
        if train.is_empty() || test.is_empty() {
            return Err(ResearchError::InsufficientData(format!(
                "{} labelled examples are not enough to evaluate",
                examples.len()
            )));
        }

        let mut model = NaiveBayes::new(alpha);
        model.train(train.iter().map(|(_, (text, c))| (text.as_str(), *c)));

        let mut eval = ClassifierEvaluation {
            train_size: train.len(),
            test_size: test.len(),
            ..Default::default()
        };
        for (_, (text, truth)) in &test {
            let counts = eval.per_class.entry(*truth).or_default();
            counts.total += 1;
            if model.predict(text).map(|(c, _)| c) == Some(*truth) {
                counts.correct += 1;
                eval.correct += 1;
            }
        }
        eval.accuracy = eval.correct as f64 / eval.test_size as f64;
        Ok((model, eval))
    }
}
