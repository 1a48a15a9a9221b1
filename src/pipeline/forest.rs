//! Random forest classifier
//!
//! Bagged CART trees with Gini impurity, per-split feature sampling and
//! balanced class weights. Binary labels only (0 / 1); the forest outputs
//! `P(label = 1)` as the mean of the per-tree leaf fractions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Features examined per split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Uniform,
    /// `n_samples / (n_classes * count(class))`
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 600,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Balanced,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated tree; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict_positive(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive } => return *positive,
                Node::Split { feature, threshold, left, right } => {
                    let value = x.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

fn gini(total: f64, positive: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let p = positive / total;
    2.0 * p * (1.0 - p)
}

/// Grows one tree over a weighted sample set.
struct TreeGrower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    /// Bootstrap multiplicity times class weight, indexed by sample
    weights: &'a [f64],
    params: &'a ForestParams,
    n_candidates: usize,
}

impl<'a> TreeGrower<'a> {
    fn weighted_counts(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(total, pos), &i| {
            let w = self.weights[i];
            (total + w, if self.y[i] == 1 { pos + w } else { pos })
        })
    }

    fn can_split(&self, n: usize, depth: usize, total: f64, positive: f64) -> bool {
        if n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf {
            return false;
        }
        if self.params.max_depth.map_or(false, |d| depth >= d) {
            return false;
        }
        // pure node
        positive > 0.0 && total - positive > 0.0
    }

    fn best_split(&self, samples: &[usize], total: f64, positive: f64, rng: &mut StdRng) -> Option<Split> {
        let n_features = self.x[samples[0]].len();
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(rng);

        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<Split> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

        for (visited, &feature) in order.iter().enumerate() {
            // Keep looking past the quota until some valid split exists
            if visited >= self.n_candidates && best.is_some() {
                break;
            }

            sorted.clear();
            sorted.extend(samples.iter().map(|&i| (self.x[i][feature], i)));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = (sorted[0].0, sorted[sorted.len() - 1].0);
            if first >= last {
                continue;
            }

            let mut left_total = 0.0;
            let mut left_positive = 0.0;
            for pos in 0..sorted.len() - 1 {
                let (value, i) = sorted[pos];
                let w = self.weights[i];
                left_total += w;
                if self.y[i] == 1 {
                    left_positive += w;
                }

                let next = sorted[pos + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                    continue;
                }

                let right_total = total - left_total;
                let right_positive = positive - left_positive;
                let score = left_total * gini(left_total, left_positive)
                    + right_total * gini(right_total, right_positive);

                if best.map_or(true, |b| score < b.score) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split { feature, threshold, score });
                }
            }
        }

        best
    }

    fn grow(&self, samples: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
        let mut nodes = vec![Node::Leaf { positive: 0.0 }];
        let mut stack = vec![(0usize, samples, 0usize)];

        // Unbounded depth: explicit stack instead of recursion
        while let Some((slot, samples, depth)) = stack.pop() {
            let (total, positive) = self.weighted_counts(&samples);
            let fraction = if total > 0.0 { positive / total } else { 0.0 };
            nodes[slot] = Node::Leaf { positive: fraction };

            if !self.can_split(samples.len(), depth, total, positive) {
                continue;
            }
            let Some(split) = self.best_split(&samples, total, positive, rng) else {
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| self.x[i][split.feature] <= split.threshold);

            let left_slot = nodes.len();
            nodes.push(Node::Leaf { positive: fraction });
            let right_slot = nodes.len();
            nodes.push(Node::Leaf { positive: fraction });

            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: left_slot,
                right: right_slot,
            };
            stack.push((right_slot, right, depth + 1));
            stack.push((left_slot, left, depth + 1));
        }

        DecisionTree { nodes }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    /// Fit on a dense matrix `x` (one row per sample) and 0/1 labels `y`.
    /// Same params and data always produce the same forest.
    pub fn fit(params: &ForestParams, x: &[Vec<f64>], y: &[u8]) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::DataShape("cannot fit on an empty dataset".to_string()));
        }
        if x.len() != y.len() {
            return Err(Error::DataShape(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(Error::DataShape("feature rows have inconsistent width".to_string()));
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(Error::DataShape(format!("labels must be 0 or 1, got {}", bad)));
        }
        if params.n_estimators == 0 {
            return Err(Error::DataShape("forest needs at least one tree".to_string()));
        }

        let class_weight = class_weights(params.class_weight, y);
        let n = x.len();
        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen::<u64>());

            let mut multiplicity = vec![0u32; n];
            if params.bootstrap {
                for _ in 0..n {
                    multiplicity[rng.gen_range(0..n)] += 1;
                }
            } else {
                multiplicity.iter_mut().for_each(|m| *m = 1);
            }

            let weights: Vec<f64> = multiplicity
                .iter()
                .zip(y)
                .map(|(&m, &label)| f64::from(m) * class_weight[usize::from(label)])
                .collect();
            let samples: Vec<usize> = (0..n).filter(|&i| multiplicity[i] > 0).collect();

            let grower = TreeGrower {
                x,
                y,
                weights: &weights,
                params,
                n_candidates: params.max_features.resolve(n_features),
            };
            trees.push(grower.grow(samples, &mut rng));
        }

        Ok(Self { params: params.clone(), n_features, trees })
    }

    /// `P(label = 1 | x)`, in [0, 1].
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_positive(x)).sum();
        sum / self.trees.len() as f64
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

fn class_weights(mode: ClassWeight, y: &[u8]) -> [f64; 2] {
    match mode {
        ClassWeight::Uniform => [1.0, 1.0],
        ClassWeight::Balanced => {
            let mut counts = [0usize; 2];
            for &label in y {
                counts[usize::from(label)] += 1;
            }
            let present = counts.iter().filter(|&&c| c > 0).count() as f64;
            let n = y.len() as f64;
            counts.map(|c| if c > 0 { n / (present * c as f64) } else { 0.0 })
        }
    }
}
