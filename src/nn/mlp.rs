//! A small multilayer-perceptron regressor trained with Adam.
//!
//! Dense layers with ReLU hidden activations and an identity output,
//! L2 regularization, and early stopping on stalled loss. Each `fit`
//! call retrains from a fresh seeded initialization, so repeated fits
//! on the same example are reproducible.

use serde::{Deserialize, Serialize};

use crate::core::BattleRng;

/// Training hyperparameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer widths, input to output.
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub adam_epsilon: f64,
    /// L2 penalty on the weights.
    pub l2_penalty: f64,
    /// Maximum optimizer steps per `fit`.
    pub max_iter: u32,
    /// Minimum loss improvement still counted as progress.
    pub tol: f64,
    /// Stop after this many steps without progress.
    pub n_iter_no_change: u32,
    /// Seed for weight initialization.
    pub seed: u64,
}

impl MlpConfig {
    /// Default configuration for a given input width: two hidden layers
    /// of four and two times the input size.
    #[must_use]
    pub fn for_input(input_dim: usize, seed: u64) -> Self {
        Self {
            hidden_layers: vec![input_dim * 4, input_dim * 2],
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            adam_epsilon: 1e-8,
            l2_penalty: 1e-4,
            max_iter: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
            seed,
        }
    }
}

/// One dense layer with its Adam moment estimates.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct DenseLayer {
    /// Row-major `[output][input]`.
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    m_weights: Vec<Vec<f64>>,
    v_weights: Vec<Vec<f64>>,
    m_biases: Vec<f64>,
    v_biases: Vec<f64>,
}

impl DenseLayer {
    /// Glorot-uniform initialization.
    fn new(input: usize, output: usize, rng: &mut BattleRng) -> Self {
        let limit = (6.0 / (input + output) as f64).sqrt();
        let weights = (0..output)
            .map(|_| (0..input).map(|_| rng.gen_fraction(-limit, limit)).collect())
            .collect();
        Self {
            weights,
            biases: vec![0.0; output],
            m_weights: vec![vec![0.0; input]; output],
            v_weights: vec![vec![0.0; input]; output],
            m_biases: vec![0.0; output],
            v_biases: vec![0.0; output],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }
}

/// The regressor itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MlpRegressor {
    config: MlpConfig,
    input_dim: usize,
    output_dim: usize,
    layers: Vec<DenseLayer>,
}

impl MlpRegressor {
    /// Create an untrained regressor. Weights are materialized on the
    /// first `fit`.
    #[must_use]
    pub fn new(input_dim: usize, output_dim: usize, config: MlpConfig) -> Self {
        Self {
            config,
            input_dim,
            output_dim,
            layers: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Layer widths from input to output.
    #[must_use]
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_dim];
        sizes.extend(&self.config.hidden_layers);
        sizes.push(self.output_dim);
        sizes
    }

    fn initialize(&mut self) {
        let mut rng = BattleRng::new(self.config.seed);
        let sizes = self.layer_sizes();
        self.layers = sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], &mut rng))
            .collect();
    }

    /// Train on a single example, replacing whatever was learned before.
    ///
    /// # Panics
    /// Panics if the input or target width disagrees with the network
    /// dimensions.
    pub fn fit(&mut self, input: &[f64], target: &[f64]) {
        assert_eq!(input.len(), self.input_dim, "input width mismatch");
        assert_eq!(target.len(), self.output_dim, "target width mismatch");

        self.initialize();

        let mut best_loss = f64::INFINITY;
        let mut stalled = 0u32;

        for step in 1..=self.config.max_iter {
            let loss = self.training_step(input, target, step);
            if loss < best_loss - self.config.tol {
                best_loss = loss;
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= self.config.n_iter_no_change {
                    break;
                }
            }
        }
    }

    /// Predict the output vector for one input. Returns zeros before the
    /// first `fit`.
    #[must_use]
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        assert_eq!(input.len(), self.input_dim, "input width mismatch");
        if self.layers.is_empty() {
            return vec![0.0; self.output_dim];
        }

        let mut activation = input.to_vec();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(&activation);
            if i < last {
                relu(&mut activation);
            }
        }
        activation
    }

    /// One forward/backward pass with an Adam update; returns the loss.
    fn training_step(&mut self, input: &[f64], target: &[f64], step: u32) -> f64 {
        // Forward, caching post-activation values per layer.
        let mut activations: Vec<Vec<f64>> = vec![input.to_vec()];
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let mut out = layer.forward(&activations[i]);
            if i < last {
                relu(&mut out);
            }
            activations.push(out);
        }

        let prediction = &activations[self.layers.len()];
        let loss: f64 = prediction
            .iter()
            .zip(target)
            .map(|(p, t)| (p - t) * (p - t))
            .sum::<f64>()
            / (2.0 * self.output_dim as f64);

        // Output delta for squared loss with identity activation.
        let mut delta: Vec<f64> = prediction
            .iter()
            .zip(target)
            .map(|(p, t)| (p - t) / self.output_dim as f64)
            .collect();

        for i in (0..self.layers.len()).rev() {
            let upstream = if i > 0 {
                // Backpropagate through the ReLU of the previous layer.
                let mut next = vec![0.0; self.layers[i].weights[0].len()];
                for (o, d) in delta.iter().enumerate() {
                    for (j, w) in self.layers[i].weights[o].iter().enumerate() {
                        next[j] += d * w;
                    }
                }
                for (j, value) in next.iter_mut().enumerate() {
                    if activations[i][j] <= 0.0 {
                        *value = 0.0;
                    }
                }
                Some(next)
            } else {
                None
            };

            self.adam_update(i, &activations[i], &delta, step);

            match upstream {
                Some(next) => delta = next,
                None => break,
            }
        }

        loss
    }

    fn adam_update(&mut self, layer_idx: usize, layer_input: &[f64], delta: &[f64], step: u32) {
        let learning_rate = self.config.learning_rate;
        let beta1 = self.config.beta1;
        let beta2 = self.config.beta2;
        let adam_epsilon = self.config.adam_epsilon;
        let l2_penalty = self.config.l2_penalty;
        let bias1 = 1.0 - beta1.powi(step as i32);
        let bias2 = 1.0 - beta2.powi(step as i32);
        let layer = &mut self.layers[layer_idx];

        for (o, &d) in delta.iter().enumerate() {
            for j in 0..layer.weights[o].len() {
                let grad = d * layer_input[j] + l2_penalty * layer.weights[o][j];
                let m = &mut layer.m_weights[o][j];
                let v = &mut layer.v_weights[o][j];
                *m = beta1 * *m + (1.0 - beta1) * grad;
                *v = beta2 * *v + (1.0 - beta2) * grad * grad;
                layer.weights[o][j] -=
                    learning_rate * (*m / bias1) / ((*v / bias2).sqrt() + adam_epsilon);
            }

            let m = &mut layer.m_biases[o];
            let v = &mut layer.v_biases[o];
            *m = beta1 * *m + (1.0 - beta1) * d;
            *v = beta2 * *v + (1.0 - beta2) * d * d;
            layer.biases[o] -= learning_rate * (*m / bias1) / ((*v / bias2).sqrt() + adam_epsilon);
        }
    }
}

fn relu(values: &mut [f64]) {
    for v in values {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}
