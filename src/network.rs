use crate::memory;
use crate::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT: usize = 0;
const HIDDEN: usize = 1;
const OUTPUT: usize = 2;

/// Input, hidden and output layers joined by two weight matrices.
///
/// The input layer always uses [`Activation::Identity`]; the activation given
/// at construction applies to the hidden and output layers. Propagation walks
/// `layers` and `weights` in order, so `weights[k]` connects `layers[k]` to
/// `layers[k + 1]`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    weights: Vec<WeightMatrix>,
    learning_rate: f64,
    #[serde(skip)]
    primed: bool,
}

impl Network {
    pub fn new<R: Rng + ?Sized>(
        input: usize,
        hidden: usize,
        output: usize,
        activation: Activation,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        check_learning_rate(learning_rate)?;
        let layers = vec![
            Layer::new(input, Activation::Identity)?,
            Layer::new(hidden, activation)?,
            Layer::new(output, activation)?,
        ];
        let weights = vec![
            WeightMatrix::new(input, hidden, rng)?,
            WeightMatrix::new(hidden, output, rng)?,
        ];
        Ok(Self {
            layers,
            weights,
            learning_rate,
            primed: false,
        })
    }

    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::new()
    }

    pub fn input_size(&self) -> usize {
        self.layers[INPUT].len()
    }

    pub fn hidden_size(&self) -> usize {
        self.layers[HIDDEN].len()
    }

    pub fn output_size(&self) -> usize {
        self.layers[OUTPUT].len()
    }

    pub fn layer_sizes(&self) -> [usize; 3] {
        [self.input_size(), self.hidden_size(), self.output_size()]
    }

    /// Activation of the hidden and output layers.
    pub fn activation(&self) -> Activation {
        self.layers[HIDDEN].activation()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        check_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_to_hidden(&self) -> &WeightMatrix {
        &self.weights[INPUT]
    }

    pub fn hidden_to_output(&self) -> &WeightMatrix {
        &self.weights[HIDDEN]
    }

    pub fn set_input_to_hidden(&mut self, w: Array2<f64>) -> Result<()> {
        self.weights[INPUT].set_all_weights(w)
    }

    pub fn set_hidden_to_output(&mut self, w: Array2<f64>) -> Result<()> {
        self.weights[HIDDEN].set_all_weights(w)
    }

    pub fn summary(&self) -> String {
        let mut total_param = 0;
        let mut res = "\nNetwork\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer (Type)\t\t Nodes\t\t No.of weights in\n");
        for (k, layer) in self.layers.iter().enumerate() {
            let params = if k == 0 { 0 } else { self.weights[k - 1].view().len() };
            total_param += params;
            res.push_str(&format!("{}\t\t  {}\t\t  {}\n", layer.typ(), layer.len(), params));
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total weights: {}\n", total_param));
        res.push_str(&format!("Learning rate: {}\n", self.learning_rate));
        res
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(NNError::InvalidInputShape {
                expected: self.input_size(),
                actual: input.len(),
            });
        }
        Ok(())
    }

    fn check_target(&self, target: &[f64]) -> Result<()> {
        if target.len() != self.output_size() {
            return Err(NNError::InvalidOutputShape {
                expected: self.output_size(),
                actual: target.len(),
            });
        }
        Ok(())
    }

    /// Runs `input` through every layer, recording each node's input and
    /// output for the next [`back_propagate`](Self::back_propagate).
    pub fn feed_forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;

        let last = self.layers.len() - 1;
        let mut sums = input.to_vec();
        for k in 0..last {
            let out = self.layers[k].forward(&sums);
            sums = weighted_sums(&self.weights[k], &out)?;
        }
        let result = self.layers[last].forward(&sums);

        self.primed = true;
        Ok(result)
    }

    /// Same arithmetic as [`feed_forward`](Self::feed_forward) without
    /// touching node state.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;

        let mut sums = input.to_vec();
        for (k, layer) in self.layers.iter().enumerate() {
            let act = layer.activation();
            let out: Vec<f64> = sums.iter().map(|&x| act.evaluate(x)).collect();
            match self.weights.get(k) {
                Some(m) => sums = weighted_sums(m, &out)?,
                None => return Ok(out),
            }
        }
        Ok(sums)
    }

    /// Computes node errors against `target` and updates both weight matrices,
    /// output side first. Returns the summed absolute error of the output and
    /// hidden nodes.
    ///
    /// Each weight is read for the backward signal before it is updated.
    pub fn back_propagate(&mut self, target: &[f64]) -> Result<f64> {
        self.check_target(target)?;
        if !self.primed {
            return Err(NNError::MissingForwardPass);
        }
        self.primed = false;

        let rate = self.learning_rate;
        let last = self.layers.len() - 1;
        let mut total = 0.0;

        let output = &mut self.layers[last];
        let mut downstream = Vec::with_capacity(output.len());
        for (x, &t) in target.iter().enumerate() {
            let node = output.node_mut(x);
            let y = node.last_output();
            let err = node.backward_error(t - y);
            total += err.abs();
            downstream.push(err);
        }

        for k in (0..last).rev() {
            let layer = &mut self.layers[k];
            let matrix = &mut self.weights[k];
            // the input layer has no error term
            let has_error = k > 0;
            let mut errors = Vec::with_capacity(layer.len());

            for x in 0..layer.len() {
                let source_output = layer.node(x).last_output();
                let mut signal = 0.0;
                for (y, &err) in downstream.iter().enumerate() {
                    if has_error {
                        signal += err * matrix.get_weight(x, y)?;
                    }
                    matrix.update_weight(x, y, err, rate, source_output)?;
                }
                if has_error {
                    let err = layer.node_mut(x).backward_error(signal);
                    total += err.abs();
                    errors.push(err);
                }
            }
            downstream = errors;
        }

        Ok(total)
    }

    /// Forward pass whose result must be handed back to
    /// [`ForwardPass::back_propagate`] before the network can be used again.
    pub fn forward(&mut self, input: &[f64]) -> Result<ForwardPass<'_>> {
        let output = self.feed_forward(input)?;
        Ok(ForwardPass {
            network: self,
            output,
        })
    }

    /// Repeats epochs over all patterns, in order, until the summed epoch
    /// error is at most `config.threshold` or `config.max_epochs` is reached.
    ///
    /// Stops at the first pattern with a bad shape and returns that error.
    pub fn train(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[Vec<f64>],
        config: &TrainConfig,
    ) -> Result<TrainReport> {
        if inputs.len() != targets.len() {
            return Err(NNError::PatternCountMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        config.validate()?;

        let mut errors = Vec::new();
        loop {
            let mut epoch_error = 0.0;
            for (input, target) in inputs.iter().zip(targets) {
                epoch_error += self.forward(input)?.back_propagate(target)?;
            }
            errors.push(epoch_error);
            let epochs = errors.len();
            debug!(epoch = epochs, error = epoch_error, "epoch complete");

            if epoch_error <= config.threshold {
                info!(epochs, error = epoch_error, "training converged");
                return Ok(TrainReport {
                    epochs,
                    final_error: epoch_error,
                    errors,
                    outcome: TrainOutcome::Converged,
                });
            }
            if config.max_epochs.is_some_and(|max| epochs >= max) {
                warn!(
                    epochs,
                    error = epoch_error,
                    threshold = config.threshold,
                    "epoch limit reached before convergence"
                );
                return Ok(TrainReport {
                    epochs,
                    final_error: epoch_error,
                    errors,
                    outcome: TrainOutcome::EpochLimitReached,
                });
            }
        }
    }

    pub fn weight_count(&self) -> usize {
        self.weights.iter().map(|m| m.view().len()).sum()
    }

    /// Input-to-hidden weights row-major, then hidden-to-output row-major.
    pub fn flattened_weights(&self) -> Vec<f64> {
        self.weights.iter().flat_map(WeightMatrix::flatten).collect()
    }

    /// Inverse of [`flattened_weights`](Self::flattened_weights). Nothing is
    /// changed unless both the sizes and the value count match.
    pub fn load_flattened_weights(&mut self, layer_sizes: &[usize], values: &[f64]) -> Result<()> {
        let sizes = self.layer_sizes();
        if layer_sizes != sizes {
            return Err(NNError::bad_load(format!(
                "Layer sizes {:?} do not match the network's {:?}.",
                layer_sizes, sizes
            )));
        }
        if values.len() != self.weight_count() {
            return Err(NNError::bad_load(format!(
                "Number of weights ({}) does not correspond to number of weights in neural network ({}).",
                values.len(),
                self.weight_count()
            )));
        }

        let mut staged = Vec::with_capacity(self.weights.len());
        let mut offset = 0;
        for m in &self.weights {
            let n = m.view().len();
            staged.push(Array2::from_shape_vec(m.shape(), values[offset..offset + n].to_vec())?);
            offset += n;
        }
        for (m, w) in self.weights.iter_mut().zip(staged) {
            m.set_all_weights(w)?;
        }
        Ok(())
    }

    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        memory::save(path, &self.layer_sizes(), &self.flattened_weights())
    }

    pub fn load_weights<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let sizes = self.layer_sizes();
        let values = memory::load(path, &sizes)?;
        self.load_flattened_weights(&sizes, &values)
    }

    /// Binary snapshot of the whole network.
    pub fn dump(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn restore(bytes: &[u8]) -> Result<Network> {
        let network: Network = bincode::deserialize(bytes)?;
        network.check_topology()?;
        Ok(network)
    }

    fn check_topology(&self) -> Result<()> {
        if self.layers.len() != 3 || self.weights.len() != 2 {
            return Err(NNError::InvalidLayerConfiguration(format!(
                "expected 3 layers and 2 weight matrices, found {} and {}",
                self.layers.len(),
                self.weights.len()
            )));
        }
        for (k, layer) in self.layers.iter().enumerate() {
            if layer.is_empty() {
                return Err(NNError::InvalidLayerConfiguration(format!(
                    "layer {} has no nodes",
                    k
                )));
            }
            if layer
                .nodes()
                .iter()
                .any(|node| node.activation() != layer.activation())
            {
                return Err(NNError::InvalidLayerConfiguration(format!(
                    "nodes of layer {} do not use the layer activation {}",
                    k,
                    layer.activation().name()
                )));
            }
        }
        if self.layers[INPUT].activation() != Activation::Identity {
            return Err(NNError::InvalidLayerConfiguration(
                "input layer must use the identity activation".to_string(),
            ));
        }
        for (k, m) in self.weights.iter().enumerate() {
            let expected = (self.layers[k].len(), self.layers[k + 1].len());
            if m.shape() != expected {
                return Err(NNError::InvalidWeightShape(format!(
                    "weights between layers {} and {} are {:?}, expected {:?}",
                    k,
                    k + 1,
                    m.shape(),
                    expected
                )));
            }
        }
        check_learning_rate(self.learning_rate)
    }
}

fn weighted_sums(m: &WeightMatrix, out: &[f64]) -> Result<Vec<f64>> {
    let mut sums = vec![0.0; m.dest_size()];
    for (x, &o) in out.iter().enumerate() {
        for (y, sum) in sums.iter_mut().enumerate() {
            *sum += m.weighted_output(o, x, y)?;
        }
    }
    Ok(sums)
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() {
        return Err(NNError::InvalidLayerConfiguration(format!(
            "learning rate must be finite, got {}",
            learning_rate
        )));
    }
    Ok(())
}

/// A completed forward pass that still owes its backward pass.
///
/// Holding one keeps the network mutably borrowed, so no other pattern can be
/// fed forward before this one is back-propagated.
pub struct ForwardPass<'a> {
    network: &'a mut Network,
    output: Vec<f64>,
}

impl ForwardPass<'_> {
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn back_propagate(self, target: &[f64]) -> Result<f64> {
        self.network.back_propagate(target)
    }
}

#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    input: Option<usize>,
    hidden: Option<usize>,
    output: Option<usize>,
    activation: Activation,
    learning_rate: f64,
    seed: Option<u64>,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            input: None,
            hidden: None,
            output: None,
            activation: Activation::Sigmoid,
            learning_rate: 1.0,
            seed: None,
        }
    }

    pub fn input(mut self, size: usize) -> Self {
        self.input = Some(size);
        self
    }

    pub fn hidden(mut self, size: usize) -> Self {
        self.hidden = Some(size);
        self
    }

    pub fn output(mut self, size: usize) -> Self {
        self.output = Some(size);
        self
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Network> {
        let size = |s: Option<usize>, name: &str| {
            s.ok_or_else(|| NNError::InvalidLayerConfiguration(format!("{} layer size not set", name)))
        };
        let input = size(self.input, "input")?;
        let hidden = size(self.hidden, "hidden")?;
        let output = size(self.output, "output")?;

        match self.seed {
            Some(seed) => Network::new(
                input,
                hidden,
                output,
                self.activation,
                self.learning_rate,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => Network::new(
                input,
                hidden,
                output,
                self.activation,
                self.learning_rate,
                &mut rand::thread_rng(),
            ),
        }
    }
}

/// Stopping rule for [`Network::train`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub threshold: f64,
    /// `None` trains until convergence, however long that takes.
    pub max_epochs: Option<usize>,
}

impl TrainConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            max_epochs: None,
        }
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(NNError::ConfigError("threshold must be a number".to_string()));
        }
        if self.max_epochs == Some(0) {
            return Err(NNError::ConfigError("max_epochs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Converged,
    EpochLimitReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: usize,
    pub final_error: f64,
    /// Summed error of every epoch, in order.
    pub errors: Vec<f64>,
    pub outcome: TrainOutcome,
}

impl TrainReport {
    pub fn converged(&self) -> bool {
        self.outcome == TrainOutcome::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(activation: Activation) -> Network {
        let mut nn = Network::builder()
            .input(2)
            .hidden(2)
            .output(2)
            .activation(activation)
            .seed(1)
            .build()
            .unwrap();
        nn.set_input_to_hidden(array![[0.2, 0.3], [0.4, 0.5]]).unwrap();
        nn.set_hidden_to_output(array![[0.9, 0.8], [0.7, 0.6]]).unwrap();
        nn
    }

    #[test]
    fn builder_requires_sizes() {
        let err = Network::builder().input(2).output(1).build().unwrap_err();
        assert!(matches!(err, NNError::InvalidLayerConfiguration(_)));
        assert!(Network::builder().input(2).hidden(0).output(1).build().is_err());
        assert!(Network::builder()
            .input(2)
            .hidden(2)
            .output(1)
            .learning_rate(f64::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn input_layer_is_identity() {
        let nn = fixed(Activation::Sigmoid);
        assert_eq!(nn.layers()[0].activation(), Activation::Identity);
        assert_eq!(nn.layers()[1].activation(), Activation::Sigmoid);
        assert_eq!(nn.layers()[2].activation(), Activation::Sigmoid);
        assert_eq!(nn.activation(), Activation::Sigmoid);
    }

    #[test]
    fn weight_shapes_follow_layers() {
        let nn = Network::builder().input(3).hidden(5).output(2).seed(9).build().unwrap();
        assert_eq!(nn.input_to_hidden().shape(), (3, 5));
        assert_eq!(nn.hidden_to_output().shape(), (5, 2));
        assert_eq!(nn.weight_count(), 25);
        assert_eq!(nn.layer_sizes(), [3, 5, 2]);
    }

    #[test]
    fn identity_forward_matches_hand_computation() {
        let mut nn = fixed(Activation::Identity);
        let out = nn.feed_forward(&[1.0, 1.0]).unwrap();
        assert!((out[0] - 1.10).abs() < 1e-12);
        assert!((out[1] - 0.96).abs() < 1e-12);

        let hidden = nn.layers()[1].outputs();
        assert!((hidden[0] - 0.6).abs() < 1e-12);
        assert!((hidden[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn predict_agrees_with_feed_forward() {
        let mut nn = fixed(Activation::Sigmoid);
        let pure = nn.predict(&[0.3, -0.7]).unwrap();
        let stateful = nn.feed_forward(&[0.3, -0.7]).unwrap();
        assert_eq!(pure, stateful);
    }

    #[test]
    fn back_propagate_requires_forward_pass() {
        let mut nn = fixed(Activation::Sigmoid);
        assert!(matches!(
            nn.back_propagate(&[0.0, 1.0]),
            Err(NNError::MissingForwardPass)
        ));

        nn.feed_forward(&[1.0, 0.0]).unwrap();
        nn.back_propagate(&[0.0, 1.0]).unwrap();
        assert!(matches!(
            nn.back_propagate(&[0.0, 1.0]),
            Err(NNError::MissingForwardPass)
        ));
    }

    #[test]
    fn back_propagate_updates_with_pre_update_weights() {
        let mut nn = fixed(Activation::Identity);
        nn.feed_forward(&[1.0, 1.0]).unwrap();
        let total = nn.back_propagate(&[1.0, 1.0]).unwrap();

        // output errors: 1 - 1.10, 1 - 0.96
        let e_out = [1.0 - (0.6 * 0.9 + 0.8 * 0.7), 1.0 - (0.6 * 0.8 + 0.8 * 0.6)];
        // hidden errors use the original hidden-to-output weights
        let e_hid = [
            e_out[0] * 0.9 + e_out[1] * 0.8,
            e_out[0] * 0.7 + e_out[1] * 0.6,
        ];
        let expected = e_out.iter().chain(e_hid.iter()).map(|e: &f64| e.abs()).sum::<f64>();
        assert!((total - expected).abs() < 1e-12);

        let h2o = nn.hidden_to_output();
        assert!((h2o.get_weight(0, 0).unwrap() - (0.9 + e_out[0] * 0.6)).abs() < 1e-12);
        assert!((h2o.get_weight(1, 1).unwrap() - (0.6 + e_out[1] * 0.8)).abs() < 1e-12);

        let i2h = nn.input_to_hidden();
        assert!((i2h.get_weight(0, 0).unwrap() - (0.2 + e_hid[0])).abs() < 1e-12);
        assert!((i2h.get_weight(1, 1).unwrap() - (0.5 + e_hid[1])).abs() < 1e-12);
    }

    #[test]
    fn flattened_weights_round_trip() {
        let nn = fixed(Activation::Sigmoid);
        let flat = nn.flattened_weights();
        assert_eq!(flat, vec![0.2, 0.3, 0.4, 0.5, 0.9, 0.8, 0.7, 0.6]);

        let mut other = Network::builder().input(2).hidden(2).output(2).seed(5).build().unwrap();
        other.load_flattened_weights(&[2, 2, 2], &flat).unwrap();
        assert_eq!(other.flattened_weights(), flat);
    }

    #[test]
    fn load_flattened_weights_is_atomic() {
        let mut nn = fixed(Activation::Sigmoid);
        let before = nn.flattened_weights();
        assert!(nn.load_flattened_weights(&[2, 3, 2], &[0.0; 12]).unwrap_err().is_bad_load());
        assert!(nn.load_flattened_weights(&[2, 2, 2], &[0.0; 7]).unwrap_err().is_bad_load());
        assert_eq!(nn.flattened_weights(), before);
    }

    #[test]
    fn train_rejects_bad_config() {
        let mut nn = fixed(Activation::Sigmoid);
        let x = vec![vec![1.0, 0.0]];
        let y = vec![vec![1.0, 0.0]];
        assert!(nn.train(&x, &y, &TrainConfig::new(f64::NAN)).is_err());
        assert!(nn
            .train(&x, &y, &TrainConfig::new(0.1).with_max_epochs(0))
            .is_err());
        assert!(matches!(
            nn.train(&x, &[], &TrainConfig::new(0.1)),
            Err(NNError::PatternCountMismatch { inputs: 1, targets: 0 })
        ));
    }

    #[test]
    fn dump_and_restore() {
        let nn = fixed(Activation::Tanh);
        let bytes = nn.dump().unwrap();
        let restored = Network::restore(&bytes).unwrap();
        assert_eq!(restored.layer_sizes(), [2, 2, 2]);
        assert_eq!(restored.activation(), Activation::Tanh);
        assert_eq!(restored.learning_rate(), nn.learning_rate());
        assert_eq!(restored.flattened_weights(), nn.flattened_weights());
        assert!(Network::restore(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn restore_rejects_inconsistent_layers() {
        let mut mixed = fixed(Activation::Sigmoid);
        *mixed.layers[HIDDEN].node_mut(0) = Node::new(Activation::Identity);
        assert!(matches!(
            Network::restore(&mixed.dump().unwrap()),
            Err(NNError::InvalidLayerConfiguration(_))
        ));

        // a Layer is encoded as its fields in order
        let bytes = bincode::serialize(&(Activation::Sigmoid, Vec::<Node>::new())).unwrap();
        let empty: Layer = bincode::deserialize(&bytes).unwrap();
        assert!(empty.is_empty());
        let mut hollow = fixed(Activation::Sigmoid);
        hollow.layers[OUTPUT] = empty;
        assert!(matches!(
            Network::restore(&hollow.dump().unwrap()),
            Err(NNError::InvalidLayerConfiguration(_))
        ));
    }

    #[test]
    fn summary_lists_layers() {
        let s = fixed(Activation::Sigmoid).summary();
        assert!(s.contains("Layer<identity>"));
        assert!(s.contains("Total weights: 8"));
    }
}
