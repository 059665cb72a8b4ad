use crate::prelude::*;

/// An ordered group of nodes sharing one activation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Layer {
    activation: Activation,
    nodes: Vec<Node>,
}

impl Layer {
    pub fn new(size: usize, activation: Activation) -> Result<Self> {
        if size == 0 {
            return Err(NNError::InvalidLayerConfiguration(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            activation,
            nodes: vec![Node::new(activation); size],
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    pub fn node_mut(&mut self, i: usize) -> &mut Node {
        &mut self.nodes[i]
    }

    pub fn outputs(&self) -> Vec<f64> {
        self.nodes.iter().map(Node::last_output).collect()
    }

    pub fn errors(&self) -> Vec<f64> {
        self.nodes.iter().map(Node::last_error).collect()
    }

    /// Pushes `sums[i]` through node `i`.
    pub fn forward(&mut self, sums: &[f64]) -> Vec<f64> {
        self.nodes
            .iter_mut()
            .zip(sums)
            .map(|(node, &x)| node.forward(x))
            .collect()
    }

    pub fn typ(&self) -> String {
        format!("Layer<{}>", self.activation.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layer_rejected() {
        assert!(Layer::new(0, Activation::Sigmoid).is_err());
    }

    #[test]
    fn forward_runs_every_node() {
        let mut layer = Layer::new(3, Activation::Identity).unwrap();
        let out = layer.forward(&[1.0, -2.0, 0.5]);
        assert_eq!(out, vec![1.0, -2.0, 0.5]);
        assert_eq!(layer.outputs(), out);
        assert_eq!(layer.node(1).last_input(), -2.0);
    }

    #[test]
    fn nodes_share_the_layer_activation() {
        let layer = Layer::new(4, Activation::Tanh).unwrap();
        assert!(layer.nodes().iter().all(|n| n.activation() == Activation::Tanh));
        assert_eq!(layer.typ(), "Layer<tanh>");
    }
}
