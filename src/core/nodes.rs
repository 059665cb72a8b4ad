use crate::prelude::*;

/// A single unit: remembers what passed through it on the last forward and
/// backward call.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Node {
    activation: Activation,
    last_input: f64,
    last_output: f64,
    last_error: f64,
}

impl Node {
    pub fn new(activation: Activation) -> Self {
        Self {
            activation,
            last_input: 0.0,
            last_output: 0.0,
            last_error: 0.0,
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn last_input(&self) -> f64 {
        self.last_input
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn forward(&mut self, x: f64) -> f64 {
        self.last_input = x;
        self.last_output = self.activation.evaluate(x);
        self.last_output
    }

    /// Only meaningful right after `forward` on the same pattern.
    pub fn backward_error(&mut self, signal: f64) -> f64 {
        self.last_error = self.activation.derivative_from_output(self.last_output) * signal;
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let node = Node::new(Activation::Sigmoid);
        assert_eq!(node.last_input(), 0.0);
        assert_eq!(node.last_output(), 0.0);
        assert_eq!(node.last_error(), 0.0);
    }

    #[test]
    fn forward_records_input_and_output() {
        let mut node = Node::new(Activation::Sigmoid);
        let out = node.forward(0.0);
        assert_eq!(out, 0.5);
        assert_eq!(node.last_input(), 0.0);
        assert_eq!(node.last_output(), 0.5);

        node.forward(3.0);
        assert_eq!(node.last_input(), 3.0);
    }

    #[test]
    fn backward_uses_last_output() {
        let mut node = Node::new(Activation::Sigmoid);
        node.forward(0.0);
        // 0.5 * (1 - 0.5) * 2
        assert_eq!(node.backward_error(2.0), 0.5);
        assert_eq!(node.last_error(), 0.5);

        let mut id = Node::new(Activation::Identity);
        id.forward(7.0);
        assert_eq!(id.backward_error(-1.5), -1.5);
    }
}
