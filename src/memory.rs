//! Plain-text weight files.
//!
//! ```text
//! N
//! <number of layers>
//! L
//! <size of each layer, one per line>
//! N
//! <number of weights>
//! W
//! <each weight, one per line>
//! ```
//!
//! Lines are always written with `\n`, on every platform. Reading is token
//! based: any whitespace separates tokens, so files written with `\r\n` line
//! endings load the same way.

use crate::prelude::*;
use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};
use tracing::{debug, info};

pub fn encode_text(layer_sizes: &[usize], weights: &[f64]) -> String {
    let mut text = String::new();
    text.push_str(&format!("N\n{}\nL\n", layer_sizes.len()));
    for size in layer_sizes {
        text.push_str(&format!("{}\n", size));
    }
    text.push_str(&format!("N\n{}\nW\n", weights.len()));
    for w in weights {
        text.push_str(&format!("{:?}\n", w));
    }
    text
}

/// Parses a weight file, rejecting it unless its layer sizes equal
/// `expected_sizes`.
pub fn decode_text(text: &str, expected_sizes: &[usize]) -> Result<Vec<f64>> {
    let mut tokens = Tokens(text.split_whitespace());

    tokens.marker("N")?;
    let num_layers: usize = tokens
        .number()
        .ok_or_else(|| NNError::bad_load("Cannot read in number of layers."))?;
    if num_layers != expected_sizes.len() {
        return Err(NNError::bad_load(format!(
            "Number of layers given in input file ({}) does not match that of the neural network ({}).",
            num_layers,
            expected_sizes.len()
        )));
    }

    tokens.marker("L")?;
    let mut sizes = Vec::with_capacity(num_layers);
    for _ in 0..num_layers {
        let size: usize = tokens.number().ok_or_else(|| {
            NNError::bad_load(
                "Number of layers given in input file does not match that of the neural network.",
            )
        })?;
        sizes.push(size);
    }
    for (x, (found, expected)) in sizes.iter().zip(expected_sizes).enumerate() {
        if found != expected {
            return Err(NNError::bad_load(format!(
                "The number of nodes in layer {} given in the input file ({}) does not equal the number of nodes found in the neural network ({}).",
                x + 1,
                found,
                expected
            )));
        }
    }

    tokens.marker("N")?;
    let num_weights: usize = tokens
        .number()
        .ok_or_else(|| NNError::bad_load("Cannot read in number of weights."))?;

    tokens.marker("W")?;
    // declared count is untrusted
    let mut weights = Vec::new();
    for _ in 0..num_weights {
        let w: f64 = tokens
            .number()
            .ok_or_else(|| NNError::bad_load("Not enough weights provided."))?;
        weights.push(w);
    }
    if tokens.0.next().is_some() {
        return Err(NNError::bad_load(format!(
            "More values present than the {} weights declared.",
            num_weights
        )));
    }

    Ok(weights)
}

struct Tokens<'a>(SplitWhitespace<'a>);

impl Tokens<'_> {
    fn marker(&mut self, letter: &str) -> Result<()> {
        match self.0.next() {
            Some(tok) if tok == letter => Ok(()),
            _ => Err(NNError::bad_load(format!(
                "Bad input file format, expected marker '{}'.",
                letter
            ))),
        }
    }

    fn number<T: FromStr>(&mut self) -> Option<T> {
        self.0.next().and_then(|tok| tok.parse().ok())
    }
}

pub fn save<P: AsRef<Path>>(path: P, layer_sizes: &[usize], weights: &[f64]) -> Result<()> {
    let path = path.as_ref();
    info!(path = %path.display(), weights = weights.len(), "saving weights");
    fs::write(path, encode_text(layer_sizes, weights))?;
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P, expected_sizes: &[usize]) -> Result<Vec<f64>> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading weights");
    let text = fs::read_to_string(path).map_err(|err| NNError::BadLoad {
        reason: format!("Cannot read {}.", path.display()),
        source: Some(err),
    })?;
    debug!(bytes = text.len(), "read weight file");
    decode_text(&text, expected_sizes)
}
