use crate::prelude::*;
use rand::Rng;

/// Dense `source x dest` connection weights between two layers.
///
/// Entry `(i, j)` connects node `i` of the source layer to node `j` of the
/// destination layer. The shape is fixed at construction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    w: Array2<f64>,
}

impl WeightMatrix {
    /// Independent uniform draws in `[0, 1)`.
    pub fn new<R: Rng + ?Sized>(source: usize, dest: usize, rng: &mut R) -> Result<Self> {
        check_dims(source, dest)?;
        Ok(Self {
            w: Array2::random_using((source, dest), Uniform::new(0.0, 1.0), rng),
        })
    }

    pub fn from_array(w: Array2<f64>) -> Result<Self> {
        check_dims(w.nrows(), w.ncols())?;
        Ok(Self { w })
    }

    pub fn source_size(&self) -> usize {
        self.w.nrows()
    }

    pub fn dest_size(&self) -> usize {
        self.w.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.w.dim()
    }

    fn check_index(&self, i: usize, j: usize) -> Result<()> {
        let (rows, cols) = self.w.dim();
        if i >= rows || j >= cols {
            return Err(NNError::InvalidIndex {
                row: i,
                col: j,
                rows,
                cols,
            });
        }
        Ok(())
    }

    pub fn weighted_output(&self, value: f64, i: usize, j: usize) -> Result<f64> {
        self.check_index(i, j)?;
        Ok(value * self.w[[i, j]])
    }

    /// `w[i][j] += rate * error * source_output`, returning the new weight.
    ///
    /// No state is carried between calls; `rate` is a plain step size.
    pub fn update_weight(
        &mut self,
        i: usize,
        j: usize,
        error: f64,
        rate: f64,
        source_output: f64,
    ) -> Result<f64> {
        self.check_index(i, j)?;
        let w = &mut self.w[[i, j]];
        *w += rate * error * source_output;
        Ok(*w)
    }

    pub fn get_weight(&self, i: usize, j: usize) -> Result<f64> {
        self.check_index(i, j)?;
        Ok(self.w[[i, j]])
    }

    /// Owned copy; mutating it does not touch the matrix.
    pub fn get_all_weights(&self) -> Array2<f64> {
        self.w.clone()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.w.view()
    }

    pub fn set_all_weights(&mut self, w: Array2<f64>) -> Result<()> {
        if w.dim() != self.w.dim() {
            return Err(NNError::InvalidWeightShape(format!(
                "expected {:?}, got {:?}",
                self.w.dim(),
                w.dim()
            )));
        }
        self.w = w;
        Ok(())
    }

    /// Row-major: outer index is the source node.
    pub fn flatten(&self) -> Vec<f64> {
        self.w.iter().copied().collect()
    }

    pub fn assign_flat(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.w.len() {
            return Err(NNError::InvalidWeightShape(format!(
                "expected {} values for a {:?} matrix, got {}",
                self.w.len(),
                self.w.dim(),
                values.len()
            )));
        }
        let w = Array2::from_shape_vec(self.w.raw_dim(), values.to_vec())?;
        self.set_all_weights(w)
    }
}

fn check_dims(source: usize, dest: usize) -> Result<()> {
    if source == 0 || dest == 0 {
        return Err(NNError::InvalidLayerConfiguration(
            "Layer dimensions must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
