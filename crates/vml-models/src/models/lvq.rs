//! LVQ1 (learning vector quantization) with a fixed number of prototypes per
//! class.
use rand::RngCore;

use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, ClassLabels};
use crate::error::{Result, VmlError};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{nearest_row, random_index, uniform_vec};

/// Prototypes are drawn from `[-PROTOTYPE_RANGE, PROTOTYPE_RANGE]^dim`.
pub const PROTOTYPE_RANGE: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct Lvq1 {
    data: Array2<f64>,
    labels: Vec<usize>,
    num_classes: usize,
    prototypes_per_class: usize,
    prototypes: Vec<Vec<f64>>,
    prototype_labels: Vec<usize>,
    ready: bool,
}

impl Lvq1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(
        &mut self,
        x: &Array2<f64>,
        labels: &ClassLabels,
        prototypes_per_class: usize,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        check_non_empty("Lvq1::init", x)?;
        check_labels_match("Lvq1::init", x, labels.len())?;
        if prototypes_per_class == 0 {
            return Err(VmlError::invalid("need at least one prototype per class"));
        }
        self.data = x.clone();
        self.labels = labels.labels().to_vec();
        self.num_classes = labels.num_classes();
        self.prototypes_per_class = prototypes_per_class;
        self.reset(rng);
        self.ready = true;
        Ok(())
    }

    /// Redraw every prototype, class by class.
    pub fn reset(&mut self, rng: &mut dyn RngCore) {
        let dim = self.data.ncols();
        self.prototypes.clear();
        self.prototype_labels.clear();
        for class in 0..self.num_classes {
            for _ in 0..self.prototypes_per_class {
                self.prototypes
                    .push(uniform_vec(rng, dim, -PROTOTYPE_RANGE, PROTOTYPE_RANGE));
                self.prototype_labels.push(class);
            }
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("lvq1"))
        }
    }

    pub fn prototypes(&self) -> &[Vec<f64>] {
        &self.prototypes
    }

    pub fn prototype_labels(&self) -> &[usize] {
        &self.prototype_labels
    }

    /// Index of the nearest prototype.
    pub fn find_winner(&self, x: &[f64]) -> Result<usize> {
        self.ensure_ready()?;
        check_point_dim("Lvq1::find_winner", self.data.ncols(), x)?;
        nearest_row(&self.prototypes, x)
    }

    /// Draw one sample and pull the winning prototype towards it by
    /// `learning_rate * (x - p)`, or push it away if the classes differ.
    pub fn fit_step(&mut self, learning_rate: f64, rng: &mut dyn RngCore) -> Result<()> {
        self.ensure_ready()?;
        if !learning_rate.is_finite() {
            return Err(VmlError::invalid(format!(
                "learning rate must be a finite number, got {}",
                learning_rate
            )));
        }
        let idx = random_index(rng, self.data.nrows());
        let input = self.data.row(idx);
        let winner = nearest_row(&self.prototypes, input)?;
        let sign = if self.prototype_labels[winner] == self.labels[idx] {
            1.0
        } else {
            -1.0
        };
        log::trace!("lvq1 sample {} moves prototype {} ({:+})", idx, winner, sign);
        for (p, v) in self.prototypes[winner].iter_mut().zip(input) {
            *p += sign * learning_rate * (v - *p);
        }
        Ok(())
    }

    /// One-hot vector at the winning prototype's class.
    pub fn predict_one_hot(&self, x: &[f64]) -> Result<Vec<f64>> {
        let winner = self.find_winner(x)?;
        let mut out = vec![0.0; self.num_classes];
        out[self.prototype_labels[winner]] = 1.0;
        Ok(out)
    }

    /// Fraction of training samples whose winner carries the right class.
    pub fn training_accuracy(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut correct = 0usize;
        for (row, &label) in self.data.rows().zip(&self.labels) {
            if self.prototype_labels[nearest_row(&self.prototypes, row)?] == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / self.labels.len() as f64)
    }
}

impl Model for Lvq1 {
    fn name(&self) -> &'static str {
        "lvq1"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_one_hot(x).map(Prediction::Probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn data() -> (Array2<f64>, ClassLabels) {
        let x = Array2::from_rows(&[
            [-3.0, -3.0],
            [-2.5, -3.5],
            [-3.5, -2.5],
            [3.0, 3.0],
            [2.5, 3.5],
            [3.5, 2.5],
        ])
        .unwrap();
        (x, ClassLabels::new(vec![0, 0, 0, 1, 1, 1], 2).unwrap())
    }

    #[test]
    fn test_prototypes_are_split_across_classes() {
        let mut rng = StdRng::seed_from_u64(0);
        let (x, labels) = data();
        let mut lvq = Lvq1::new();
        lvq.init(&x, &labels, 3, &mut rng).unwrap();
        assert_eq!(lvq.prototypes().len(), 6);
        assert_eq!(lvq.prototype_labels(), &[0, 0, 0, 1, 1, 1]);
        assert!(lvq
            .prototypes()
            .iter()
            .flatten()
            .all(|v| (-PROTOTYPE_RANGE..PROTOTYPE_RANGE).contains(v)));
    }

    #[test]
    fn test_training_separates_clusters() {
        let mut rng = StdRng::seed_from_u64(12);
        let (x, labels) = data();
        let mut lvq = Lvq1::new();
        lvq.init(&x, &labels, 1, &mut rng).unwrap();
        // start on the wrong sides so both attract and repel updates happen
        lvq.prototypes = vec![vec![1.0, 1.0], vec![-1.0, -1.0]];
        assert_eq!(lvq.training_accuracy().unwrap(), 0.0);
        for _ in 0..2000 {
            lvq.fit_step(0.05, &mut rng).unwrap();
        }
        assert_eq!(lvq.training_accuracy().unwrap(), 1.0);
        assert_eq!(lvq.predict_one_hot(&[-3.0, -2.0]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(lvq.predict_one_hot(&[2.0, 4.0]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_update_rule_attracts_and_repels() {
        let mut rng = StdRng::seed_from_u64(0);
        let x = Array2::from_rows(&[[1.0, 0.0]]).unwrap();
        let mut lvq = Lvq1::new();
        lvq.init(&x, &ClassLabels::new(vec![0], 2).unwrap(), 1, &mut rng)
            .unwrap();
        lvq.prototypes = vec![vec![0.0, 0.0], vec![10.0, 10.0]];
        lvq.fit_step(0.5, &mut rng).unwrap();
        assert_eq!(lvq.prototypes()[0], vec![0.5, 0.0]);

        lvq.prototype_labels = vec![1, 0];
        lvq.fit_step(0.5, &mut rng).unwrap();
        assert_eq!(lvq.prototypes()[0], vec![0.25, 0.0]);
    }

    #[test]
    fn test_not_ready() {
        let lvq = Lvq1::new();
        assert!(matches!(lvq.predict(&[0.0, 0.0]), Err(VmlError::NotReady(_))));
    }
}
