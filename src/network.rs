use crate::error::AntError;
use ndarray::{Array2, Ix2, ShapeBuilder};

fn init_pheromone_matrix<S>(shape: S, value: f64) -> Array2<f64>
where
    S: ShapeBuilder<Dim = Ix2>,
{
    Array2::from_shape_fn(shape, |(i, j)| if i == j { 0.0 } else { value })
}

/// Unreachable pairs (infinite distance) get zero visibility, as does the diagonal.
fn compute_visibility_matrix(distances: &Array2<f64>) -> Array2<f64> {
    Array2::from_shape_fn(distances.raw_dim(), |(i, j)| {
        if i == j {
            0.0
        } else {
            1.0 / distances[[i, j]]
        }
    })
}

fn validate_distances(distances: &Array2<f64>) -> Result<(), AntError> {
    let shape = distances.shape();
    if shape[0] != shape[1] {
        return Err(AntError::NotSquare(shape[0], shape[1]));
    }
    if shape[0] == 0 {
        return Err(AntError::EmptyNetwork);
    }

    for ((i, j), &d) in distances.indexed_iter() {
        if d.is_nan() || d < 0.0 {
            return Err(AntError::InvalidDistance(i, j, d));
        }
        if i != j && d == 0.0 {
            return Err(AntError::ZeroDistance(i, j));
        }
        if d != distances[[j, i]] {
            return Err(AntError::Asymmetric(i, j));
        }
    }

    Ok(())
}

/// Holds the static distance table, its cached visibility, and the pheromone table
/// shared by every ant of the colony.
///
/// Ants only ever borrow the network immutably; pheromone writes need `&mut self`, so
/// they cannot happen while a generation of ants is still building tours.
#[derive(Debug, Clone)]
pub struct CityNetwork {
    distances: Array2<f64>,
    visibility: Array2<f64>,
    pheromones: Array2<f64>,
}

impl CityNetwork {
    pub fn new(distances: Array2<f64>, initial_pheromone: f64) -> Result<Self, AntError> {
        validate_distances(&distances)?;
        if !initial_pheromone.is_finite() || initial_pheromone < 0.0 {
            return Err(AntError::InvalidPheromone(initial_pheromone));
        }

        let pheromones = init_pheromone_matrix(distances.raw_dim(), initial_pheromone);
        let visibility = compute_visibility_matrix(&distances);

        Ok(Self {
            distances,
            visibility,
            pheromones,
        })
    }

    pub fn city_count(&self) -> usize {
        self.distances.shape()[0]
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[[i, j]]
    }

    pub fn pheromone(&self, i: usize, j: usize) -> f64 {
        self.pheromones[[i, j]]
    }

    pub fn visibility(&self, i: usize, j: usize) -> f64 {
        self.visibility[[i, j]]
    }

    pub fn distances(&self) -> &Array2<f64> {
        &self.distances
    }

    pub fn pheromones(&self) -> &Array2<f64> {
        &self.pheromones
    }

    pub fn visibilities(&self) -> &Array2<f64> {
        &self.visibility
    }

    pub fn evaporate(&mut self, rho: f64) -> Result<(), AntError> {
        if !(0.0..=1.0).contains(&rho) {
            return Err(AntError::InvalidCoefficient("rho", rho));
        }

        let persistence = 1.0 - rho;
        for ((r, c), value) in self.pheromones.indexed_iter_mut() {
            if r != c {
                *value *= persistence;
            }
        }
        Ok(())
    }

    pub fn deposit(&mut self, delta: &Array2<f64>) -> Result<(), AntError> {
        self.check_shape(delta)?;
        for ((r, c), &d) in delta.indexed_iter() {
            if r != c && !(d.is_finite() && d >= 0.0) {
                return Err(AntError::InvalidDeposit(r, c, d));
            }
        }

        for ((r, c), value) in self.pheromones.indexed_iter_mut() {
            if r != c {
                *value += delta[[r, c]];
            }
        }
        Ok(())
    }

    pub(crate) fn check_shape(&self, matrix: &Array2<f64>) -> Result<(), AntError> {
        let n = self.city_count();
        if matrix.shape() != [n, n] {
            return Err(AntError::ShapeMismatch(matrix.shape().to_vec(), n));
        }
        Ok(())
    }
}
