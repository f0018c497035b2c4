use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AntError {
    #[error("the city network has no cities")]
    EmptyNetwork,
    #[error("distance matrix must be square, got {0}x{1}")]
    NotSquare(usize, usize),
    #[error("invalid distance {2} between cities {0} and {1}")]
    InvalidDistance(usize, usize, f64),
    #[error("distance between cities {0} and {1} is not symmetric")]
    Asymmetric(usize, usize),
    #[error("distinct cities {0} and {1} are at distance zero")]
    ZeroDistance(usize, usize),
    #[error("invalid initial pheromone {0}")]
    InvalidPheromone(f64),
    #[error("coefficient {0} must be finite and non-negative, got {1}")]
    InvalidCoefficient(&'static str, f64),
    #[error("city {0} is out of range for {1} cities")]
    CityOutOfRange(usize, usize),
    #[error("invalid pheromone deposit {2} between cities {0} and {1}")]
    InvalidDeposit(usize, usize, f64),
    #[error("matrix shape {0:?} does not match {1} cities")]
    ShapeMismatch(Vec<usize>, usize),
    #[error("tour is incomplete: {0} of {1} cities visited")]
    IncompleteTour(usize, usize),
    #[error("tour is already complete")]
    TourComplete,
    #[error("colony needs at least one ant")]
    NoAnts,
}
