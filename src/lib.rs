pub mod ant;
pub mod colony;
pub mod error;
pub mod network;
pub mod utils;

pub use ant::{Ant, Phase, TourClosure};
pub use colony::{AntSystem, ColonyProps, Generation};
pub use error::AntError;
pub use network::CityNetwork;
