use crate::ant::{Ant, TourClosure};
use crate::error::AntError;
use crate::network::CityNetwork;
use crate::utils::{pretty_matrix, ToCharIndex, ToDisplayPath};
use anyhow::{anyhow, Error};
use indicatif::ProgressIterator;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::io::Write;

pub type Solution = (Vec<usize>, f64);

#[derive(Debug, Clone)]
pub struct ColonyProps {
    pub ant_count: usize,
    pub alpha: f64,
    pub beta: f64,
    pub rho: f64,
    pub q: f64,
    pub initial_pheromone: f64,
    pub closure: TourClosure,
    pub seed: Option<u64>,
}

impl Default for ColonyProps {
    fn default() -> Self {
        Self {
            ant_count: 10,
            alpha: 1.0,
            beta: 2.0,
            rho: 0.5,
            q: 1.0,
            initial_pheromone: 1.0,
            closure: TourClosure::Open,
            seed: None,
        }
    }
}

impl ColonyProps {
    pub fn validate(&self) -> Result<(), AntError> {
        if self.ant_count == 0 {
            return Err(AntError::NoAnts);
        }
        for &(name, value) in &[("alpha", self.alpha), ("beta", self.beta), ("q", self.q)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AntError::InvalidCoefficient(name, value));
            }
        }
        if !(0.0..=1.0).contains(&self.rho) {
            return Err(AntError::InvalidCoefficient("rho", self.rho));
        }
        Ok(())
    }
}

/// Result of a single generation: every ant's tour with its length, and the shortest one.
#[derive(Debug, Clone)]
pub struct Generation {
    pub tours: Vec<Solution>,
    pub best: Solution,
}

/// Fills the ant's local deposit with `q / length` on every edge of its tour, in both
/// directions. Returns the tour length.
pub fn lay_pheromone(ant: &mut Ant, q: f64, closure: TourClosure) -> Result<f64, AntError> {
    let cost = ant.tour_length(closure)?;
    if cost <= 0.0 || !cost.is_finite() {
        return Ok(cost);
    }

    let tour = ant.tour();
    let mut edges: Vec<_> = tour.windows(2).map(|edge| (edge[0], edge[1])).collect();
    if closure == TourClosure::Closed && tour.len() > 1 {
        edges.push((tour[tour.len() - 1], tour[0]));
    }

    let w = q / cost;
    let delta = ant.local_deposit_mut();
    for (a, b) in edges {
        delta[[a, b]] += w;
        delta[[b, a]] += w;
    }

    Ok(cost)
}

fn by_cost(a: &Solution, b: &Solution) -> Ordering {
    a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone)]
pub struct AntSystem {
    pub alpha: f64,
    pub beta: f64,
    pub rho: f64,
    pub q: f64,
    pub size: usize,
    pub closure: TourClosure,

    network: CityNetwork,
    rng: StdRng,
    best_solution: Option<Solution>,
}

impl AntSystem {
    pub fn new(distances: Array2<f64>, props: ColonyProps) -> Result<Self, AntError> {
        props.validate()?;
        let network = CityNetwork::new(distances, props.initial_pheromone)?;
        let rng = match props.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            alpha: props.alpha,
            beta: props.beta,
            rho: props.rho,
            q: props.q,
            size: props.ant_count,
            closure: props.closure,
            network,
            rng,
            best_solution: None,
        })
    }

    pub fn network(&self) -> &CityNetwork {
        &self.network
    }

    pub fn best(&self) -> Option<&Solution> {
        self.best_solution.as_ref()
    }

    /// Runs one generation: every ant builds a tour over the current pheromone table,
    /// then the table is evaporated and every ant's deposit merged into it.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Generation, Error> {
        let mut solutions = Vec::with_capacity(self.size);
        let mut deltas = Vec::with_capacity(self.size);

        for ant in 0..self.size {
            let mut built =
                build_solution(&self.network, self.alpha, self.beta, &mut self.rng, ant, out)?;
            let cost = lay_pheromone(&mut built, self.q, self.closure)?;

            writeln!(
                out,
                "Hormiga {}: {} (costo: {})",
                ant + 1,
                built.tour().to_display_path()?,
                cost
            )?;

            solutions.push((built.tour().to_vec(), cost));
            deltas.push(built.local_deposit().clone());
        }

        let best = solutions
            .iter()
            .min_by(|a, b| by_cost(a, b))
            .cloned()
            .ok_or_else(|| anyhow!("No ants in the colony"))?;

        let improved = match &self.best_solution {
            Some(global) => best.1 < global.1,
            None => true,
        };
        if improved {
            self.best_solution = Some(best.clone());
        }

        if let Some((path, cost)) = &self.best_solution {
            writeln!(
                out,
                "Mejor camino global: {} con costo {}",
                path.to_display_path()?,
                cost
            )?;
        }

        self.update_pheromones(&deltas, out)?;

        Ok(Generation {
            tours: solutions,
            best,
        })
    }

    /// Runs `iters` generations and returns the shortest tour seen.
    pub fn solve<W: Write>(&mut self, iters: usize, out: &mut W) -> Result<Solution, Error> {
        for i in (0..iters).progress() {
            writeln!(out, "------------------------------------")?;
            writeln!(out, "Iteración {}\n", i + 1)?;

            writeln!(
                out,
                "Matriz de visibilidad:\n{}",
                pretty_matrix(self.network.visibilities(), 6)
            )?;
            writeln!(
                out,
                "Matriz de feromonas:\n{}",
                pretty_matrix(self.network.pheromones(), 6)
            )?;

            let generation = self.run(out)?;
            writeln!(
                out,
                "Mejor camino en esta iteración: {} con costo {}\n",
                generation.best.0.to_display_path()?,
                generation.best.1
            )?;
        }

        let best = self
            .best_solution
            .clone()
            .ok_or_else(|| anyhow!("No generations were run"))?;

        writeln!(
            out,
            "\nMejor camino global: {} con costo {}",
            best.0.to_display_path()?,
            best.1
        )?;

        Ok(best)
    }

    fn update_pheromones<W: Write>(
        &mut self,
        deltas: &[Array2<f64>],
        out: &mut W,
    ) -> Result<(), Error> {
        self.network.evaporate(self.rho)?;
        for delta in deltas {
            self.network.deposit(delta)?;
        }

        writeln!(
            out,
            "Feromonas tras evaporación (rho = {}) y depósito:\n{}",
            self.rho,
            pretty_matrix(self.network.pheromones(), 6)
        )?;

        Ok(())
    }
}

fn build_solution<'a, W: Write>(
    network: &'a CityNetwork,
    alpha: f64,
    beta: f64,
    rng: &mut StdRng,
    ant: usize,
    out: &mut W,
) -> Result<Ant<'a>, Error> {
    let mut built = Ant::new(network, alpha, beta, rng)?;

    writeln!(out, "Hormiga {}", ant + 1)?;
    writeln!(out, "Ciudad inicial: {}", built.start_city().to_char_index())?;

    while !built.candidates().is_empty() {
        let curr = built.current_city();
        let probs = built.probabilities();

        for &city in built.candidates() {
            writeln!(
                out,
                "{} -> {}: t^a = {}, n^b = {}, prob = {}",
                curr.to_char_index(),
                city.to_char_index(),
                network.pheromone(curr, city).powf(alpha),
                network.visibility(curr, city).powf(beta),
                probs[city]
            )?;
        }

        let rand = rng.gen::<f64>();
        writeln!(out, "Número aleatorio: {}", rand)?;

        let choosen = built.select_next_city_with(rand)?;
        writeln!(out, "Siguiente ciudad: {}\n", choosen.to_char_index())?;
    }

    writeln!(
        out,
        "Camino de la hormiga {}: {}\n-----\n",
        ant + 1,
        built.tour().to_display_path()?
    )?;

    Ok(built)
}
