use crate::error::AntError;
use crate::network::CityNetwork;
use ndarray::{Array1, Array2};
use rand::Rng;

/// Whether the length of a tour includes the edge from the last city back to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourClosure {
    Open,
    Closed,
}

impl Default for TourClosure {
    fn default() -> Self {
        TourClosure::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Complete,
}

pub fn compute_cost(solution: &[usize], distances: &Array2<f64>, closure: TourClosure) -> f64 {
    let open = solution
        .windows(2)
        .fold(0.0, |acc, edge| acc + distances[[edge[0], edge[1]]]);

    match (closure, solution.first(), solution.last()) {
        (TourClosure::Closed, Some(&first), Some(&last)) if solution.len() > 1 => {
            open + distances[[last, first]]
        }
        _ => open,
    }
}

/// Roulette-wheel scan over `candidates` in ascending order: the first candidate whose
/// cumulative probability reaches `rand` wins. Falls back to the last candidate when
/// rounding leaves the cumulative sum short of `rand`.
pub fn roulette_select(candidates: &[usize], probs: &Array1<f64>, rand: f64) -> Option<usize> {
    let mut acc = 0.0;
    for (pos, &city) in candidates.iter().enumerate() {
        acc += probs[city];
        if acc >= rand {
            return Some(pos);
        }
    }

    candidates.len().checked_sub(1)
}

fn check_coefficient(name: &'static str, value: f64) -> Result<f64, AntError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AntError::InvalidCoefficient(name, value))
    }
}

/// A single tour builder. Reads the shared network, never writes to it.
#[derive(Debug, Clone)]
pub struct Ant<'a> {
    network: &'a CityNetwork,
    alpha: f64,
    beta: f64,

    start: usize,
    current: usize,
    visited: Vec<usize>,
    // Kept sorted so the roulette scan walks cities in index order.
    candidates: Vec<usize>,
    delta: Array2<f64>,
}

impl<'a> Ant<'a> {
    /// Places a fresh ant on a uniformly random start city.
    pub fn new<R: Rng + ?Sized>(
        network: &'a CityNetwork,
        alpha: f64,
        beta: f64,
        rng: &mut R,
    ) -> Result<Self, AntError> {
        let start = rng.gen_range(0, network.city_count());
        Self::with_start(network, alpha, beta, start)
    }

    pub fn with_start(
        network: &'a CityNetwork,
        alpha: f64,
        beta: f64,
        start: usize,
    ) -> Result<Self, AntError> {
        let no_cities = network.city_count();
        if start >= no_cities {
            return Err(AntError::CityOutOfRange(start, no_cities));
        }

        let alpha = check_coefficient("alpha", alpha)?;
        let beta = check_coefficient("beta", beta)?;

        let mut visited = Vec::with_capacity(no_cities);
        visited.push(start);
        let candidates = (0..no_cities).filter(|&city| city != start).collect();

        Ok(Self {
            network,
            alpha,
            beta,
            start,
            current: start,
            visited,
            candidates,
            delta: Array2::zeros((no_cities, no_cities)),
        })
    }

    fn fitness(&self, city: usize) -> f64 {
        let pheromone = self.network.pheromone(self.current, city).powf(self.alpha);
        let visibility = self.network.visibility(self.current, city).powf(self.beta);
        pheromone * visibility
    }

    /// Probability of moving from the current city to every city. Zero for visited
    /// cities. When the total fitness overflows, the candidates with infinite fitness
    /// share the whole mass; when it is zero or NaN, every candidate is equally likely.
    pub fn probabilities(&self) -> Array1<f64> {
        let no_cities = self.network.city_count();
        let mut probs = Array1::zeros(no_cities);
        if self.candidates.is_empty() {
            return probs;
        }

        let fitness: Vec<_> = self.candidates.iter().map(|&city| self.fitness(city)).collect();
        let sum: f64 = fitness.iter().sum();

        if sum > 0.0 && sum.is_finite() {
            for (&city, f) in self.candidates.iter().zip(&fitness) {
                probs[city] = f / sum;
            }
            return probs;
        }

        let infinite: Vec<_> = self
            .candidates
            .iter()
            .zip(&fitness)
            .filter(|(_, f)| **f == f64::INFINITY)
            .map(|(&city, _)| city)
            .collect();
        let favoured = if infinite.is_empty() {
            &self.candidates
        } else {
            &infinite
        };

        let uniform = 1.0 / favoured.len() as f64;
        for &city in favoured {
            probs[city] = uniform;
        }

        probs
    }

    /// Moves to the next city picked by roulette against a uniform draw from `rng`.
    pub fn select_next_city<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, AntError> {
        let rand = rng.gen::<f64>();
        self.select_next_city_with(rand)
    }

    /// Same as [`Ant::select_next_city`] with the uniform draw supplied by the caller.
    pub fn select_next_city_with(&mut self, rand: f64) -> Result<usize, AntError> {
        if self.candidates.is_empty() {
            return Err(AntError::TourComplete);
        }

        let probs = self.probabilities();
        let pos = roulette_select(&self.candidates, &probs, rand).ok_or(AntError::TourComplete)?;

        let choosen = self.candidates.remove(pos);
        self.visited.push(choosen);
        self.current = choosen;

        Ok(choosen)
    }

    pub fn complete_tour<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&[usize], AntError> {
        while !self.candidates.is_empty() {
            self.select_next_city(rng)?;
        }
        Ok(&self.visited)
    }

    pub fn tour_length(&self, closure: TourClosure) -> Result<f64, AntError> {
        let no_cities = self.network.city_count();
        if self.visited.len() != no_cities {
            return Err(AntError::IncompleteTour(self.visited.len(), no_cities));
        }

        Ok(compute_cost(&self.visited, self.network.distances(), closure))
    }

    pub fn phase(&self) -> Phase {
        if self.candidates.is_empty() {
            Phase::Complete
        } else {
            Phase::Building
        }
    }

    pub fn tour(&self) -> &[usize] {
        &self.visited
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn current_city(&self) -> usize {
        self.current
    }

    pub fn start_city(&self) -> usize {
        self.start
    }

    pub fn local_deposit(&self) -> &Array2<f64> {
        &self.delta
    }

    pub fn local_deposit_mut(&mut self) -> &mut Array2<f64> {
        &mut self.delta
    }

    pub fn set_local_deposit(&mut self, delta: Array2<f64>) -> Result<(), AntError> {
        self.network.check_shape(&delta)?;
        self.delta = delta;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-12;

    fn four_cities(initial_pheromone: f64) -> CityNetwork {
        let distances = array![
            [0.0, 1.0, 4.0, 2.0],
            [1.0, 0.0, 3.0, 5.0],
            [4.0, 3.0, 0.0, 1.0],
            [2.0, 5.0, 1.0, 0.0],
        ];
        CityNetwork::new(distances, initial_pheromone).unwrap()
    }

    fn ring(n: usize) -> CityNetwork {
        let distances = Array2::from_shape_fn((n, n), |(i, j)| {
            let d = if i > j { i - j } else { j - i };
            d.min(n - d) as f64
        });
        CityNetwork::new(distances, 1.0).unwrap()
    }

    fn assert_partition(ant: &Ant, n: usize) {
        let mut seen = vec![false; n];
        for &city in ant.tour().iter().chain(ant.candidates()) {
            assert!(!seen[city], "city {} appears twice", city);
            seen[city] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn initialization_places_ant_on_start() {
        let network = four_cities(1.0);
        let ant = Ant::with_start(&network, 1.0, 2.0, 2).unwrap();

        assert_eq!(ant.tour(), &[2]);
        assert_eq!(ant.candidates(), &[0, 1, 3]);
        assert_eq!(ant.current_city(), 2);
        assert_eq!(ant.start_city(), 2);
        assert_eq!(ant.phase(), Phase::Building);
        assert!(ant.local_deposit().iter().all(|&v| v == 0.0));
        assert_eq!(ant.local_deposit().shape(), &[4, 4]);
    }

    #[test]
    fn random_start_is_in_range() {
        let network = four_cities(1.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();
            assert!(ant.start_city() < 4);
            assert_eq!(ant.tour(), &[ant.start_city()]);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let network = four_cities(1.0);
        assert_eq!(
            Ant::with_start(&network, 1.0, 2.0, 4).unwrap_err(),
            AntError::CityOutOfRange(4, 4)
        );
        assert!(matches!(
            Ant::with_start(&network, -1.0, 2.0, 0),
            Err(AntError::InvalidCoefficient("alpha", _))
        ));
        assert!(matches!(
            Ant::with_start(&network, 1.0, f64::NAN, 0),
            Err(AntError::InvalidCoefficient("beta", _))
        ));
    }

    #[test]
    fn nearest_city_is_most_likely() {
        let network = four_cities(1.0);
        let ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();
        let probs = ant.probabilities();

        assert_eq!(probs[0], 0.0);
        assert!(probs[1] > probs[3]);
        assert!(probs[3] > probs[2]);
        assert!((probs.sum() - 1.0).abs() < EPS);

        // eta^2 = 1, 1/16, 1/4
        let z = 1.0 + 1.0 / 16.0 + 0.25;
        assert!((probs[1] - 1.0 / z).abs() < EPS);
    }

    #[test]
    fn zero_draws_pick_lowest_candidate() {
        let network = four_cities(1.0);
        let mut ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();

        assert_eq!(ant.select_next_city_with(0.0), Ok(1));
        assert_eq!(ant.select_next_city_with(0.0), Ok(2));
        assert_eq!(ant.select_next_city_with(0.0), Ok(3));
        assert_eq!(ant.tour(), &[0, 1, 2, 3]);
        assert_eq!(ant.phase(), Phase::Complete);
        assert_eq!(ant.select_next_city_with(0.0), Err(AntError::TourComplete));
    }

    #[test]
    fn draws_follow_cumulative_probability() {
        let network = four_cities(1.0);
        let ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();
        let probs = ant.probabilities();

        let candidates = ant.candidates();
        assert_eq!(roulette_select(candidates, &probs, probs[1]), Some(0));
        assert_eq!(roulette_select(candidates, &probs, probs[1] + 1e-9), Some(1));
        assert_eq!(roulette_select(candidates, &probs, 0.999_999_999), Some(2));
    }

    #[test]
    fn rounding_shortfall_falls_back_to_last_candidate() {
        let probs = array![0.0, 0.3, 0.3, 0.3999999];
        assert_eq!(roulette_select(&[1, 2, 3], &probs, 0.99999999), Some(2));
        assert_eq!(roulette_select(&[], &probs, 0.5), None);
    }

    #[test]
    fn step_moves_exactly_one_city() {
        let network = ring(9);
        let mut rng = StdRng::seed_from_u64(42);
        let mut ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();

        for step in 1..9 {
            let before = ant.candidates().len();
            let city = ant.select_next_city(&mut rng).unwrap();
            assert_eq!(ant.candidates().len(), before - 1);
            assert_eq!(ant.tour().len(), step + 1);
            assert_eq!(ant.current_city(), city);
            assert!(!ant.candidates().contains(&city));
            assert_partition(&ant, 9);
        }
        assert_eq!(ant.phase(), Phase::Complete);
    }

    #[test]
    fn probabilities_are_normalized_at_every_step() {
        let network = ring(12);
        let mut rng = StdRng::seed_from_u64(3);
        let mut ant = Ant::new(&network, 1.5, 3.0, &mut rng).unwrap();

        while ant.phase() == Phase::Building {
            let probs = ant.probabilities();
            assert!((probs.sum() - 1.0).abs() < 1e-9);
            for &city in ant.tour() {
                assert_eq!(probs[city], 0.0);
            }
            ant.select_next_city(&mut rng).unwrap();
        }
    }

    #[test]
    fn completed_tour_is_a_permutation() {
        let network = ring(15);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();
            let mut tour = ant.complete_tour(&mut rng).unwrap().to_vec();
            assert_eq!(tour[0], ant.start_city());
            tour.sort_unstable();
            assert_eq!(tour, (0..15).collect::<Vec<_>>());
        }
    }

    #[test]
    fn same_draws_same_tour() {
        let network = ring(10);
        let build = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();
            ant.complete_tour(&mut rng).unwrap().to_vec()
        };
        assert_eq!(build(99), build(99));

        let mut first = Ant::with_start(&network, 1.0, 2.0, 4).unwrap();
        let mut second = Ant::with_start(&network, 1.0, 2.0, 4).unwrap();
        for &rand in &[0.1, 0.9, 0.5, 0.0, 0.75, 0.3, 0.6, 0.2, 0.99] {
            assert_eq!(first.select_next_city_with(rand), second.select_next_city_with(rand));
        }
        assert_eq!(first.tour(), second.tour());
    }

    #[test]
    fn mocked_rng_reproduces_lowest_index_walk() {
        let network = four_cities(1.0);
        let mut rng = StepRng::new(0, 0);
        let mut ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();
        ant.complete_tour(&mut rng).unwrap();
        assert_eq!(ant.tour(), &[0, 1, 2, 3]);
    }

    #[test]
    fn tour_length_matches_summed_edges() {
        let network = four_cities(1.0);
        let mut ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();
        assert_eq!(
            ant.tour_length(TourClosure::Open),
            Err(AntError::IncompleteTour(1, 4))
        );

        for _ in 0..3 {
            ant.select_next_city_with(0.0).unwrap();
        }

        // 0 -> 1 -> 2 -> 3
        assert_eq!(ant.tour_length(TourClosure::Open), Ok(1.0 + 3.0 + 1.0));
        assert_eq!(ant.tour_length(TourClosure::Closed), Ok(1.0 + 3.0 + 1.0 + 2.0));

        let manual: f64 = ant
            .tour()
            .windows(2)
            .map(|edge| network.distance(edge[0], edge[1]))
            .sum();
        assert_eq!(ant.tour_length(TourClosure::Open), Ok(manual));
    }

    #[test]
    fn single_city_tour() {
        let network = CityNetwork::new(array![[0.0]], 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ant = Ant::new(&network, 1.0, 2.0, &mut rng).unwrap();
        assert_eq!(ant.phase(), Phase::Complete);
        assert_eq!(ant.complete_tour(&mut rng).unwrap(), &[0]);
        assert_eq!(ant.tour_length(TourClosure::Closed), Ok(0.0));
        assert_eq!(ant.probabilities().sum(), 0.0);
    }

    #[test]
    fn zero_coefficients_give_uniform_choice() {
        let network = four_cities(1.0);
        let mut ant = Ant::with_start(&network, 0.0, 0.0, 3).unwrap();

        while ant.phase() == Phase::Building {
            let probs = ant.probabilities();
            let expected = 1.0 / ant.candidates().len() as f64;
            for &city in ant.candidates() {
                assert!((probs[city] - expected).abs() < EPS);
            }
            ant.select_next_city_with(0.5).unwrap();
        }
    }

    #[test]
    fn zero_fitness_falls_back_to_uniform() {
        let network = four_cities(0.0);
        let mut ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();

        let probs = ant.probabilities();
        for &city in &[1, 2, 3] {
            assert!((probs[city] - 1.0 / 3.0).abs() < EPS);
        }
        assert!(probs.iter().all(|p| p.is_finite()));

        assert_eq!(ant.select_next_city_with(0.5), Ok(2));
        assert_eq!(ant.select_next_city_with(0.99), Ok(3));
        assert_eq!(ant.select_next_city_with(0.0), Ok(1));
    }

    #[test]
    fn unreachable_candidates_fall_back_to_uniform() {
        let inf = f64::INFINITY;
        let distances = array![[0.0, inf, inf], [inf, 0.0, 1.0], [inf, 1.0, 0.0]];
        let network = CityNetwork::new(distances, 1.0).unwrap();
        let ant = Ant::with_start(&network, 1.0, 1.0, 0).unwrap();
        let probs = ant.probabilities();
        assert!((probs[1] - 0.5).abs() < EPS);
        assert!((probs[2] - 0.5).abs() < EPS);
    }

    #[test]
    fn overflowing_fitness_favours_nearest_city() {
        let distances = array![[0.0, 1.0, 1e-200], [1.0, 0.0, 1.0], [1e-200, 1.0, 0.0]];
        let network = CityNetwork::new(distances, 1.0).unwrap();
        let mut ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();

        let probs = ant.probabilities();
        assert_eq!(probs[1], 0.0);
        assert_eq!(probs[2], 1.0);
        assert_eq!(ant.select_next_city_with(0.5), Ok(2));
    }

    #[test]
    fn local_deposit_can_be_replaced() {
        let network = four_cities(1.0);
        let mut ant = Ant::with_start(&network, 1.0, 2.0, 0).unwrap();

        ant.local_deposit_mut()[[0, 1]] = 0.2;
        assert_eq!(ant.local_deposit()[[0, 1]], 0.2);

        let delta = Array2::from_elem((4, 4), 0.5);
        ant.set_local_deposit(delta).unwrap();
        assert_eq!(ant.local_deposit()[[3, 2]], 0.5);

        assert_eq!(
            ant.set_local_deposit(Array2::zeros((2, 2))).unwrap_err(),
            AntError::ShapeMismatch(vec![2, 2], 4)
        );
    }
}
