use crate::chromosome::{self, Chromosome};
use crate::data::{Catalog, DAYS, SLOTS_PER_DAY};
use crate::fitness::FitnessEvaluator;
use log::{debug, info};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Instant;

const TOURNAMENT_SIZE: usize = 3;
const CONVERGENCE_THRESHOLD: f64 = 0.95;

/// Engine parameters. All fields have defaults and deserialize from the
/// request body, so callers override only what they need.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverParams {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elite_size: usize,
    /// Seed for the run's random source. Fixing it makes a run
    /// reproducible; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elite_size: 2,
            seed: None,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.population_size < 2 {
            return Err(SolveError::InvalidParams(
                "populationSize must be at least 2".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(SolveError::InvalidParams(
                "generations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(SolveError::InvalidParams(format!(
                "mutationRate must be in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(SolveError::InvalidParams(format!(
                "crossoverRate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        if self.elite_size >= self.population_size {
            return Err(SolveError::InvalidParams(format!(
                "eliteSize ({}) must be smaller than populationSize ({})",
                self.elite_size, self.population_size
            )));
        }
        Ok(())
    }
}

/// Why a solve request was rejected before the search ran. The engine
/// itself never fails mid-run; it always returns some chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    InvalidParams(String),
    EmptyCatalog(&'static str),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidParams(reason) => write!(f, "invalid parameters: {reason}"),
            SolveError::EmptyCatalog(collection) => {
                write!(f, "catalog has no {collection}; nothing to schedule")
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// Degradation counters for one run. The search tolerates unplaceable
/// occurrences and failed mutations; these make that visible to callers
/// instead of leaving it to be inferred from a short chromosome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Occurrences the builder could not place while seeding the initial
    /// population.
    pub dropped_placements: usize,
    /// Mutations abandoned because a gene referenced entities missing
    /// from the catalog.
    pub mutation_failures: usize,
}

/// The result of one evolution run.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub best: Chromosome,
    pub best_score: f64,
    pub generations_run: usize,
    pub converged: bool,
    pub cancelled: bool,
    /// Best score observed at each generation's evaluation step.
    pub fitness_history: Vec<f64>,
    pub diagnostics: Diagnostics,
}

/// Runs the genetic search to completion (convergence or generation cap).
pub fn solve(catalog: &Catalog, params: &SolverParams) -> Result<SolveOutcome, SolveError> {
    solve_with_cancel(catalog, params, None)
}

/// Like [`solve`], with a cancellation flag checked once per generation.
/// A cancelled run returns the best chromosome found so far.
pub fn solve_with_cancel(
    catalog: &Catalog,
    params: &SolverParams,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<SolveOutcome, SolveError> {
    params.validate()?;
    if catalog.sessions.is_empty() {
        return Err(SolveError::EmptyCatalog("sessions"));
    }
    if catalog.teachers.is_empty() {
        return Err(SolveError::EmptyCatalog("teachers"));
    }
    if catalog.classrooms.is_empty() {
        return Err(SolveError::EmptyCatalog("classrooms"));
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    };
    let engine = Engine {
        catalog,
        params,
        evaluator: FitnessEvaluator::new(catalog),
    };
    Ok(engine.evolve(&mut rng, cancel))
}

struct Engine<'a> {
    catalog: &'a Catalog,
    params: &'a SolverParams,
    evaluator: FitnessEvaluator<'a>,
}

impl Engine<'_> {
    fn evolve<R: Rng>(&self, rng: &mut R, cancel: Option<Arc<AtomicBool>>) -> SolveOutcome {
        let start_time = Instant::now();
        info!(
            "Starting evolution with {} sessions, {} teachers, {} classrooms \
             (population {}, up to {} generations)",
            self.catalog.sessions.len(),
            self.catalog.teachers.len(),
            self.catalog.classrooms.len(),
            self.params.population_size,
            self.params.generations,
        );

        let mut diagnostics = Diagnostics::default();
        let mut population: Vec<Chromosome> = (0..self.params.population_size)
            .map(|_| {
                let (candidate, dropped) = chromosome::build(self.catalog, rng);
                diagnostics.dropped_placements += dropped;
                candidate
            })
            .collect();
        if diagnostics.dropped_placements > 0 {
            info!(
                "Initial population under-placed {} session occurrences",
                diagnostics.dropped_placements
            );
        }

        let mut fitness_history = Vec::new();
        let mut generations_run = 0;
        let mut converged = false;
        let mut cancelled = false;

        for generation in 0..self.params.generations {
            if let Some(ref flag) = cancel {
                if flag.load(AtomicOrdering::Relaxed) {
                    info!("Cancellation requested; stopping at generation {generation}");
                    cancelled = true;
                    break;
                }
            }

            let scores = self.rank(&mut population);
            generations_run = generation + 1;
            fitness_history.push(scores[0]);
            debug!("Generation {generation}: best fitness = {:.4}", scores[0]);

            if scores[0] > CONVERGENCE_THRESHOLD {
                info!(
                    "Converged at generation {generation} with fitness {:.4}",
                    scores[0]
                );
                converged = true;
                break;
            }

            let mut next_generation: Vec<Chromosome> =
                population[..self.params.elite_size].to_vec();
            while next_generation.len() < self.params.population_size {
                let parent_a = self.select_parent(&population, &scores, rng);
                let parent_b = self.select_parent(&population, &scores, rng);
                let (child_a, child_b) =
                    self.crossover(&population[parent_a], &population[parent_b], rng);

                next_generation.push(self.mutate(child_a, rng, &mut diagnostics));
                // Pairing may overshoot by one; the second child is then
                // discarded.
                if next_generation.len() < self.params.population_size {
                    next_generation.push(self.mutate(child_b, rng, &mut diagnostics));
                }
            }
            population = next_generation;
        }

        let scores = self.rank(&mut population);
        let best = population.into_iter().next().unwrap_or_default();
        let best_score = scores.first().copied().unwrap_or(1.0);
        info!(
            "Evolution finished in {:.2?}: {} generations, best fitness {:.4}",
            start_time.elapsed(),
            generations_run,
            best_score,
        );

        SolveOutcome {
            best,
            best_score,
            generations_run,
            converged,
            cancelled,
            fitness_history,
            diagnostics,
        }
    }

    /// Scores every chromosome and sorts the population best-first.
    /// Returns the scores in population order.
    fn rank(&self, population: &mut Vec<Chromosome>) -> Vec<f64> {
        let mut scored: Vec<(f64, Chromosome)> = population
            .drain(..)
            .map(|candidate| (self.evaluator.score(&candidate), candidate))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let mut scores = Vec::with_capacity(scored.len());
        for (score, candidate) in scored {
            scores.push(score);
            population.push(candidate);
        }
        scores
    }

    /// Tournament selection: the best of 3 distinct candidates drawn
    /// without replacement (fewer when the population is smaller).
    fn select_parent<R: Rng>(
        &self,
        population: &[Chromosome],
        scores: &[f64],
        rng: &mut R,
    ) -> usize {
        let entrants = TOURNAMENT_SIZE.min(population.len());
        rand::seq::index::sample(rng, population.len(), entrants)
            .iter()
            .max_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal))
            .expect("tournament draws at least one entrant")
    }

    /// Adaptive single-point crossover.
    ///
    /// Every cut index is trial-evaluated on the first child and the
    /// fittest cut wins (ties go to the lowest index). Skipped entirely,
    /// returning cloned parents, with probability `1 - crossover_rate` or
    /// when either parent is empty.
    fn crossover<R: Rng>(
        &self,
        parent_a: &Chromosome,
        parent_b: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        if rng.random::<f64>() >= self.params.crossover_rate
            || parent_a.is_empty()
            || parent_b.is_empty()
        {
            return (parent_a.clone(), parent_b.clone());
        }

        let mut best_cut = 0;
        let mut best_fitness = f64::NEG_INFINITY;
        for cut in 0..parent_a.len() {
            let fitness = self.evaluator.score(&splice(parent_a, parent_b, cut));
            if fitness > best_fitness {
                best_fitness = fitness;
                best_cut = cut;
            }
        }

        (
            splice(parent_a, parent_b, best_cut),
            splice(parent_b, parent_a, best_cut),
        )
    }

    /// Perturbs one uniformly chosen gene with one of three mutation
    /// kinds: new random time, new qualified teacher, or new
    /// large-enough room. Availability at the new time is deliberately
    /// not re-checked; the evaluator penalizes any conflict introduced.
    ///
    /// Skipped with probability `1 - mutation_rate` or when the
    /// chromosome is empty. A gene referencing entities missing from the
    /// catalog aborts the mutation: the original chromosome is returned
    /// and the failure counted.
    fn mutate<R: Rng>(
        &self,
        chromosome: Chromosome,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Chromosome {
        if rng.random::<f64>() >= self.params.mutation_rate || chromosome.is_empty() {
            return chromosome;
        }

        let mut mutated = chromosome.clone();
        let gene_idx = rng.random_range(0..mutated.len());
        match self.mutate_gene(&mut mutated, gene_idx, rng) {
            Some(()) => mutated,
            None => {
                diagnostics.mutation_failures += 1;
                chromosome
            }
        }
    }

    fn mutate_gene<R: Rng>(
        &self,
        mutated: &mut Chromosome,
        gene_idx: usize,
        rng: &mut R,
    ) -> Option<()> {
        let kind = rng.random_range(0..3);
        let gene = mutated.genes.get_mut(gene_idx)?;
        match kind {
            0 => {
                gene.day = rng.random_range(0..DAYS);
                gene.slot = rng.random_range(0..SLOTS_PER_DAY);
            }
            1 => {
                let session = self.catalog.sessions.get(gene.session)?;
                let qualified: Vec<usize> = self
                    .catalog
                    .teachers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.teaches(&session.subject))
                    .map(|(idx, _)| idx)
                    .collect();
                if let Some(&teacher) = qualified.choose(rng) {
                    gene.teacher = teacher;
                }
            }
            _ => {
                let session = self.catalog.sessions.get(gene.session)?;
                let suitable: Vec<usize> = self
                    .catalog
                    .classrooms
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.capacity >= session.students)
                    .map(|(idx, _)| idx)
                    .collect();
                if let Some(&classroom) = suitable.choose(rng) {
                    gene.classroom = classroom;
                }
            }
        }
        Some(())
    }
}

/// `a[..cut] + b[cut..]`, clamping the cut to each parent's length.
fn splice(a: &Chromosome, b: &Chromosome, cut: usize) -> Chromosome {
    let mut genes = a.genes[..cut.min(a.len())].to_vec();
    genes.extend_from_slice(&b.genes[cut.min(b.len())..]);
    Chromosome::new(genes)
}
