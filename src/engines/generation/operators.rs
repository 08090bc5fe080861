use crate::config::EvolutionConfig;
use crate::types::{ForceBounds, Gene, Vec2};
use rand::Rng;
use std::f64::consts::TAU;

/// How often and how much of a child's tail gets re-randomised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationSettings {
    pub rate: f64,
    pub fraction_min: f64,
    pub fraction_max: f64,
}

impl MutationSettings {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            fraction_min: 0.1,
            fraction_max: 0.3,
        }
    }

    /// Always replace the same share of the tail
    pub fn with_fixed_fraction(rate: f64, fraction: f64) -> Self {
        Self {
            rate,
            fraction_min: fraction,
            fraction_max: fraction,
        }
    }
}

impl From<&EvolutionConfig> for MutationSettings {
    fn from(config: &EvolutionConfig) -> Self {
        Self {
            rate: config.mutation_rate,
            fraction_min: config.mutation_fraction_min,
            fraction_max: config.mutation_fraction_max,
        }
    }
}

/// Random force with a uniformly drawn direction, scaled onto the
/// `max_x` x `max_y` ellipse so both components stay within bounds.
pub fn random_gene<R: Rng>(bounds: &ForceBounds, rng: &mut R) -> Gene {
    let angle = rng.gen_range(0.0..TAU);
    bounds.clamp(Vec2::new(
        angle.cos() * bounds.max_x,
        angle.sin() * bounds.max_y,
    ))
}

/// Generate random genes
pub fn random_genes<R: Rng>(length: usize, bounds: &ForceBounds, rng: &mut R) -> Vec<Gene> {
    (0..length).map(|_| random_gene(bounds, rng)).collect()
}

/// Tail mutation: with probability `settings.rate`, replace the last 10-30%
/// (per settings) of `genes` with fresh random genes.
///
/// Genes are consumed front to back, so the tail is the least explored part
/// of the sequence. Returns whether a mutation happened.
pub fn mutate<R: Rng>(
    genes: &mut [Gene],
    settings: &MutationSettings,
    bounds: &ForceBounds,
    rng: &mut R,
) -> bool {
    let roll = rng.gen_range(0.0..100.0);
    if roll >= settings.rate * 100.0 {
        return false;
    }

    let fraction = if settings.fraction_max > settings.fraction_min {
        rng.gen_range(settings.fraction_min..=settings.fraction_max)
    } else {
        settings.fraction_min
    };

    let start = ((genes.len() as f64) * (1.0 - fraction)).floor() as usize;
    for gene in genes.iter_mut().skip(start) {
        *gene = random_gene(bounds, rng);
    }

    true
}

/// Pad with random genes or drop genes from the end until `genes.len() == target`
pub fn normalize_length<R: Rng>(
    genes: &mut Vec<Gene>,
    target: usize,
    bounds: &ForceBounds,
    rng: &mut R,
) {
    while genes.len() < target {
        genes.push(random_gene(bounds, rng));
    }
    genes.truncate(target);
}

/// Mating pool entries per individual for fitness-proportionate selection.
///
/// Each positive fitness gets `round(fitness / (total / 100))` entries and the
/// individual(s) holding the maximum get `elitism_bonus` more. Non-positive
/// fitness gets nothing. When no individual has positive fitness, or rounding
/// leaves every count at zero, every individual gets exactly one entry.
///
/// `total` sums only the positive fitness values, never the -1 of off-track
/// cars: `[-1, 8, 0]` gives the best car 100 entries, not `round(8 / 0.07)`.
pub fn mating_pool_counts(fitnesses: &[f64], elitism_bonus: usize) -> Vec<usize> {
    let total: f64 = fitnesses.iter().filter(|f| **f > 0.0).sum();
    if !(total > 0.0) {
        return vec![1; fitnesses.len()];
    }

    let max_fitness = fitnesses
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let unit = total / 100.0;

    let counts: Vec<usize> = fitnesses
        .iter()
        .map(|&fitness| {
            let mut count = if fitness > 0.0 {
                (fitness / unit).round() as usize
            } else {
                0
            };
            if fitness == max_fitness {
                count += elitism_bonus;
            }
            count
        })
        .collect();

    if counts.iter().all(|&c| c == 0) {
        return vec![1; fitnesses.len()];
    }

    counts
}
