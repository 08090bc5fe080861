use evoracer::data::checkpoints::{CheckpointRegion, CheckpointTrack};
use evoracer::engines::generation::{Genome, MutationSettings, OFF_TRACK_FITNESS};
use evoracer::types::{ForceBounds, Gene, Vec2};
use evoracer::EvoRacerError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Corridor of `n` 100x100 regions laid out left to right
fn corridor(n: usize) -> Arc<CheckpointTrack> {
    let regions = (0..n)
        .map(|i| {
            let x0 = i as f64 * 100.0;
            let x1 = x0 + 100.0;
            CheckpointRegion::new(vec![
                Vec2::new(x0, 0.0),
                Vec2::new(x0, 100.0),
                Vec2::new(x1, 100.0),
                Vec2::new(x1, 0.0),
            ])
        })
        .collect();
    Arc::new(CheckpointTrack::new(regions))
}

/// Centre of region `i` in `corridor`
fn in_region(i: usize) -> Vec2 {
    Vec2::new(i as f64 * 100.0 + 50.0, 50.0)
}

fn gene(n: f64) -> Gene {
    Vec2::new(n, -n)
}

fn genome_with(track: &Arc<CheckpointTrack>, num_genes: usize) -> Genome {
    let genes = (0..num_genes).map(|i| gene(1000.0 + i as f64)).collect();
    Genome::from_genes(Arc::clone(track), num_genes, ForceBounds::default(), genes, false).unwrap()
}

#[test]
fn test_random_genome_has_requested_length() {
    let mut rng = StdRng::seed_from_u64(1);
    let genome = Genome::random(corridor(3), 250, ForceBounds::default(), &mut rng);

    assert_eq!(genome.genes().len(), 250);
    assert_eq!(genome.fitness(), 0.0);
    assert_eq!(genome.farthest_reached(), 0);
    assert_eq!(genome.path_record().len(), 3);
    assert!(genome.path_record().iter().all(Vec::is_empty));
}

#[test]
fn test_from_genes_rejects_wrong_length() {
    let result = Genome::from_genes(corridor(2), 5, ForceBounds::default(), vec![gene(1.0)], false);
    assert!(matches!(
        result,
        Err(EvoRacerError::InvalidGenomeLength { expected: 5, actual: 1 })
    ));
}

#[test]
fn test_genes_are_consumed_in_order() {
    let track = corridor(1);
    let mut genome = genome_with(&track, 3);

    assert_eq!(genome.next_gene(), Some(gene(1000.0)));
    assert_eq!(genome.next_gene(), Some(gene(1001.0)));
    assert_eq!(genome.next_gene(), Some(gene(1002.0)));
    assert_eq!(genome.next_gene(), None);
    assert_eq!(genome.genes_used(), 3);
}

#[test]
fn test_fitness_off_track_is_sentinel() {
    let track = corridor(5);
    let mut genome = genome_with(&track, 1);

    assert_eq!(genome.calculate_fitness(Vec2::new(-50.0, 50.0)), OFF_TRACK_FITNESS);
    assert_eq!(genome.fitness(), -1.0);
}

#[test]
fn test_fitness_within_region_two_of_five() {
    let track = corridor(5);
    let genome = genome_with(&track, 1);

    // Reference length is the 500-unit track width, exit edge is x = 300
    let score = genome.score(Vec2::new(250.0, 50.0));
    let expected = (2.0_f64 + (1.0 - 50.0 / 500.0)).powi(3);
    assert!((score - expected).abs() < 1e-9);

    // Uncubed progress lies in (2, 3)
    let progress = score.cbrt();
    assert!(progress > 2.0 && progress < 3.0);
}

#[test]
fn test_fitness_increases_toward_exit() {
    let track = corridor(5);
    let genome = genome_with(&track, 1);

    let scores: Vec<f64> = [205.0, 230.0, 260.0, 295.0]
        .iter()
        .map(|&x| genome.score(Vec2::new(x, 40.0)))
        .collect();

    assert!(scores.windows(2).all(|w| w[0] < w[1]), "scores: {:?}", scores);
}

#[test]
fn test_fitness_orders_by_checkpoint_first() {
    let track = corridor(5);
    let genome = genome_with(&track, 1);

    // Far from the exit of region 3 still beats right at the exit of region 2
    assert!(genome.score(Vec2::new(301.0, 50.0)) > genome.score(Vec2::new(299.0, 50.0)));
}

#[test]
fn test_fitness_is_pure() {
    let track = corridor(3);
    let mut genome = genome_with(&track, 1);
    let position = Vec2::new(133.0, 71.0);

    let first = genome.calculate_fitness(position);
    let second = genome.calculate_fitness(position);
    assert_eq!(first, second);
    assert_eq!(first, genome.score(position));
}

#[test]
fn test_record_step_buckets_forward_progress() {
    let track = corridor(3);
    let mut genome = genome_with(&track, 1);

    genome.record_step(in_region(0), gene(1.0));
    genome.record_step(in_region(0), gene(2.0));
    genome.record_step(in_region(1), gene(3.0));
    assert_eq!(genome.farthest_reached(), 1);

    // Regression is ignored
    genome.record_step(in_region(0), gene(4.0));
    assert_eq!(genome.farthest_reached(), 1);

    // Off-track positions are ignored
    genome.record_step(Vec2::new(-10.0, -10.0), gene(5.0));

    genome.record_step(in_region(1), gene(6.0));
    genome.record_step(in_region(2), gene(7.0));

    assert_eq!(
        genome.path_record(),
        &[
            vec![gene(1.0), gene(2.0)],
            vec![gene(3.0), gene(6.0)],
            vec![gene(7.0)],
        ]
    );
    assert_eq!(genome.farthest_reached(), 2);
}

#[test]
fn test_farthest_reached_is_monotonic() {
    let track = corridor(4);
    let mut genome = genome_with(&track, 1);
    let mut previous = genome.farthest_reached();

    for region in [0, 2, 1, 0, 3, 2, 1] {
        genome.record_step(in_region(region), gene(region as f64));
        assert!(genome.farthest_reached() >= previous);
        previous = genome.farthest_reached();
    }
    assert_eq!(previous, 3);
}

#[test]
fn test_truncate_zero_is_noop() {
    let track = corridor(2);
    let mut genome = genome_with(&track, 1);
    genome.record_step(in_region(0), gene(1.0));

    assert_eq!(genome.truncate_on_failure(0), 0);
    assert_eq!(genome.path_record()[0], vec![gene(1.0)]);
}

#[test]
fn test_truncate_spills_into_earlier_buckets() {
    let track = corridor(3);
    let mut genome = genome_with(&track, 1);
    for n in 1..=3 {
        genome.record_step(in_region(0), gene(n as f64));
    }
    genome.record_step(in_region(1), gene(4.0));
    genome.record_step(in_region(1), gene(5.0));

    assert_eq!(genome.truncate_on_failure(3), 3);
    assert_eq!(genome.path_record()[0], vec![gene(1.0), gene(2.0)]);
    assert!(genome.path_record()[1].is_empty());
}

#[test]
fn test_truncate_removes_at_most_what_exists() {
    let track = corridor(2);
    let mut genome = genome_with(&track, 1);
    genome.record_step(in_region(0), gene(1.0));
    genome.record_step(in_region(1), gene(2.0));

    assert_eq!(genome.truncate_on_failure(100), 2);
    assert!(genome.path_record().iter().all(Vec::is_empty));
}

#[test]
fn test_crossover_assembles_whole_buckets() {
    let track = corridor(2);
    let (v1, v2, v3, v4, v5, v6) = (gene(1.0), gene(2.0), gene(3.0), gene(4.0), gene(5.0), gene(6.0));

    let mut a = genome_with(&track, 3);
    a.record_step(in_region(0), v1);
    a.record_step(in_region(0), v2);
    a.record_step(in_region(1), v3);

    let mut b = genome_with(&track, 3);
    b.record_step(in_region(0), v4);
    b.record_step(in_region(1), v5);
    b.record_step(in_region(1), v6);

    // Assembled sequences cut to the genome length; [v4, v3] gets one random gene
    let outcomes = [vec![v1, v2, v5], vec![v1, v2, v3], vec![v4, v3], vec![v4, v5, v6]];

    let mut rng = StdRng::seed_from_u64(11);
    let mut seen = [false; 4];
    for _ in 0..200 {
        let child = a
            .crossover(&b, &MutationSettings::new(0.0), &mut rng)
            .unwrap();
        assert_eq!(child.genes().len(), 3);
        assert!(!child.mutated());

        let matched = outcomes
            .iter()
            .position(|o| child.genes()[..o.len()] == o[..])
            .expect("child is not built from whole parent buckets");
        seen[matched] = true;
    }
    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_crossover_stops_at_first_unreached_checkpoint() {
    let track = corridor(3);
    let mut a = genome_with(&track, 4);
    let mut b = genome_with(&track, 4);

    // Neither parent recorded anything in region 1, so region 2 is never used
    a.record_step(in_region(0), gene(1.0));
    b.record_step(in_region(0), gene(1.0));
    a.record_step(in_region(2), gene(9.0));

    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let child = a.crossover(&b, &MutationSettings::new(0.0), &mut rng).unwrap();
        assert_eq!(child.genes()[0], gene(1.0));
        assert!(!child.genes()[1..].contains(&gene(9.0)));
    }
}

#[test]
fn test_crossover_normalizes_length() {
    let track = corridor(2);
    let mut rng = StdRng::seed_from_u64(3);

    // Nothing recorded: the child is pure padding
    let empty = genome_with(&track, 40);
    let child = empty.crossover(&empty, &MutationSettings::new(0.0), &mut rng).unwrap();
    assert_eq!(child.genes().len(), 40);

    // More recorded genes than the genome holds: the child is cut
    let mut long = genome_with(&track, 5);
    for n in 0..12 {
        long.record_step(in_region(0), gene(n as f64));
    }
    let child = long.crossover(&long, &MutationSettings::new(1.0), &mut rng).unwrap();
    assert_eq!(child.genes().len(), 5);
    assert!(child.mutated());
}

#[test]
fn test_crossover_parent_choice_is_balanced() {
    let track = corridor(1);
    let mut a = genome_with(&track, 1);
    let mut b = genome_with(&track, 1);
    a.record_step(in_region(0), gene(1.0));
    b.record_step(in_region(0), gene(2.0));

    let mut rng = StdRng::seed_from_u64(99);
    let trials = 2000;
    let from_a = (0..trials)
        .filter(|_| {
            let child = a.crossover(&b, &MutationSettings::new(0.0), &mut rng).unwrap();
            child.genes()[0] == gene(1.0)
        })
        .count();

    assert!(from_a > 850 && from_a < 1150, "from_a = {}", from_a);
}

#[test]
fn test_child_inherits_track_and_length_not_id() {
    let track = corridor(2);
    let mut a = genome_with(&track, 7);
    a.set_id(4);
    let mut rng = StdRng::seed_from_u64(8);

    let child = a.crossover(&a, &MutationSettings::new(0.5), &mut rng).unwrap();
    assert_eq!(child.num_genes(), 7);
    assert_eq!(child.id(), 0);
    assert!(Arc::ptr_eq(child.track(), &track));
    assert_eq!(child.path_record().len(), 2);
}
