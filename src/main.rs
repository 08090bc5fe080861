use anyhow::Context;
use evoracer::config::ConfigManager;
use evoracer::data::TrackFileConnector;
use evoracer::engines::generation::ConsoleProgressCallback;
use evoracer::engines::physics::PointMassWorld;
use evoracer::engines::Simulation;
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Usage: evoracer [CONFIG.toml]
    // Settings can also be overridden with EVORACER__<SECTION>__<FIELD>.
    let config_path = env::args().nth(1).map(PathBuf::from);

    let manager = ConfigManager::new();
    manager
        .load_layered(config_path.as_ref())
        .context("loading configuration")?;
    let config = manager.get();

    println!("Running with:");
    println!("  Population size: {}", config.evolution.population_size);
    println!("  Mutation rate: {}", config.evolution.mutation_rate);
    println!("  Lifespan: {} steps", config.simulation.lifespan);
    println!("  Track file: {}", config.simulation.track_file.display());
    println!();

    let layout = TrackFileConnector::load(&config.simulation.track_file)
        .with_context(|| format!("loading track {}", config.simulation.track_file.display()))?;
    let metadata = TrackFileConnector::create_metadata(&config.simulation.track_file, &layout);
    log::info!("Track: {:?}", metadata);

    let physics = PointMassWorld::from_layout(&layout, &config.simulation);
    let mut simulation = Simulation::new(&config, &layout, physics)?;

    let summary = simulation.run(config.simulation.max_generations, ConsoleProgressCallback)?;

    match summary.winner {
        Some(car) => println!(
            "\nCar {} finished the track. Time taken: {:.1}s, generations: {}",
            car, summary.elapsed_secs, summary.generations
        ),
        None => println!(
            "\nNo car finished within {} generations ({:.1}s). Best fitness: {:.4}",
            summary.generations, summary.elapsed_secs, summary.best_fitness
        ),
    }

    Ok(())
}
