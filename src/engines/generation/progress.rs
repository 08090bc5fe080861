use std::sync::mpsc::Sender;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, mating_pool_size: usize);
    fn on_finished(&mut self, generation: usize, agent_id: usize);
}

impl<C: ProgressCallback + ?Sized> ProgressCallback for &mut C {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, mating_pool_size: usize) {
        (**self).on_generation_complete(generation, best_fitness, mating_pool_size);
    }

    fn on_finished(&mut self, generation: usize, agent_id: usize) {
        (**self).on_finished(generation, agent_id);
    }
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, mating_pool_size: usize) {
        println!(
            "Generation {} complete. Best fitness: {:.4}, mating pool size: {}",
            generation + 1,
            best_fitness,
            mating_pool_size
        );
    }

    fn on_finished(&mut self, generation: usize, agent_id: usize) {
        println!("Car {} reached the finish in generation {}", agent_id, generation + 1);
    }
}

/// Forwards progress to another thread, e.g. a renderer
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete { generation: usize, best_fitness: f64, mating_pool_size: usize },
    Finished { generation: usize, agent_id: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, mating_pool_size: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            best_fitness,
            mating_pool_size,
        });
    }

    fn on_finished(&mut self, generation: usize, agent_id: usize) {
        let _ = self.sender.send(ProgressMessage::Finished { generation, agent_id });
    }
}
