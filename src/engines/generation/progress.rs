/// Observer of a running search
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, covered: usize, total: usize);
    fn on_search_finished(&mut self, generations: usize, covered: usize, total: usize);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        println!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, generation: usize, covered: usize, total: usize) {
        println!(
            "Generation {} complete. Covered goals: {}/{}",
            generation + 1, covered, total
        );
    }

    fn on_search_finished(&mut self, generations: usize, covered: usize, total: usize) {
        println!(
            "Search finished after {} generations. Covered goals: {}/{}",
            generations, covered, total
        );
    }
}

/// Reports nothing
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_generation_complete(&mut self, _generation: usize, _covered: usize, _total: usize) {}
    fn on_search_finished(&mut self, _generations: usize, _covered: usize, _total: usize) {}
}

// For reporting from a worker thread
pub struct ChannelProgressCallback {
    worker: usize,
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    GenerationStart { worker: usize, generation: usize },
    GenerationComplete { worker: usize, generation: usize, covered: usize, total: usize },
    Finished { worker: usize, generations: usize, covered: usize, total: usize },
}

impl ChannelProgressCallback {
    pub fn new(worker: usize, sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { worker, sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart {
            worker: self.worker,
            generation,
        });
    }

    fn on_generation_complete(&mut self, generation: usize, covered: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            worker: self.worker,
            generation,
            covered,
            total,
        });
    }

    fn on_search_finished(&mut self, generations: usize, covered: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::Finished {
            worker: self.worker,
            generations,
            covered,
            total,
        });
    }
}
