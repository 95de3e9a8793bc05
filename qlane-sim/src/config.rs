//! Runner parameters

/// Options controlling a simulation run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Kernel workers for the data-parallel loops.
    ///
    /// Default: 1
    pub num_workers: usize,

    /// Diagnostic verbosity.
    ///
    /// 0 is silent, 1 reports total elapsed time, 2 adds per-gate timing.
    ///
    /// Default: 0
    pub verbosity: u32,

    /// Seed for measurement outcomes; a fixed seed gives a reproducible
    /// run.
    ///
    /// Default: 0
    pub seed: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            num_workers: 1,
            verbosity: 0,
            seed: 0,
        }
    }
}

impl RunParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let params = RunParams::new().with_workers(4).with_seed(7).with_verbosity(2);
        assert_eq!(params.num_workers, 4);
        assert_eq!(params.seed, 7);
        assert_eq!(params.verbosity, 2);
    }
}
