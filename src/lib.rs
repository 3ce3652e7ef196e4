pub mod aliases;
pub mod chart;
pub mod cli;
pub mod config;
pub mod env_boot;
pub mod logging;
pub mod orchestrator;
pub mod store;
pub mod sync;
pub mod translate;

pub mod util {
    pub mod env;
}

#[cfg(test)]
mod test_support;
