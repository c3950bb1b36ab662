pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod normalize;
pub mod orbit;
pub mod output;
pub mod parser;
pub mod scheduler;
pub mod sites;
pub mod stats;
