pub mod analyzers;
pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod fetch;
pub mod map;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod record;
pub mod render;
pub mod session;
pub mod simulator;
