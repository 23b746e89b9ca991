pub mod ancestry;
pub mod cli;
pub mod cohort;
pub mod config;
pub mod error;
pub mod features;
pub mod kinship;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod results;
