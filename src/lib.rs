pub mod akaze;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod hamming;
pub mod imdb;
pub mod index;
pub mod matcher;
mod metrics;
pub mod registry;
pub mod selector;
mod server;
pub mod utils;

pub use config::Opts;
pub use error::Error;
pub use imdb::{IMDB, IMDBBuilder};
