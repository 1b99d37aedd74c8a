pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod gtfs;
pub mod metadata;
pub mod output;
pub mod parser;
pub mod results;
pub mod rules;
pub mod stats;
pub mod validators;

#[cfg(test)]
mod test_utils;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
