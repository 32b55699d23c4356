pub mod collision;
pub mod config;
pub mod constants;
pub mod devices;
pub mod engine;
pub mod frame;
pub mod ghost;
pub mod grid;
pub mod rng;
pub mod shadow;
pub mod shadow_store;
pub mod sound;
pub mod sync;
pub mod transport;
pub mod types;
