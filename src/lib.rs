pub mod clock;
pub mod constants;
pub mod engine;
pub mod rng;
pub mod score;
pub mod types;
pub mod world;
pub mod worm;
