mod setups;
mod steps;
mod troca_world;

pub use troca_world::TrocaWorld;
