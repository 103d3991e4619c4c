// demand side of the simulation: matrices, their generators and the
// bounded window an environment observes

pub mod demand;
pub mod generator;
pub mod memory;

pub use demand::DemandMatrix;
pub use generator::{DemandModel, DemandSequence, GeneratorSpec, LoadMode};
pub use memory::DemandMemory;
