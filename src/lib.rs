pub mod analysis;
pub mod boundary;
pub mod communicator;
pub mod config;
pub mod error;
pub mod field;
pub mod functional;
pub mod lattice;
pub mod multi_block;
pub mod statistics;
pub mod tracer;
pub mod util;
