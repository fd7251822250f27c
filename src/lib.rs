//! Distributed cloud-in-cell deposition of particles onto uniform grids.
//!
//! The particles of each round are split into contiguous blocks, one per MPI
//! rank. Every rank deposits its block onto a full-size local mesh with a pool
//! of worker threads, and the local meshes are summed onto the root rank.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod deposit;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod partition;
pub mod reduce;
pub mod source;
pub mod tools;

pub use error::{Error, Result};
