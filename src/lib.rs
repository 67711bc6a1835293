//! Shared-nonce search over ECDSA signatures
//!
//! Treats the nonce of a fixed signature set as one unknown integer `k` and
//! searches for the value under which every signature yields the same private
//! key. Candidates are scored by the pairwise spread of the recovered keys,
//! explored by simulated annealing, polished by hill-climbing, fanned out over
//! a worker pool, and restarted from points suggested by past cycles.

pub mod campaign;
pub mod config;
pub mod error;
pub mod math;
pub mod provider;
pub mod search;
pub mod signature;
pub mod synthetic;

pub use campaign::{Campaign, CycleReport, Recovery};
pub use config::SearchConfig;
pub use error::{InputError, SearchError};
pub use search::{Objective, SearchResult};
pub use signature::{Signature, SignatureInput};
