pub mod execution;
pub use execution::{Identity, Seed, NAMESPACE};
pub mod wager;
