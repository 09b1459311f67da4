//! Mock implementations for testing without a real `/sys`.

mod filesystem;

pub use filesystem::{MockFs, MockStatSource};
