//! API request handlers.

pub mod detector;
pub mod health;
pub mod metric;

pub use detector::*;
pub use health::*;
pub use metric::*;
