pub mod dashboard;
pub mod health;

pub use dashboard::*;
pub use health::*;
