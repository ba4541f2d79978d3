pub mod branch;
pub mod health;
pub mod report;

pub use branch::*;
pub use health::*;
pub use report::*;
