mod expense;
mod money;
mod shares;

pub use expense::*;
pub use money::*;
pub use shares::*;
