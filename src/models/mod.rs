mod analysis;
mod proposal;
mod review;
mod selection;

pub use analysis::*;
pub use proposal::*;
pub use review::*;
pub use selection::*;
