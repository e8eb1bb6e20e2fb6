pub mod boost;
pub mod like;
pub mod tier;
pub mod usage;

pub use boost::*;
pub use like::*;
pub use tier::*;
pub use usage::*;
