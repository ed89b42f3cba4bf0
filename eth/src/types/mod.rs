mod address;
mod other;

pub use address::*;
pub use ethers::types::U256;
pub use other::*;
