pub mod chain;
pub mod instances;
pub mod transfers;

pub use chain::{ChainSource, ProbeConfig};
pub use instances::{InstancePaging, InstanceSource};
pub use transfers::TransferSource;
