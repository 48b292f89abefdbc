pub mod load_balancer;
pub mod store;

pub use load_balancer::*;
pub use store::*;
