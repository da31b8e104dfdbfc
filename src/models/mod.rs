pub mod alarm;
pub mod maintenance;
pub mod policy;
pub mod rule;
pub mod topology;

pub use alarm::*;
pub use maintenance::*;
pub use policy::*;
pub use rule::*;
pub use topology::*;
