pub mod amount;
pub mod buyer;
pub mod catalog;
pub mod intent;
pub mod ports;
