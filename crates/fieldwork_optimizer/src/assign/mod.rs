pub mod reassign;
pub mod replace;
