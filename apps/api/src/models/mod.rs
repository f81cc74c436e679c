pub mod candidate;
pub mod session;
