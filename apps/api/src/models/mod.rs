pub mod allocation;
pub mod candidate;
pub mod project;
