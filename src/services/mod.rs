pub mod generator;
pub mod prompt;
pub mod reply;
