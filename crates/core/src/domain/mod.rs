pub mod documentation;
pub mod generation;
pub mod project;
pub mod stage;
