mod credential;
mod documentation;
mod generation;
mod health;
mod projects;
pub mod sse;
mod stages;

pub use credential::*;
pub use documentation::*;
pub use generation::*;
pub use health::*;
pub use projects::*;
pub use stages::*;
