pub mod scanner;
pub mod task;

pub use scanner::DirectoryScanner;
pub use task::{FileReport, FileTask, RoutingOutcome};
