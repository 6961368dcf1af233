// Loader orchestration — lifecycle state machine and the loaded-dependency
// handles it produces.

pub mod dependencies;
pub mod dependency_loader;
