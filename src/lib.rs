//! Enemy behavior simulator: decodes enemy skill programs, walks them under simulated
//! battle states and summarizes what each enemy does.

pub mod batch;
pub mod config;
pub mod logging;
pub mod summary;
pub mod vm;
