pub mod common;
pub mod import;
pub mod list;
pub mod run;
pub mod show;
