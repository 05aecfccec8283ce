pub mod commands;
pub mod deps;
pub mod golang;
pub mod index;
pub mod runtime;
pub mod stdlib;
