pub mod command;
pub mod editor;
pub mod input_metrics;
pub mod layout;
pub mod render;
