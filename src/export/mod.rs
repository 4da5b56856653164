//! Placement commands for vector-graphics writers

pub mod commands;

pub use commands::{placement_commands, ColorSource, CubeColor, CubeCommand, CubeStyle, ExportMode, ExportOptions};
