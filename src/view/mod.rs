pub mod projector;
pub mod render;
pub mod state;
