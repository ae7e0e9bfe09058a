pub mod app;
pub mod color;
pub mod config;
pub mod density;
pub mod dynamics;
pub mod features;
pub mod orbit;
pub mod particles;
pub mod render;
pub mod terminal;
pub mod worker;
