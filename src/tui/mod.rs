pub mod app;
pub mod render;
pub mod theme;

pub use app::run;
