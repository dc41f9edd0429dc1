//! Individual widget renderers composed by [`super::app::draw`].

pub mod activity_feed;
pub mod chat;
pub mod placeholder;
pub mod settings;
pub mod status;
pub mod visualizer;
