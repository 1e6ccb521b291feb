//! Mannequin - data-driven poses, actions and skin variants for posable figurines

pub mod core;
pub mod animation;
pub mod library;
pub mod variant;
pub mod selection;
pub mod figurine;
pub mod studio;
