pub mod ambient;
pub mod clipboard;
pub mod minigame;
pub mod player;
pub mod settings;
pub mod toast;
