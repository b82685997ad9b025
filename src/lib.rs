//! Daemon that periodically looks at the screen, reads the text on it and keeps a compact journal
//! of what was on screen throughout the day. The journal can later be rendered into a digest.
//!

pub mod capture;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod ocr;
pub mod utils;
pub mod window_api;
