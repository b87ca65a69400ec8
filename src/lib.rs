//! Terminal fireworks festival: rockets climb to a target, burst into one of
//! five patterns and fade, while a scheduler plays timed shows.

pub mod app;
pub mod canvas;
pub mod color;
pub mod config;
pub mod firework;
pub mod particle;
pub mod patterns;
pub mod show;
pub mod simulation;
pub mod sound;
pub mod timers;
