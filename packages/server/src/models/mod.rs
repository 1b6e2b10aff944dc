pub mod generation;
pub mod webhook;
