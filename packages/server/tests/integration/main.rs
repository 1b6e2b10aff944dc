mod common;
mod generation;
mod lifecycle;
mod webhook;
