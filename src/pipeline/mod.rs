//! Window tiling and the per-window assembly driver
pub mod microassembler;
pub mod windows;
