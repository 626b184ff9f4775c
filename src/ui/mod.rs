//! UI module - standalone rendering components

pub mod components;
