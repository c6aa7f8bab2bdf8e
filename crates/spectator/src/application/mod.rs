//! Application layer: the fetch and poll services driven by the view.

pub mod services;
