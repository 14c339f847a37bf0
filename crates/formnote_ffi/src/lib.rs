//! Flutter bridge crate for the FormNote core.

pub mod api;
