//! Prompt templates, output shapes and offline datasets for each feature.

pub mod career;
pub mod scan;
pub mod trivia;
