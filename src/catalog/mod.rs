//! Catalogue resources served by the list API

pub mod arrangement;
pub mod show;

pub use arrangement::Arrangement;
pub use show::{Difficulty, Show};

use crate::core::presets::FilterPreset;

/// Presets for a resource name; empty for unknown resources
pub fn presets_for(resource: &str) -> Vec<FilterPreset> {
    match resource {
        show::RESOURCE => show::presets(),
        arrangement::RESOURCE => arrangement::presets(),
        _ => Vec::new(),
    }
}
