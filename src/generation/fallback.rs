//! Placeholder artwork for when image generation fails.

use rand::Rng;

use crate::card::ImageRef;

/// Stock photo service sized to the card canvas.
pub const PLACEHOLDER_BASE: &str = "https://picsum.photos/800/600";

/// A random placeholder, `https://picsum.photos/800/600?random=<0..=999>`.
pub fn placeholder_image() -> ImageRef {
    placeholder_with_seed(rand::rng().random_range(0..1000))
}

pub fn placeholder_with_seed(seed: u32) -> ImageRef {
    ImageRef::new(format!("{}?random={}", PLACEHOLDER_BASE, seed))
}
