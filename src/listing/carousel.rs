use std::collections::HashMap;

use crate::models::Listing;

/// Current image index per listing card.
///
/// Navigation with an image count of zero does nothing.
#[derive(Debug, Clone, Default)]
pub struct CarouselState {
    indices: HashMap<String, usize>,
}

impl CarouselState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every listing at its first image, forgetting previous state
    pub fn reset_for(&mut self, listings: &[Listing]) {
        self.indices = listings.iter().map(|l| (l.id.clone(), 0)).collect();
    }

    pub fn index(&self, id: &str) -> usize {
        self.indices.get(id).copied().unwrap_or(0)
    }

    pub fn advance(&mut self, id: &str, image_count: usize) -> usize {
        if image_count == 0 {
            return self.index(id);
        }
        let next = (self.index(id) + 1) % image_count;
        self.indices.insert(id.to_string(), next);
        next
    }

    pub fn retreat(&mut self, id: &str, image_count: usize) -> usize {
        if image_count == 0 {
            return self.index(id);
        }
        let prev = (self.index(id) % image_count + image_count - 1) % image_count;
        self.indices.insert(id.to_string(), prev);
        prev
    }

    pub fn forget(&mut self, id: &str) {
        self.indices.remove(id);
    }

    /// Image a card should show right now
    pub fn current_image<'a>(&self, listing: &'a Listing) -> Option<&'a str> {
        current(&listing.images, self.index(&listing.id))
    }
}

/// Index for the single open detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalCarousel {
    index: usize,
}

impl ModalCarousel {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn advance(&mut self, image_count: usize) -> usize {
        if image_count > 0 {
            self.index = (self.index + 1) % image_count;
        }
        self.index
    }

    pub fn retreat(&mut self, image_count: usize) -> usize {
        if image_count > 0 {
            self.index = (self.index % image_count + image_count - 1) % image_count;
        }
        self.index
    }

    pub fn current_image<'a>(&self, listing: &'a Listing) -> Option<&'a str> {
        current(&listing.images, self.index)
    }
}

fn current(images: &[String], index: usize) -> Option<&str> {
    if images.is_empty() {
        return None;
    }
    images.get(index % images.len()).map(String::as_str)
}
