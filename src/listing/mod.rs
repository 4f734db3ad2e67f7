pub mod board;
pub mod carousel;
pub mod filter;

pub use board::{ListingBoard, ModalMode};
pub use carousel::{CarouselState, ModalCarousel};
pub use filter::{
    filter_listings, ActiveFilters, FilterChoice, FilterCriteria, FilterKind, PriceRange,
    SortOrder,
};
