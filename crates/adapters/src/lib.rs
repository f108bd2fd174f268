pub mod http;
pub mod presenters;
pub mod sync;
pub mod thumbs;

pub use http::{decode_cards, HttpBackend};
pub use presenters::{
    present_card_row, present_collector_number, present_page_footer, present_price,
    present_stats,
};
pub use sync::BackgroundSelectionSync;
pub use thumbs::{
    BackgroundThumbnailLoader, FsThumbnailCache, HttpImageFetcher, ImageFetcher, THUMBNAIL_EDGE,
};
