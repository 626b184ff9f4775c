//! Application constants and configuration

pub const DEFAULT_API_BASE_URL: &str = "https://meme-api.com/gimme";
pub const DEFAULT_CATEGORY: &str = "wholesomememes";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "Meme Gallery";

/// Overrides the API base URL from settings.json
pub const API_BASE_ENV: &str = "MEME_GALLERY_API_BASE";

/// Items requested on first load, and added by every "load more"
pub const PAGE_SIZE: usize = 12;

pub const SHARE_TEXT: &str = "Check out this wholesome meme!";
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load memes. Please try again later.";

/// Concurrent image downloads
pub const MAX_IMAGE_FETCHES: usize = 8;

/// Decoded images are downscaled to fit this edge length
pub const MAX_IMAGE_EDGE: u32 = 720;

pub const HEADER_TITLE: &str = "For Sudeeksha";
pub const HEADER_TAGLINE: &str =
    "A curated collection of wholesome memes to brighten your day and make you smile";
pub const FOOTER_TEXT: &str = "for Sudeeksha from darkwingPatil";
pub const LOADING_TEXT: &str = "Loading wholesome moments...";
