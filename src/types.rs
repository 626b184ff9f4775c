//! Common types and data structures

use serde::Deserialize;

/// One gallery entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meme {
    pub url: String,
    pub caption: String,
    pub source_link: String,
}

/// Top-level gallery phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Error,
}

/// Response body of `GET <base>/<category>/<count>`
#[derive(Deserialize)]
pub struct MemeListResponse {
    pub memes: Vec<ApiMeme>,
}

/// Individual meme entry in the response. Unknown fields are ignored.
#[derive(Deserialize)]
pub struct ApiMeme {
    pub url: String,
    pub title: String,
    #[serde(rename = "postLink")]
    pub post_link: String,
}

impl From<ApiMeme> for Meme {
    fn from(api: ApiMeme) -> Self {
        Self {
            url: api.url,
            caption: api.title,
            source_link: api.post_link,
        }
    }
}

/// What gets handed to the share capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn to_clipboard_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.text, self.url)
    }
}

/// Result of a share action, used for user feedback only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    OpenedExternally,
    Failed,
}
