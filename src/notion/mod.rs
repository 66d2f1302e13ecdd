//! Notion publishing: block model, REST client and the create-or-append
//! protocol.

pub mod blocks;
pub mod client;
pub mod publish;

pub use blocks::{Block, Span, build_blocks_for_append, build_blocks_for_new, notion_code_language};
pub use client::{NotionClient, PageRef, RATE_LIMIT_DELAY};
pub use publish::{
    BATCH_SIZE, PublishOutcome, determine_tech_option, extract_date_from_branch,
    format_page_title,
};
