//! Chat navigation core
//!
//! - `codec`: packs "where this control leads back to" into callback payloads
//! - `pagination`: prev/next/jump controls for a list page

pub mod codec;
pub mod pagination;

pub use codec::{DecodeError, NavigationContext, OriginPage, MAX_TOKEN_BYTES};
pub use pagination::{
    build_controls, jump_rows, parse_page, total_pages, PageControls, JUMP_ROW_WIDTH,
    MAX_JUMP_PAGES, MAX_PAGE_INDEX,
};
