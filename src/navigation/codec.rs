//! Navigation codec
//!
//! A [`NavigationContext`] travels inside a chat control's callback payload
//! as three space-separated fields:
//!
//! ```text
//! <uuid> <origin code> [<continuation token>]
//! ```
//!
//! The token is the page index for list origins and the search text for
//! search results. It is last, so it may itself contain spaces. Telegram caps
//! callback data at 64 bytes, so the token is truncated on construction to
//! whatever remains after the control prefix, the UUID, the origin code and
//! the separators.

use std::fmt;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::pagination::parse_page;

/// Telegram's callback_data ceiling
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Bytes reserved for the control prefix (`"crd:"` and friends)
pub const CONTROL_PREFIX_BYTES: usize = 4;

/// Canonical hyphenated UUID text length
const UUID_TEXT_BYTES: usize = 36;

/// Longest continuation token that still fits one payload:
/// prefix + uuid + ' ' + one-digit origin + ' ' + token
pub const MAX_TOKEN_BYTES: usize = MAX_PAYLOAD_BYTES - CONTROL_PREFIX_BYTES - UUID_TEXT_BYTES - 3;

/// Page a control was rendered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginPage {
    MainMenu,
    ItemList,
    SearchResults,
    FavoritesList,
}

impl OriginPage {
    pub fn code(self) -> u8 {
        match self {
            OriginPage::MainMenu => 0,
            OriginPage::ItemList => 1,
            OriginPage::SearchResults => 2,
            OriginPage::FavoritesList => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(OriginPage::MainMenu),
            1 => Some(OriginPage::ItemList),
            2 => Some(OriginPage::SearchResults),
            3 => Some(OriginPage::FavoritesList),
            _ => None,
        }
    }

    /// Whether this origin needs a continuation token to be re-rendered
    pub fn carries_token(self) -> bool {
        !matches!(self, OriginPage::MainMenu)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty navigation payload")]
    Empty,

    #[error("cannot parse identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid origin page: {0}")]
    InvalidOrigin(String),
}

/// Target item plus the page the user came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationContext {
    pub id: Uuid,
    pub origin: OriginPage,
    pub token: String,
}

impl NavigationContext {
    /// Build a context for a freshly rendered control.
    ///
    /// The token is dropped for origins that do not carry one and otherwise
    /// cut to [`MAX_TOKEN_BYTES`] on a char boundary.
    pub fn new(id: Uuid, origin: OriginPage, token: impl AsRef<str>) -> Self {
        let token = if origin.carries_token() {
            truncate_token(token.as_ref()).to_string()
        } else {
            String::new()
        };
        Self { id, origin, token }
    }

    /// Context used when a payload cannot be decoded
    pub fn fallback() -> Self {
        Self {
            id: Uuid::nil(),
            origin: OriginPage::MainMenu,
            token: String::new(),
        }
    }

    pub fn encode(&self) -> String {
        if self.token.is_empty() {
            format!("{} {}", self.id, self.origin.code())
        } else {
            format!("{} {} {}", self.id, self.origin.code(), self.token)
        }
    }

    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        if payload.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut parts = payload.splitn(3, ' ');
        let id_part = parts.next().unwrap_or_default();
        let id = Uuid::parse_str(id_part)
            .map_err(|_| DecodeError::InvalidIdentifier(id_part.to_string()))?;

        let origin_part = parts.next().unwrap_or_default();
        let origin = origin_part
            .parse::<u8>()
            .ok()
            .and_then(OriginPage::from_code)
            .ok_or_else(|| DecodeError::InvalidOrigin(origin_part.to_string()))?;

        let token = parts.next().unwrap_or_default().to_string();

        Ok(Self { id, origin, token })
    }

    /// Decode, falling back to [`NavigationContext::fallback`] on malformed input
    pub fn decode_or_fallback(payload: &str) -> Self {
        Self::decode(payload).unwrap_or_else(|e| {
            warn!(payload = %payload, error = %e, "Malformed navigation payload");
            Self::fallback()
        })
    }

    /// Page index carried by list origins, 0 when absent, unparsable or out of range
    pub fn page(&self) -> u64 {
        parse_page(&self.token)
    }
}

impl fmt::Display for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Longest prefix of `token` within [`MAX_TOKEN_BYTES`], cut on a char boundary
pub fn truncate_token(token: &str) -> &str {
    if token.len() <= MAX_TOKEN_BYTES {
        return token;
    }
    let mut end = MAX_TOKEN_BYTES;
    while !token.is_char_boundary(end) {
        end -= 1;
    }
    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "836e6133-2d1c-4d9c-9d8e-2f1f5b0c6a11";

    fn id() -> Uuid {
        Uuid::parse_str(ID).unwrap()
    }

    #[test]
    fn test_item_list_roundtrip() {
        let ctx = NavigationContext::new(id(), OriginPage::ItemList, "2");
        let encoded = ctx.encode();
        assert_eq!(encoded, format!("{} 1 2", ID));

        let decoded = NavigationContext::decode(&encoded).unwrap();
        assert_eq!(decoded.origin, OriginPage::ItemList);
        assert_eq!(decoded.token, "2");
        assert_eq!(decoded, ctx);
        assert_eq!(decoded.page(), 2);
    }

    #[test]
    fn test_main_menu_has_no_token() {
        let ctx = NavigationContext::new(id(), OriginPage::MainMenu, "ignored");
        assert_eq!(ctx.token, "");
        assert_eq!(ctx.encode(), format!("{} 0", ID));
        assert_eq!(NavigationContext::decode(&ctx.encode()).unwrap(), ctx);
    }

    #[test]
    fn test_roundtrip_for_every_origin() {
        let tokens = ["", "0", "17", "classic mojito", "  spaced  out ", "негрони"];
        for origin in [
            OriginPage::MainMenu,
            OriginPage::ItemList,
            OriginPage::SearchResults,
            OriginPage::FavoritesList,
        ] {
            for token in tokens {
                let ctx = NavigationContext::new(Uuid::new_v4(), origin, token);
                assert_eq!(NavigationContext::decode(&ctx.encode()).unwrap(), ctx);
            }
        }
    }

    #[test]
    fn test_missing_token_decodes_as_empty() {
        let decoded = NavigationContext::decode(&format!("{} 2", ID)).unwrap();
        assert_eq!(decoded.origin, OriginPage::SearchResults);
        assert_eq!(decoded.token, "");
        assert_eq!(decoded.page(), 0);
    }

    #[test]
    fn test_malformed_identifier() {
        assert_eq!(
            NavigationContext::decode("not-a-uuid 1 2"),
            Err(DecodeError::InvalidIdentifier("not-a-uuid".into()))
        );
        assert_eq!(NavigationContext::decode("   "), Err(DecodeError::Empty));
        assert_eq!(
            NavigationContext::decode_or_fallback("garbage"),
            NavigationContext::fallback()
        );
    }

    #[test]
    fn test_invalid_origin() {
        assert!(matches!(
            NavigationContext::decode(&format!("{} 9", ID)),
            Err(DecodeError::InvalidOrigin(_))
        ));
        assert!(matches!(
            NavigationContext::decode(ID),
            Err(DecodeError::InvalidOrigin(_))
        ));
    }

    #[test]
    fn test_long_search_text_is_truncated_deterministically() {
        let text = "очень длинное название коктейля с продолжением";
        let a = NavigationContext::new(id(), OriginPage::SearchResults, text);
        let b = NavigationContext::new(id(), OriginPage::SearchResults, text);
        assert_eq!(a, b);
        assert!(a.token.len() <= MAX_TOKEN_BYTES);
        assert!(text.starts_with(&a.token));
        assert!(CONTROL_PREFIX_BYTES + a.encode().len() <= MAX_PAYLOAD_BYTES);
        assert_eq!(NavigationContext::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn test_short_token_untouched() {
        assert_eq!(truncate_token("mojito"), "mojito");
        let exact = "a".repeat(MAX_TOKEN_BYTES);
        assert_eq!(truncate_token(&exact), exact);
        assert_eq!(truncate_token(&"a".repeat(MAX_TOKEN_BYTES + 5)).len(), MAX_TOKEN_BYTES);
    }
}
