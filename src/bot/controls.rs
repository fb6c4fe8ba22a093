//! Control payloads
//!
//! Every control payload starts with a three-letter kind, optionally followed
//! by `:` and an argument. Parsing is a fixed table lookup from kind to
//! action; no state is shared between chats.
//!
//! | kind | argument | action |
//! |---|---|---|
//! | `mnu` | | main menu |
//! | `lst` | page | catalog list page |
//! | `fav` | page | favorites list page |
//! | `jmp` | `<origin>:<total pages>` | page picker |
//! | `crd` | navigation context | cocktail card |
//! | `sbn` | | search prompt |
//! | `srs` | query | search results |
//! | `afv` / `rfv` | navigation context | add / remove favorite |
//! | `reg` / `rgc` | | registration prompt / confirm |
//! | `prf` | | profile |
//! | `del` / `dlc` | | profile deletion prompt / confirm |

use crate::navigation::{parse_page, NavigationContext, OriginPage, MAX_JUMP_PAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    MainMenu,
    List,
    Favorites,
    PageJump,
    Card,
    SearchPrompt,
    SearchResults,
    AddFavorite,
    RemoveFavorite,
    RegisterPrompt,
    RegisterConfirm,
    Profile,
    DeletePrompt,
    DeleteConfirm,
}

const CONTROL_KINDS: &[(&str, ControlKind)] = &[
    ("mnu", ControlKind::MainMenu),
    ("lst", ControlKind::List),
    ("fav", ControlKind::Favorites),
    ("jmp", ControlKind::PageJump),
    ("crd", ControlKind::Card),
    ("sbn", ControlKind::SearchPrompt),
    ("srs", ControlKind::SearchResults),
    ("afv", ControlKind::AddFavorite),
    ("rfv", ControlKind::RemoveFavorite),
    ("reg", ControlKind::RegisterPrompt),
    ("rgc", ControlKind::RegisterConfirm),
    ("prf", ControlKind::Profile),
    ("del", ControlKind::DeletePrompt),
    ("dlc", ControlKind::DeleteConfirm),
];

impl ControlKind {
    pub fn prefix(self) -> &'static str {
        CONTROL_KINDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(prefix, _)| *prefix)
            .unwrap_or("mnu")
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        CONTROL_KINDS
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, kind)| *kind)
    }
}

/// Decoded control activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    MainMenu,
    List { page: u64 },
    Favorites { page: u64 },
    PageJump { origin: OriginPage, total_pages: u64 },
    Card(NavigationContext),
    SearchPrompt,
    SearchResults { query: String },
    AddFavorite(NavigationContext),
    RemoveFavorite(NavigationContext),
    RegisterPrompt,
    RegisterConfirm,
    Profile,
    DeletePrompt,
    DeleteConfirm,
    Unknown(String),
}

impl ControlAction {
    /// Map a payload to its action. Malformed arguments fall back to defaults.
    pub fn parse(payload: &str) -> Self {
        let (prefix, arg) = match payload.split_once(':') {
            Some((prefix, arg)) => (prefix, arg),
            None => (payload, ""),
        };

        let Some(kind) = ControlKind::from_prefix(prefix) else {
            return ControlAction::Unknown(payload.to_string());
        };

        match kind {
            ControlKind::MainMenu => ControlAction::MainMenu,
            ControlKind::List => ControlAction::List {
                page: parse_page(arg),
            },
            ControlKind::Favorites => ControlAction::Favorites {
                page: parse_page(arg),
            },
            ControlKind::PageJump => {
                let (origin, total) = arg.split_once(':').unwrap_or((arg, ""));
                ControlAction::PageJump {
                    origin: origin
                        .parse::<u8>()
                        .ok()
                        .and_then(OriginPage::from_code)
                        .unwrap_or(OriginPage::ItemList),
                    total_pages: total.parse::<u64>().unwrap_or(1).clamp(1, MAX_JUMP_PAGES),
                }
            }
            ControlKind::Card => ControlAction::Card(NavigationContext::decode_or_fallback(arg)),
            ControlKind::SearchPrompt => ControlAction::SearchPrompt,
            ControlKind::SearchResults => ControlAction::SearchResults {
                query: arg.to_string(),
            },
            ControlKind::AddFavorite => {
                ControlAction::AddFavorite(NavigationContext::decode_or_fallback(arg))
            }
            ControlKind::RemoveFavorite => {
                ControlAction::RemoveFavorite(NavigationContext::decode_or_fallback(arg))
            }
            ControlKind::RegisterPrompt => ControlAction::RegisterPrompt,
            ControlKind::RegisterConfirm => ControlAction::RegisterConfirm,
            ControlKind::Profile => ControlAction::Profile,
            ControlKind::DeletePrompt => ControlAction::DeletePrompt,
            ControlKind::DeleteConfirm => ControlAction::DeleteConfirm,
        }
    }

    pub fn kind(&self) -> Option<ControlKind> {
        Some(match self {
            ControlAction::MainMenu => ControlKind::MainMenu,
            ControlAction::List { .. } => ControlKind::List,
            ControlAction::Favorites { .. } => ControlKind::Favorites,
            ControlAction::PageJump { .. } => ControlKind::PageJump,
            ControlAction::Card(_) => ControlKind::Card,
            ControlAction::SearchPrompt => ControlKind::SearchPrompt,
            ControlAction::SearchResults { .. } => ControlKind::SearchResults,
            ControlAction::AddFavorite(_) => ControlKind::AddFavorite,
            ControlAction::RemoveFavorite(_) => ControlKind::RemoveFavorite,
            ControlAction::RegisterPrompt => ControlKind::RegisterPrompt,
            ControlAction::RegisterConfirm => ControlKind::RegisterConfirm,
            ControlAction::Profile => ControlKind::Profile,
            ControlAction::DeletePrompt => ControlKind::DeletePrompt,
            ControlAction::DeleteConfirm => ControlKind::DeleteConfirm,
            ControlAction::Unknown(_) => return None,
        })
    }

    /// Payload that parses back to this action
    pub fn payload(&self) -> String {
        let Some(kind) = self.kind() else {
            return ControlKind::MainMenu.prefix().to_string();
        };
        let prefix = kind.prefix();
        match self {
            ControlAction::List { page } | ControlAction::Favorites { page } => {
                format!("{}:{}", prefix, page)
            }
            ControlAction::PageJump {
                origin,
                total_pages,
            } => format!("{}:{}:{}", prefix, origin.code(), total_pages),
            ControlAction::Card(ctx)
            | ControlAction::AddFavorite(ctx)
            | ControlAction::RemoveFavorite(ctx) => format!("{}:{}", prefix, ctx.encode()),
            ControlAction::SearchResults { query } => format!("{}:{}", prefix, query),
            _ => prefix.to_string(),
        }
    }

    /// Control that re-renders the surface a card was opened from
    pub fn back_to(ctx: &NavigationContext) -> Self {
        match ctx.origin {
            OriginPage::MainMenu => ControlAction::MainMenu,
            OriginPage::ItemList => ControlAction::List { page: ctx.page() },
            OriginPage::FavoritesList => ControlAction::Favorites { page: ctx.page() },
            OriginPage::SearchResults => ControlAction::SearchResults {
                query: ctx.token.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::codec::MAX_PAYLOAD_BYTES;
    use uuid::Uuid;

    #[test]
    fn test_payloads_parse_back() {
        let ctx = NavigationContext::new(Uuid::new_v4(), OriginPage::ItemList, "3");
        let actions = vec![
            ControlAction::MainMenu,
            ControlAction::List { page: 4 },
            ControlAction::Favorites { page: 0 },
            ControlAction::PageJump {
                origin: OriginPage::FavoritesList,
                total_pages: 7,
            },
            ControlAction::Card(ctx.clone()),
            ControlAction::SearchPrompt,
            ControlAction::SearchResults {
                query: "old fashioned".into(),
            },
            ControlAction::AddFavorite(ctx.clone()),
            ControlAction::RemoveFavorite(ctx),
            ControlAction::RegisterPrompt,
            ControlAction::RegisterConfirm,
            ControlAction::Profile,
            ControlAction::DeletePrompt,
            ControlAction::DeleteConfirm,
        ];
        for action in actions {
            assert_eq!(ControlAction::parse(&action.payload()), action);
        }
    }

    #[test]
    fn test_unknown_payload() {
        assert_eq!(
            ControlAction::parse("zzz:1"),
            ControlAction::Unknown("zzz:1".into())
        );
        assert_eq!(ControlAction::parse(""), ControlAction::Unknown("".into()));
    }

    #[test]
    fn test_oversized_page_arguments_are_bounded() {
        assert_eq!(
            ControlAction::parse("lst:18446744073709551615"),
            ControlAction::List { page: 0 }
        );
        assert_eq!(
            ControlAction::parse("fav:99999999999"),
            ControlAction::Favorites { page: 0 }
        );
        assert_eq!(
            ControlAction::parse("jmp:1:18446744073709551615"),
            ControlAction::PageJump {
                origin: OriginPage::ItemList,
                total_pages: MAX_JUMP_PAGES
            }
        );
        assert_eq!(
            ControlAction::parse("jmp:3:0"),
            ControlAction::PageJump {
                origin: OriginPage::FavoritesList,
                total_pages: 1
            }
        );
    }

    #[test]
    fn test_malformed_arguments_fall_back() {
        assert_eq!(ControlAction::parse("lst:abc"), ControlAction::List { page: 0 });
        assert_eq!(
            ControlAction::parse("crd:broken"),
            ControlAction::Card(NavigationContext::fallback())
        );
        assert_eq!(
            ControlAction::parse("jmp:x"),
            ControlAction::PageJump {
                origin: OriginPage::ItemList,
                total_pages: 1
            }
        );
    }

    #[test]
    fn test_back_targets() {
        let id = Uuid::new_v4();
        let from_list = NavigationContext::new(id, OriginPage::ItemList, "2");
        assert_eq!(ControlAction::back_to(&from_list), ControlAction::List { page: 2 });

        let from_search = NavigationContext::new(id, OriginPage::SearchResults, "мохито");
        assert_eq!(
            ControlAction::back_to(&from_search),
            ControlAction::SearchResults {
                query: "мохито".into()
            }
        );

        let from_menu = NavigationContext::new(id, OriginPage::MainMenu, "");
        assert_eq!(ControlAction::back_to(&from_menu), ControlAction::MainMenu);
    }

    #[test]
    fn test_card_payload_fits_callback_data() {
        let ctx = NavigationContext::new(
            Uuid::new_v4(),
            OriginPage::SearchResults,
            "очень длинный поисковый запрос про коктейли",
        );
        for action in [
            ControlAction::Card(ctx.clone()),
            ControlAction::AddFavorite(ctx.clone()),
            ControlAction::RemoveFavorite(ctx.clone()),
            ControlAction::back_to(&ctx),
        ] {
            assert!(action.payload().len() <= MAX_PAYLOAD_BYTES);
        }
    }
}
