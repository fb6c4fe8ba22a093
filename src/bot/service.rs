//! Catalog service: the bot's navigation state machine
//!
//! Each inbound event is mapped to one rendered [`Surface`]. States are
//! main menu, catalog list page, favorites list page, cocktail card, search
//! prompt and search results. Controls on every rendered surface carry a
//! freshly encoded [`NavigationContext`] pointing back at the surface being
//! left, so no per-chat navigation state lives in the process. The only
//! per-user state is the session token that marks "next text is a search".
//!
//! Store failures never escape: the surface is rendered with an empty result
//! set and the failure is logged.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::bot::controls::ControlAction;
use crate::bot::render;
use crate::bot::surface::{Control, RenderTarget, Surface};
use crate::config::Args;
use crate::domain::{CocktailFilter, CocktailsPaged, Pagination, User};
use crate::navigation::codec::truncate_token;
use crate::navigation::{build_controls, jump_rows, NavigationContext, OriginPage, MAX_PAGE_INDEX};
use crate::services::{Catalog, Favorites};
use crate::session::{SessionCache, SessionState};

// ============================================================================
// Texts
// ============================================================================

const MAIN_MENU_TEXT: &str = "Основное меню:";
const LIST_TEXT: &str = "Коктейли:";
const FAVORITES_TEXT: &str = "Избранные коктейли:";
const PAGES_TEXT: &str = "Доступные страницы:";
const SEARCH_PROMPT_TEXT: &str = "Напишите мне полное название коктейля или его часть.";
const SEARCH_RESULTS_TEXT: &str = "Найденные коктейли:";
const EMPTY_LIST_TEXT: &str = "Здесь пока ничего нет.";
const CARD_NOT_FOUND_TEXT: &str = "Коктейль не найден.";
const PROFILE_TEXT: &str = "Личный кабинет:";
const UNRECOGNIZED_TEXT: &str =
    "Я не могу распознать вашу команду. Введите /menu для перемещения в главное меню";
const REGISTER_TEXT: &str = "Подтверждая регистрацию, вы соглашаетесь на то, что мы сохраняем ваш идентификатор пользователя Telegram. Другую информацию мы не собираем.\n\n\
У вас появляется возможность сохранять любимые коктейли в свою личную подборку, чтобы проще было их искать.\n\n\
В любой момент вы можете полностью удалить свой профиль.\n\
Приятного использования ☺️";
const DELETE_TEXT: &str = "Вы точно хотите удалить свой профиль?\n\nВсе избранные коктейли будут удалены. 😔";

const REGISTERED_ALERT: &str = "Вы успешно зарегистрированы";
const DELETED_ALERT: &str = "Вы успешно удалили свою учетную запись";
const FAILED_ALERT: &str = "Не получилось, попробуйте позже";

pub const BTN_LIST: &str = "📋 Список коктейлей";
pub const BTN_SEARCH: &str = "🔎 Поиск по названию";
pub const BTN_PROFILE: &str = "🗄 Личная страница";
pub const BTN_REGISTER: &str = "🔑 Регистрация";
pub const BTN_BACK: &str = "👈 Назад";
pub const BTN_PREV: &str = "👈";
pub const BTN_NEXT: &str = "👉";
pub const BTN_FAVORITES: &str = "⭐ Избранные коктейли";
pub const BTN_DELETE_PROFILE: &str = "🗑 Удалить профиль";
pub const BTN_CONFIRM_REGISTER: &str = "✅ Зарегистрироваться";
pub const BTN_CONFIRM_DELETE: &str = "✅ Да, удалить";
pub const BTN_ADD_FAVORITE: &str = "⭐ В избранное";
pub const BTN_REMOVE_FAVORITE: &str = "💔 Убрать из избранного";
pub const BTN_SEARCH_AGAIN: &str = "🔎 Искать ещё";

// ============================================================================
// Events
// ============================================================================

/// Inbound chat event, already stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free text or a slash command
    Text {
        user_id: i64,
        chat_id: i64,
        text: String,
    },
    /// A control on a previously rendered surface was pressed
    Control {
        user_id: i64,
        chat_id: i64,
        message_id: i64,
        callback_id: String,
        payload: String,
    },
}

impl InboundEvent {
    pub fn user_id(&self) -> i64 {
        match self {
            InboundEvent::Text { user_id, .. } | InboundEvent::Control { user_id, .. } => *user_id,
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        match self {
            InboundEvent::Control { callback_id, .. } => Some(callback_id),
            InboundEvent::Text { .. } => None,
        }
    }
}

/// What to draw, where, and an optional pop-up for the pressed control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub target: RenderTarget,
    pub surface: Surface,
    pub alert: Option<String>,
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct BotSettings {
    pub page_size: u64,
    pub search_limit: u64,
    pub session_ttl: Duration,
}

impl BotSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            page_size: args.page_size,
            search_limit: args.search_limit,
            session_ttl: args.session_ttl(),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            search_limit: 20,
            session_ttl: Duration::from_secs(600),
        }
    }
}

pub struct CatalogService {
    catalog: Catalog,
    favorites: Favorites,
    sessions: Arc<dyn SessionCache>,
    settings: BotSettings,
}

impl CatalogService {
    pub fn new(
        catalog: Catalog,
        favorites: Favorites,
        sessions: Arc<dyn SessionCache>,
        settings: BotSettings,
    ) -> Self {
        Self {
            catalog,
            favorites,
            sessions,
            settings,
        }
    }

    /// Handle one inbound event
    pub async fn handle(&self, event: &InboundEvent) -> Reply {
        match event {
            InboundEvent::Text {
                user_id,
                chat_id,
                text,
            } => {
                debug!(user_id, "Handling text message");
                Reply {
                    target: RenderTarget::new_message(*chat_id),
                    surface: self.handle_text(*user_id, text).await,
                    alert: None,
                }
            }
            InboundEvent::Control {
                user_id,
                chat_id,
                message_id,
                payload,
                ..
            } => {
                let action = ControlAction::parse(payload);
                debug!(user_id, kind = ?action.kind(), "Handling control");
                let (surface, alert) = self.handle_action(*user_id, action).await;
                Reply {
                    target: RenderTarget::edit(*chat_id, *message_id),
                    surface,
                    alert,
                }
            }
        }
    }

    async fn handle_text(&self, user_id: i64, text: &str) -> Surface {
        let text = text.trim();
        if is_command(text, "start") || is_command(text, "menu") {
            return self.main_menu(user_id).await;
        }

        let state = self
            .sessions
            .get(user_id)
            .and_then(|token| SessionState::from_token(&token));

        match state {
            Some(SessionState::AwaitingSearchText) => self.search_results(text).await,
            None => Surface::new(UNRECOGNIZED_TEXT).button(BTN_BACK, ControlAction::MainMenu.payload()),
        }
    }

    async fn handle_action(&self, user_id: i64, action: ControlAction) -> (Surface, Option<String>) {
        match action {
            ControlAction::MainMenu => (self.main_menu(user_id).await, None),
            ControlAction::List { page } => (self.item_list(page).await, None),
            ControlAction::Favorites { page } => (self.favorites_list(user_id, page).await, None),
            ControlAction::PageJump {
                origin,
                total_pages,
            } => (page_jump(origin, total_pages), None),
            ControlAction::Card(ctx) => (self.card(user_id, &ctx).await, None),
            ControlAction::SearchPrompt => (self.search_prompt(user_id), None),
            ControlAction::SearchResults { query } => (self.search_results(&query).await, None),
            ControlAction::AddFavorite(ctx) => {
                let alert = match self.favorites.add(user_id, ctx.id).await {
                    Ok(_) => None,
                    Err(e) => {
                        error!(user_id, cocktail_id = %ctx.id, error = %e, "Failed to add favorite");
                        Some(FAILED_ALERT.to_string())
                    }
                };
                (self.card(user_id, &ctx).await, alert)
            }
            ControlAction::RemoveFavorite(ctx) => {
                let alert = match self.favorites.remove(user_id, ctx.id).await {
                    Ok(_) => None,
                    Err(e) => {
                        error!(user_id, cocktail_id = %ctx.id, error = %e, "Failed to remove favorite");
                        Some(FAILED_ALERT.to_string())
                    }
                };
                (self.card(user_id, &ctx).await, alert)
            }
            ControlAction::RegisterPrompt => (register_prompt(), None),
            ControlAction::RegisterConfirm => {
                let alert = match self.favorites.register(user_id).await {
                    Ok(_) => REGISTERED_ALERT,
                    Err(e) => {
                        error!(user_id, error = %e, "Failed to register user");
                        FAILED_ALERT
                    }
                };
                (self.main_menu(user_id).await, Some(alert.to_string()))
            }
            ControlAction::Profile => (self.profile(user_id).await, None),
            ControlAction::DeletePrompt => (delete_prompt(), None),
            ControlAction::DeleteConfirm => {
                let alert = match self.favorites.unregister(user_id).await {
                    Ok(_) => DELETED_ALERT,
                    Err(e) => {
                        error!(user_id, error = %e, "Failed to delete user");
                        FAILED_ALERT
                    }
                };
                (self.main_menu(user_id).await, Some(alert.to_string()))
            }
            ControlAction::Unknown(payload) => {
                warn!(user_id, payload = %payload, "Unknown control payload");
                (self.main_menu(user_id).await, None)
            }
        }
    }

    /// Registered user, or `None` when unregistered or the lookup failed
    async fn user(&self, user_id: i64) -> Option<User> {
        match self.favorites.find_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!(user_id, error = %e, "User lookup failed");
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Surfaces
    // ------------------------------------------------------------------------

    async fn main_menu(&self, user_id: i64) -> Surface {
        let account = if self.user(user_id).await.is_some() {
            Control::new(BTN_PROFILE, ControlAction::Profile.payload())
        } else {
            Control::new(BTN_REGISTER, ControlAction::RegisterPrompt.payload())
        };

        Surface::new(MAIN_MENU_TEXT)
            .button(BTN_LIST, ControlAction::List { page: 0 }.payload())
            .button(BTN_SEARCH, ControlAction::SearchPrompt.payload())
            .row(vec![account])
    }

    async fn item_list(&self, page: u64) -> Surface {
        let result = match self.catalog.fetch_page(page, self.settings.page_size).await {
            Ok(result) => result,
            Err(e) => {
                error!(page, error = %e, "Failed to fetch cocktail list");
                CocktailsPaged::empty()
            }
        };
        self.list_surface(LIST_TEXT, OriginPage::ItemList, page, &result)
    }

    async fn favorites_list(&self, user_id: i64, page: u64) -> Surface {
        let Some(user) = self.user(user_id).await else {
            return self.main_menu(user_id).await;
        };

        let result = if user.favorite_cocktails.is_empty() {
            CocktailsPaged::empty()
        } else {
            let filter = CocktailFilter {
                ids: user.favorite_cocktails,
                pagination: Pagination::new(page, self.settings.page_size),
                ..Default::default()
            };
            match self.catalog.fetch_by_filter(&filter).await {
                Ok(result) => result,
                Err(e) => {
                    error!(user_id, page, error = %e, "Failed to fetch favorites");
                    CocktailsPaged::empty()
                }
            }
        };
        self.list_surface(FAVORITES_TEXT, OriginPage::FavoritesList, page, &result)
    }

    fn list_surface(
        &self,
        title: &str,
        origin: OriginPage,
        page: u64,
        result: &CocktailsPaged,
    ) -> Surface {
        let text = if result.items.is_empty() {
            format!("{}\n\n{}", title, EMPTY_LIST_TEXT)
        } else {
            title.to_string()
        };

        let mut surface = Surface::new(text);
        for item in &result.items {
            let ctx = NavigationContext::new(item.id, origin, page.to_string());
            surface = surface.button(item.display_name(), ControlAction::Card(ctx).payload());
        }

        let controls = build_controls(
            page,
            self.settings.page_size,
            result.total_count,
            result.items.len() as u64,
        );
        let mut nav = Vec::new();
        if controls.show_prev {
            nav.push(Control::new(BTN_PREV, list_action(origin, page - 1).payload()));
        }
        nav.push(Control::new(
            controls.page_label.clone(),
            ControlAction::PageJump {
                origin,
                total_pages: controls.total_pages,
            }
            .payload(),
        ));
        if controls.show_next && page < MAX_PAGE_INDEX {
            nav.push(Control::new(BTN_NEXT, list_action(origin, page + 1).payload()));
        }

        let back = match origin {
            OriginPage::FavoritesList => ControlAction::Profile,
            _ => ControlAction::MainMenu,
        };
        surface.row(nav).button(BTN_BACK, back.payload())
    }

    async fn card(&self, user_id: i64, ctx: &NavigationContext) -> Surface {
        let back = ControlAction::back_to(ctx).payload();

        let cocktail = match self.catalog.fetch_by_id(ctx.id).await {
            Ok(Some(cocktail)) => cocktail,
            Ok(None) => {
                debug!(cocktail_id = %ctx.id, "Cocktail not found");
                return Surface::new(CARD_NOT_FOUND_TEXT).button(BTN_BACK, back);
            }
            Err(e) => {
                error!(cocktail_id = %ctx.id, error = %e, "Failed to fetch cocktail");
                return Surface::new(CARD_NOT_FOUND_TEXT).button(BTN_BACK, back);
            }
        };

        let mut surface = Surface::new(render::cocktail_card(&cocktail));
        if let Some(user) = self.user(user_id).await {
            surface = if user.has_favorite(&cocktail.id) {
                surface.button(
                    BTN_REMOVE_FAVORITE,
                    ControlAction::RemoveFavorite(ctx.clone()).payload(),
                )
            } else {
                surface.button(
                    BTN_ADD_FAVORITE,
                    ControlAction::AddFavorite(ctx.clone()).payload(),
                )
            };
        }
        surface.button(BTN_BACK, back)
    }

    fn search_prompt(&self, user_id: i64) -> Surface {
        self.sessions.set(
            user_id,
            SessionState::AwaitingSearchText.token(),
            self.settings.session_ttl,
        );
        Surface::new(SEARCH_PROMPT_TEXT).button(BTN_BACK, ControlAction::MainMenu.payload())
    }

    /// Name search, capped at `search_limit` results.
    ///
    /// The query is cut to what fits a navigation token before searching, so
    /// returning from a card repeats exactly the same search.
    async fn search_results(&self, query: &str) -> Surface {
        let query = truncate_token(query.trim()).trim_end();
        let filter = CocktailFilter::by_name(query, Pagination::new(0, self.settings.search_limit));

        let result = match self.catalog.fetch_by_filter(&filter).await {
            Ok(result) => result,
            Err(e) => {
                error!(query = %query, error = %e, "Search failed");
                CocktailsPaged::empty()
            }
        };

        let text = if result.items.is_empty() {
            format!("{}\n\n{}", SEARCH_RESULTS_TEXT, EMPTY_LIST_TEXT)
        } else if result.total_count > result.items.len() as u64 {
            format!(
                "{}\n\nПоказаны первые {} из {}.",
                SEARCH_RESULTS_TEXT,
                result.items.len(),
                result.total_count
            )
        } else {
            SEARCH_RESULTS_TEXT.to_string()
        };

        let mut surface = Surface::new(text);
        for item in &result.items {
            let ctx = NavigationContext::new(item.id, OriginPage::SearchResults, query);
            surface = surface.button(item.display_name(), ControlAction::Card(ctx).payload());
        }
        surface
            .button(BTN_SEARCH_AGAIN, ControlAction::SearchPrompt.payload())
            .button(BTN_BACK, ControlAction::MainMenu.payload())
    }

    async fn profile(&self, user_id: i64) -> Surface {
        if self.user(user_id).await.is_none() {
            return self.main_menu(user_id).await;
        }
        Surface::new(PROFILE_TEXT)
            .button(BTN_FAVORITES, ControlAction::Favorites { page: 0 }.payload())
            .button(BTN_DELETE_PROFILE, ControlAction::DeletePrompt.payload())
            .button(BTN_BACK, ControlAction::MainMenu.payload())
    }
}

fn list_action(origin: OriginPage, page: u64) -> ControlAction {
    match origin {
        OriginPage::FavoritesList => ControlAction::Favorites { page },
        _ => ControlAction::List { page },
    }
}

fn page_jump(origin: OriginPage, total_pages: u64) -> Surface {
    let mut surface = Surface::new(PAGES_TEXT);
    for row in jump_rows(total_pages) {
        surface = surface.row(
            row.into_iter()
                .map(|page| {
                    Control::new(page.saturating_add(1).to_string(), list_action(origin, page).payload())
                })
                .collect(),
        );
    }
    surface.button(BTN_BACK, list_action(origin, 0).payload())
}

fn register_prompt() -> Surface {
    Surface::new(render::escape_html(REGISTER_TEXT))
        .button(BTN_CONFIRM_REGISTER, ControlAction::RegisterConfirm.payload())
        .button(BTN_BACK, ControlAction::MainMenu.payload())
}

fn delete_prompt() -> Surface {
    Surface::new(render::escape_html(DELETE_TEXT))
        .button(BTN_CONFIRM_DELETE, ControlAction::DeleteConfirm.payload())
        .button(BTN_BACK, ControlAction::Profile.payload())
}

/// `/name`, optionally addressed as `/name@bot` or followed by arguments
fn is_command(text: &str, name: &str) -> bool {
    let Some(rest) = text.strip_prefix('/') else {
        return false;
    };
    let word = rest.split_whitespace().next().unwrap_or_default();
    let word = word.split('@').next().unwrap_or_default();
    word.eq_ignore_ascii_case(name)
}

// ============================================================================
// Tests
// ============================================================================
