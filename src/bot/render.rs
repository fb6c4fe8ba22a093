//! Cocktail card text
//!
//! Telegram HTML parse mode: only `&`, `<` and `>` need escaping in text.

use std::fmt::Write;

use crate::domain::{Cocktail, CocktailItem};

/// Telegram's ceiling for one message text, in characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

const HISTORY_HEADER: &str = "\n<b>История коктейля:</b>\n";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Hashtag form of a tag name
pub fn hashtag(name: &str) -> String {
    format!("#{}", name.trim().replace(' ', "_"))
}

fn push_items(out: &mut String, items: &[CocktailItem]) {
    for item in items {
        let _ = writeln!(
            out,
            "👉 {} {}{}",
            escape_html(&item.name),
            item.count,
            escape_html(&item.unit)
        );
    }
}

/// Escaped `text` within `budget` characters, cut before an entity would be
/// split and marked with an ellipsis
fn escape_bounded(text: &str, budget: usize) -> String {
    let escaped = escape_html(text);
    if escaped.chars().count() <= budget {
        return escaped;
    }
    if budget == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let piece = escape_html(ch.encode_utf8(&mut [0; 4]));
        let len = piece.chars().count();
        if used + len + 1 > budget {
            break;
        }
        out.push_str(&piece);
        used += len;
    }
    out.push('…');
    out
}

/// Cut `text` to [`MAX_MESSAGE_CHARS`], on a line boundary when there is one
fn fit_message(text: &str) -> String {
    let Some((cut, _)) = text.char_indices().nth(MAX_MESSAGE_CHARS) else {
        return text.to_string();
    };
    let head = &text[..cut];
    match head.rfind('\n') {
        Some(line_end) => head[..line_end].trim_end().to_string(),
        None => head.to_string(),
    }
}

/// Full card: names, composition, tools, numbered recipe, history, tags.
///
/// The history is shortened first when the card would exceed
/// [`MAX_MESSAGE_CHARS`]; whole trailing lines are dropped after that.
pub fn cocktail_card(cocktail: &Cocktail) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "🍸<b>Коктейль:</b> {}",
        escape_html(cocktail.display_name())
    );
    let _ = writeln!(out, "<b>Английское название:</b> {}", escape_html(&cocktail.name));

    out.push_str("\n<b>Ингредиенты:</b>\n");
    push_items(&mut out, &cocktail.composition_elements);

    out.push_str("\n<b>Требуемые инструменты:</b>\n");
    push_items(&mut out, &cocktail.tools);

    out.push_str("\n<b>Способ приготовления:</b>\n");
    for (i, step) in cocktail.recipe.steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, escape_html(step));
    }

    let mut tags = String::new();
    if !cocktail.tags.is_empty() {
        tags.push_str("\n<b>Теги:</b>\n");
        let names: Vec<String> = cocktail
            .tags
            .iter()
            .map(|t| escape_html(&hashtag(&t.name)))
            .collect();
        tags.push_str(&names.join(" "));
    }

    let history = cocktail.history.trim();
    if !history.is_empty() {
        let fixed = out.chars().count() + HISTORY_HEADER.chars().count() + 1 + tags.chars().count();
        out.push_str(HISTORY_HEADER);
        out.push_str(&escape_bounded(history, MAX_MESSAGE_CHARS.saturating_sub(fixed)));
        out.push('\n');
    }
    out.push_str(&tags);

    fit_message(out.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Recipe, Tag};

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("Gin & <Tonic>"), "Gin &amp; &lt;Tonic&gt;");
        assert_eq!(escape_html("Негрони"), "Негрони");
    }

    #[test]
    fn test_hashtag_replaces_spaces() {
        assert_eq!(hashtag("на основе джина"), "#на_основе_джина");
    }

    #[test]
    fn test_card_sections() {
        let cocktail = Cocktail {
            name: "Negroni".into(),
            russian_name: "Негрони".into(),
            history: "Граф Негрони <1919>".into(),
            tags: vec![
                Tag { name: "крепкие".into() },
                Tag { name: "на основе джина".into() },
            ],
            composition_elements: vec![CocktailItem {
                name: "Джин".into(),
                count: 30,
                unit: "мл".into(),
            }],
            tools: vec![CocktailItem {
                name: "Стакан олд фэшн".into(),
                count: 1,
                unit: "шт".into(),
            }],
            recipe: Recipe {
                steps: vec!["Наполни стакан льдом".into(), "Влей джин".into()],
            },
            ..Default::default()
        };

        let card = cocktail_card(&cocktail);
        assert!(card.starts_with("🍸<b>Коктейль:</b> Негрони\n"));
        assert!(card.contains("<b>Английское название:</b> Negroni"));
        assert!(card.contains("👉 Джин 30мл"));
        assert!(card.contains("👉 Стакан олд фэшн 1шт"));
        assert!(card.contains("1. Наполни стакан льдом\n2. Влей джин"));
        assert!(card.contains("Граф Негрони &lt;1919&gt;"));
        assert!(card.ends_with("#крепкие #на_основе_джина"));
    }

    #[test]
    fn test_long_history_is_shortened_to_fit() {
        let cocktail = Cocktail {
            name: "Sazerac".into(),
            history: "x".repeat(10_000),
            tags: vec![Tag { name: "классика".into() }],
            ..Default::default()
        };
        let card = cocktail_card(&cocktail);
        assert!(card.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(card.starts_with("🍸<b>Коктейль:</b> Sazerac"));
        assert!(card.contains("x…"));
        assert!(card.ends_with("#классика"));
    }

    #[test]
    fn test_shortened_history_keeps_entities_whole() {
        let cocktail = Cocktail {
            name: "B&B".into(),
            history: "&".repeat(5_000),
            ..Default::default()
        };
        let card = cocktail_card(&cocktail);
        assert!(card.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(!card.replace("&amp;", "").contains('&'));
    }

    #[test]
    fn test_long_recipe_drops_whole_lines() {
        let step = "y".repeat(100);
        let cocktail = Cocktail {
            name: "Long Island".into(),
            recipe: Recipe {
                steps: vec![step.clone(); 100],
            },
            ..Default::default()
        };
        let card = cocktail_card(&cocktail);
        assert!(card.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(card.contains("1. "));
        assert!(card.lines().last().unwrap().ends_with(&step));
    }

    #[test]
    fn test_card_falls_back_to_primary_name() {
        let card = cocktail_card(&Cocktail {
            name: "Paloma".into(),
            ..Default::default()
        });
        assert!(card.starts_with("🍸<b>Коктейль:</b> Paloma"));
        assert!(!card.contains("Теги"));
    }
}
