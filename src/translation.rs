use crate::models::{ContentEntry, ContentTranslation, ContentView};

/// pick_translation
///
/// Selects exactly one translation row for a content entry. Pure and total:
/// no I/O, returns `None` rather than failing when an entry has zero
/// translations.
///
/// Fallback order (fixed, previously implicit in the original call sites):
/// 1. the row whose locale equals the requested locale;
/// 2. the row whose locale equals the configured default locale;
/// 3. the first available row.
pub fn pick_translation<'a>(
    translations: &'a [ContentTranslation],
    locale: &str,
    default_locale: &str,
) -> Option<&'a ContentTranslation> {
    translations
        .iter()
        .find(|t| t.locale == locale)
        .or_else(|| translations.iter().find(|t| t.locale == default_locale))
        .or_else(|| translations.first())
}

/// resolve_content
///
/// Flattens a content entry and its chosen translation into the view model
/// consumed by the rendering layer. Returns `None` for an entry with zero
/// translations; list call sites filter those out.
///
/// A translation row that arrived without its own id gets a synthesized key
/// `"{entry_id}-{locale}"` so the rendering layer always has a stable key.
pub fn resolve_content(
    entry: &ContentEntry,
    locale: &str,
    default_locale: &str,
) -> Option<ContentView> {
    let translation = pick_translation(&entry.translations, locale, default_locale)?;

    let view_id = translation
        .id
        .clone()
        .unwrap_or_else(|| format!("{}-{}", entry.id, translation.locale));

    Some(ContentView {
        id: view_id,
        content_id: entry.id.clone(),
        locale: translation.locale.clone(),
        title: translation.title.clone(),
        body: translation.body.clone(),
        status: entry.status,
        badge: entry.status.badge_style(),
        campus_id: entry.campus_id.clone(),
        published_at: entry.published_at,
        cover_image: entry.cover_image.clone(),
    })
}

/// resolve_content_list
///
/// Maps a list of entries to view models for the given locale, excluding
/// entries with no translations at all. Output length equals input length
/// minus the count of zero-translation entries.
pub fn resolve_content_list(
    entries: &[ContentEntry],
    locale: &str,
    default_locale: &str,
) -> Vec<ContentView> {
    entries
        .iter()
        .filter_map(|entry| resolve_content(entry, locale, default_locale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentStatus;

    fn translation(id: Option<&str>, locale: &str, title: &str) -> ContentTranslation {
        ContentTranslation {
            id: id.map(String::from),
            content_id: Some("c1".to_string()),
            locale: locale.to_string(),
            title: title.to_string(),
            body: format!("{title} body"),
        }
    }

    fn entry(id: &str, translations: Vec<ContentTranslation>) -> ContentEntry {
        ContentEntry {
            id: id.to_string(),
            status: ContentStatus::Published,
            translations,
            ..ContentEntry::default()
        }
    }

    #[test]
    fn exact_locale_match_wins() {
        let ts = vec![
            translation(Some("t-en"), "en", "Hello"),
            translation(Some("t-fi"), "fi", "Moi"),
        ];
        let picked = pick_translation(&ts, "fi", "en").unwrap();
        assert_eq!(picked.id.as_deref(), Some("t-fi"));
    }

    #[test]
    fn falls_back_to_default_locale() {
        let ts = vec![
            translation(Some("t-sv"), "sv", "Hej"),
            translation(Some("t-en"), "en", "Hello"),
        ];
        let picked = pick_translation(&ts, "de", "en").unwrap();
        assert_eq!(picked.locale, "en");
    }

    #[test]
    fn falls_back_to_first_available() {
        let ts = vec![translation(Some("t-sv"), "sv", "Hej")];
        // Neither the requested nor the default locale exists.
        let picked = pick_translation(&ts, "de", "en").unwrap();
        assert_eq!(picked.locale, "sv");
    }

    #[test]
    fn zero_translations_yield_none() {
        assert!(pick_translation(&[], "en", "en").is_none());
        let e = entry("c1", vec![]);
        assert!(resolve_content(&e, "en", "en").is_none());
    }

    #[test]
    fn view_uses_translation_row_id_when_present() {
        let e = entry("c1", vec![translation(Some("t-en"), "en", "Hello")]);
        let view = resolve_content(&e, "en", "en").unwrap();
        assert_eq!(view.id, "t-en");
        assert_eq!(view.content_id, "c1");
        assert_eq!(view.title, "Hello");
    }

    #[test]
    fn view_synthesizes_id_from_parent_and_locale() {
        let e = entry("c1", vec![translation(None, "en", "Hello")]);
        let view = resolve_content(&e, "en", "en").unwrap();
        assert_eq!(view.id, "c1-en");
    }

    #[test]
    fn badge_follows_status() {
        let mut e = entry("c1", vec![translation(Some("t"), "en", "Hello")]);
        e.status = ContentStatus::Draft;
        let view = resolve_content(&e, "en", "en").unwrap();
        assert_eq!(view.badge, ContentStatus::Draft.badge_style());
    }

    #[test]
    fn list_excludes_zero_translation_entries() {
        let entries = vec![
            entry("c1", vec![translation(Some("t1"), "en", "One")]),
            entry("c2", vec![]),
            entry("c3", vec![translation(Some("t3"), "fi", "Kolme")]),
        ];
        let views = resolve_content_list(&entries, "en", "en");
        // 3 entries, 1 without translations.
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.content_id != "c2"));
    }
}
