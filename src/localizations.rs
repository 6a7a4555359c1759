use std::collections::HashMap;

const FALLBACK_LANG: &str = "en-US";

// Simple in-memory translations
#[derive(Clone, Default)]
pub struct Translations {
    strings: HashMap<&'static str, &'static str>,
}

impl Translations {
    fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            strings: pairs.iter().copied().collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.strings.get(key).copied()
    }
}

#[derive(Clone)]
pub struct Localizations {
    translations: HashMap<&'static str, Translations>,
    current_lang: &'static str,
}

impl Default for Localizations {
    fn default() -> Self {
        Self::with_language(FALLBACK_LANG)
    }
}

impl Localizations {
    /// Picks the language from a POSIX locale string such as `pl_PL.UTF-8`.
    pub fn from_locale(locale: Option<&str>) -> Self {
        let lang = match locale.map(|l| l.to_lowercase()) {
            Some(l) if l.starts_with("pl") => "pl-PL",
            _ => FALLBACK_LANG,
        };
        Self::with_language(lang)
    }

    pub fn with_language(lang: &str) -> Self {
        let mut translations = HashMap::new();

        translations.insert(
            "en-US",
            Translations::from_pairs(&[
                ("app-title", "Media Downloader"),
                ("url-group", "Video address"),
                ("url-placeholder", "Paste the video URL"),
                ("destination-group", "Destination directory"),
                ("browse-button", "Browse..."),
                ("choose-directory", "Choose destination directory"),
                ("format-group", "Format and quality"),
                ("format-label", "Format:"),
                ("quality-label", "Quality:"),
                ("format-audio", "Audio (MP3)"),
                ("format-video", "Video (MP4)"),
                ("download-button", "Download"),
                ("progress-group", "Download progress"),
                ("log-group", "Log"),
                ("status-ready", "Ready."),
                ("selected-directory", "Selected directory:"),
                ("progress-line", "Progress:"),
                ("error-prefix", "Error:"),
                ("error-no-url", "Error: Please enter a video URL"),
                ("error-invalid-dir", "Error: Please choose a valid destination directory"),
                ("download-success", "Download completed successfully!"),
                ("worker-connecting", "Connecting to:"),
                ("worker-preparing", "Preparing download:"),
                ("worker-found", "Found video:"),
                ("worker-processing", "Transfer finished, processing..."),
                ("worker-saved", "File saved as:"),
            ]),
        );

        translations.insert(
            "pl-PL",
            Translations::from_pairs(&[
                ("app-title", "Pobieracz multimediów"),
                ("url-group", "Adres filmu"),
                ("url-placeholder", "Wklej adres URL filmu"),
                ("destination-group", "Katalog docelowy"),
                ("browse-button", "Przeglądaj..."),
                ("choose-directory", "Wybierz katalog docelowy"),
                ("format-group", "Format i jakość"),
                ("format-label", "Format:"),
                ("quality-label", "Jakość:"),
                ("download-button", "Pobierz"),
                ("progress-group", "Postęp pobierania"),
                ("status-ready", "Aplikacja gotowa do użycia."),
                ("selected-directory", "Wybrano katalog:"),
                ("progress-line", "Postęp:"),
                ("error-prefix", "Błąd:"),
                ("error-no-url", "Błąd: Podaj adres URL filmu"),
                ("error-invalid-dir", "Błąd: Wybierz prawidłowy katalog docelowy"),
                ("download-success", "Pobieranie zakończone pomyślnie!"),
                ("format-audio", "Audio (MP3)"),
                ("format-video", "Wideo (MP4)"),
                ("worker-connecting", "Łączenie z:"),
                ("worker-preparing", "Przygotowanie do pobrania:"),
                ("worker-found", "Znaleziono film:"),
                ("worker-processing", "Pobieranie zakończone, trwa przetwarzanie..."),
                ("worker-saved", "Plik został pobrany jako:"),
            ]),
        );

        let current_lang = translations
            .keys()
            .copied()
            .find(|key| *key == lang)
            .unwrap_or(FALLBACK_LANG);

        Self {
            translations,
            current_lang,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.translations
            .get(self.current_lang)
            .and_then(|t| t.lookup(key))
            .or_else(|| {
                // Fallback to English if the current language doesn't have the key
                self.translations
                    .get(FALLBACK_LANG)
                    .and_then(|t| t.lookup(key))
            })
    }

    /// Like [`lookup`](Self::lookup) but shows the key itself when nothing matches.
    pub fn text(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    pub fn language(&self) -> &'static str {
        self.current_lang
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_selection() {
        assert_eq!(Localizations::from_locale(Some("pl_PL.UTF-8")).language(), "pl-PL");
        assert_eq!(Localizations::from_locale(Some("de_DE.UTF-8")).language(), "en-US");
        assert_eq!(Localizations::from_locale(None).language(), "en-US");
    }

    #[test]
    fn test_falls_back_to_english() {
        let pl = Localizations::with_language("pl-PL");
        assert_eq!(pl.text("download-button"), "Pobierz");
        assert_eq!(pl.text("log-group"), "Log");
        assert_eq!(pl.text("no-such-key"), "no-such-key");
    }
}
