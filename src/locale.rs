use std::sync::OnceLock;

/// Known language subtag.
#[derive(Debug, Clone)]
pub struct LanguageName {
    /// ISO 639 code (e.g., "fr", "pt")
    pub code: &'static str,

    /// English name (e.g., "French", "Portuguese")
    pub name: &'static str,
}

pub struct LocaleRegistry {
    languages: Vec<LanguageName>,
    scripts: Vec<(&'static str, &'static str)>,
    regions: Vec<(&'static str, &'static str)>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global locale registry instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            languages: default_languages(),
            scripts: default_scripts(),
            regions: default_regions(),
        })
    }

    pub fn language(&self, code: &str) -> Option<&LanguageName> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    fn script(&self, code: &str) -> Option<&'static str> {
        lookup(&self.scripts, code)
    }

    fn region(&self, code: &str) -> Option<&'static str> {
        lookup(&self.regions, code)
    }

    /// English display name of a locale id such as `fr`, `fr_FR`, `pt-BR` or
    /// `zh_Hant_TW`.
    ///
    /// An unknown language yields the id unchanged; unknown script or region
    /// subtags are shown as written.
    pub fn display_name(&self, locale: &str) -> String {
        let locale = locale.trim();
        let mut subtags = locale.split(['_', '-']).filter(|s| !s.is_empty());

        let Some(language) = subtags.next().and_then(|code| self.language(code)) else {
            return locale.to_string();
        };

        let qualifiers: Vec<String> = subtags
            .map(|subtag| match subtag.len() {
                4 => self
                    .script(subtag)
                    .map(str::to_string)
                    .unwrap_or_else(|| subtag.to_string()),
                _ => self
                    .region(subtag)
                    .map(str::to_string)
                    .unwrap_or_else(|| subtag.to_ascii_uppercase()),
            })
            .collect();

        if qualifiers.is_empty() {
            language.name.to_string()
        } else {
            format!("{} ({})", language.name, qualifiers.join(", "))
        }
    }
}

fn lookup(table: &[(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

fn default_languages() -> Vec<LanguageName> {
    [
        ("ar", "Arabic"),
        ("bg", "Bulgarian"),
        ("bn", "Bangla"),
        ("ca", "Catalan"),
        ("cs", "Czech"),
        ("cy", "Welsh"),
        ("da", "Danish"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("es", "Spanish"),
        ("et", "Estonian"),
        ("eu", "Basque"),
        ("fa", "Persian"),
        ("fi", "Finnish"),
        ("fr", "French"),
        ("ga", "Irish"),
        ("gl", "Galician"),
        ("he", "Hebrew"),
        ("hi", "Hindi"),
        ("hr", "Croatian"),
        ("hu", "Hungarian"),
        ("id", "Indonesian"),
        ("is", "Icelandic"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("lt", "Lithuanian"),
        ("lv", "Latvian"),
        ("ms", "Malay"),
        ("mt", "Maltese"),
        ("nb", "Norwegian Bokmål"),
        ("nl", "Dutch"),
        ("nn", "Norwegian Nynorsk"),
        ("no", "Norwegian"),
        ("pl", "Polish"),
        ("pt", "Portuguese"),
        ("ro", "Romanian"),
        ("ru", "Russian"),
        ("sk", "Slovak"),
        ("sl", "Slovenian"),
        ("sr", "Serbian"),
        ("sv", "Swedish"),
        ("sw", "Swahili"),
        ("th", "Thai"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
        ("ur", "Urdu"),
        ("vi", "Vietnamese"),
        ("zh", "Chinese"),
    ]
    .into_iter()
    .map(|(code, name)| LanguageName { code, name })
    .collect()
}

fn default_scripts() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Arab", "Arabic"),
        ("Cyrl", "Cyrillic"),
        ("Hans", "Simplified"),
        ("Hant", "Traditional"),
        ("Latn", "Latin"),
    ]
}

fn default_regions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("AR", "Argentina"),
        ("AT", "Austria"),
        ("AU", "Australia"),
        ("BE", "Belgium"),
        ("BR", "Brazil"),
        ("CA", "Canada"),
        ("CH", "Switzerland"),
        ("CL", "Chile"),
        ("CN", "China"),
        ("CO", "Colombia"),
        ("CZ", "Czechia"),
        ("DE", "Germany"),
        ("DK", "Denmark"),
        ("ES", "Spain"),
        ("FI", "Finland"),
        ("FR", "France"),
        ("GB", "United Kingdom"),
        ("HK", "Hong Kong SAR China"),
        ("IE", "Ireland"),
        ("IN", "India"),
        ("IT", "Italy"),
        ("JP", "Japan"),
        ("KR", "South Korea"),
        ("LU", "Luxembourg"),
        ("MX", "Mexico"),
        ("NL", "Netherlands"),
        ("NO", "Norway"),
        ("NZ", "New Zealand"),
        ("PL", "Poland"),
        ("PT", "Portugal"),
        ("SE", "Sweden"),
        ("TW", "Taiwan"),
        ("US", "United States"),
        ("ZA", "South Africa"),
        ("419", "Latin America"),
    ]
}
