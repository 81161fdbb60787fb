use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "pt-BR",
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// The two locales buyers can pick from.
///
/// Stored in the `orders.language` column as `pt` / `en`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    Pt,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Pt, Locale::En];

    /// Fluent language identifier backing this locale.
    pub fn lang_id(self) -> &'static LanguageIdentifier {
        match self {
            Locale::Pt => &PT_BR,
            Locale::En => &EN_US,
        }
    }

    /// Button label used on the language picker.
    pub fn label(self) -> &'static str {
        match self {
            Locale::Pt => "🇧🇷 Português",
            Locale::En => "🇺🇸 English",
        }
    }
}

static PT_BR: Lazy<LanguageIdentifier> = Lazy::new(|| "pt-BR".parse().unwrap_or_default());
static EN_US: Lazy<LanguageIdentifier> = Lazy::new(|| "en-US".parse().unwrap_or_default());

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(locale: Locale, key: &str) -> String {
    let text = LOCALES
        .lookup(locale.lang_id(), key)
        .unwrap_or_else(|| LOCALES.lookup(&PT_BR, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(locale: Locale, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(locale.lang_id(), key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&PT_BR, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}
