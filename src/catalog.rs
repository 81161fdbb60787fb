//! Static product catalog and payment methods.
//!
//! The catalog is compiled in; a product key travels through callback data
//! (`product_<key>`) and is stored verbatim in `orders.product`.

use chrono::NaiveDate;
use fluent_templates::fluent_bundle::FluentArgs;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::i18n::{self, Locale};

/// Catalog key of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display)]
pub enum ProductId {
    #[strum(serialize = "premium")]
    #[serde(rename = "premium")]
    Premium,
    #[strum(serialize = "2024-2025")]
    #[serde(rename = "2024-2025")]
    Recent,
    #[strum(serialize = "russian")]
    #[serde(rename = "russian")]
    Russian,
    #[strum(serialize = "philippines")]
    #[serde(rename = "philippines")]
    Philippines,
    #[strum(serialize = "eastern-europe")]
    #[serde(rename = "eastern-europe")]
    EasternEurope,
    #[strum(serialize = "archive")]
    #[serde(rename = "archive")]
    Archive,
    #[strum(serialize = "package")]
    #[serde(rename = "package")]
    Package,
    #[strum(serialize = "brazil-2026")]
    #[serde(rename = "brazil-2026")]
    Brazil2026,
    #[strum(serialize = "channel-2026")]
    #[serde(rename = "channel-2026")]
    Channel2026,
}

/// Static product descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name_pt: &'static str,
    pub name_en: &'static str,
    pub price_pt: &'static str,
    pub price_en: &'static str,
    /// Full price before the pre-sale discount, if any
    pub list_price_pt: Option<&'static str>,
    pub list_price_en: Option<&'static str>,
    /// Access is granted only on the release date (pre-sale cohort)
    pub deferred_release: bool,
}

impl CatalogEntry {
    pub fn name(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Pt => self.name_pt,
            Locale::En => self.name_en,
        }
    }

    pub fn price(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Pt => self.price_pt,
            Locale::En => self.price_en,
        }
    }

    fn list_price(&self, locale: Locale) -> Option<&'static str> {
        match locale {
            Locale::Pt => self.list_price_pt,
            Locale::En => self.list_price_en,
        }
    }

    /// One menu line, e.g. `🌎 Channel 2026 — $55 (🔥 now $30)`.
    fn menu_line(&self, locale: Locale) -> String {
        let icon = match self.id {
            ProductId::Premium => "💎",
            ProductId::Recent => "🌟",
            ProductId::Russian | ProductId::EasternEurope => "🌍",
            ProductId::Philippines => "🌏",
            ProductId::Archive => "⏳",
            ProductId::Package => "🤖",
            ProductId::Brazil2026 => "🇧🇷",
            ProductId::Channel2026 => "🌎",
        };
        match self.list_price(locale) {
            Some(list) => {
                let mut args = FluentArgs::new();
                args.set("price", self.price(locale));
                let now = i18n::t_args(locale, "menu-discount", &args);
                format!("{} {} — {} ({})", icon, self.name(locale), list, now)
            }
            None => format!("{} {} — {}", icon, self.name(locale), self.price(locale)),
        }
    }
}

static CATALOG: [CatalogEntry; 9] = [
    CatalogEntry {
        id: ProductId::Premium,
        name_pt: "Premium",
        name_en: "Premium",
        price_pt: "R$120",
        price_en: "$50",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Recent,
        name_pt: "2024/2025",
        name_en: "2024/2025",
        price_pt: "R$60",
        price_en: "$45",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Russian,
        name_pt: "Russas",
        name_en: "Russian",
        price_pt: "R$45",
        price_en: "$35",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Philippines,
        name_pt: "Filipinas",
        name_en: "Philippines",
        price_pt: "R$40",
        price_en: "$30",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::EasternEurope,
        name_pt: "Eastern Europe",
        name_en: "Eastern Europe",
        price_pt: "R$45",
        price_en: "$35",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Archive,
        name_pt: "Acervo 2019–2021",
        name_en: "Old Content",
        price_pt: "R$50",
        price_en: "$25",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Package,
        name_pt: "Pacote 2022–2025",
        name_en: "Package",
        price_pt: "R$150",
        price_en: "$60",
        list_price_pt: None,
        list_price_en: None,
        deferred_release: false,
    },
    CatalogEntry {
        id: ProductId::Brazil2026,
        name_pt: "Brasil 2026",
        name_en: "Brazil 2026",
        price_pt: "R$40",
        price_en: "$30",
        list_price_pt: Some("R$85"),
        list_price_en: Some("$55"),
        deferred_release: true,
    },
    CatalogEntry {
        id: ProductId::Channel2026,
        name_pt: "Canal 2026",
        name_en: "Channel 2026",
        price_pt: "R$30",
        price_en: "$30",
        list_price_pt: Some("R$75"),
        list_price_en: Some("$55"),
        deferred_release: true,
    },
];

/// Button layout of the product picker, two per row.
pub static PRODUCT_ROWS: &[&[ProductId]] = &[
    &[ProductId::Premium, ProductId::Recent],
    &[ProductId::Russian, ProductId::Philippines],
    &[ProductId::EasternEurope, ProductId::Archive],
    &[ProductId::Package],
    &[ProductId::Brazil2026, ProductId::Channel2026],
];

/// All catalog entries in menu order.
pub fn entries() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Looks up the descriptor of `id`. Every `ProductId` has exactly one entry.
pub fn entry(id: ProductId) -> &'static CatalogEntry {
    CATALOG
        .iter()
        .find(|e| e.id == id)
        .unwrap_or(&CATALOG[0])
}

/// Builds the catalog message shown after the buyer picks a language.
pub fn menu_text(locale: Locale, release_date: NaiveDate) -> String {
    let mut text = i18n::t(locale, "menu-header");
    text.push_str("\n\n");

    for e in entries().iter().filter(|e| !e.deferred_release) {
        text.push_str(&e.menu_line(locale));
        text.push('\n');
    }

    text.push('\n');
    text.push_str(&i18n::t(locale, "menu-presale-header"));
    text.push('\n');
    for e in entries().iter().filter(|e| e.deferred_release) {
        text.push_str(&e.menu_line(locale));
        text.push('\n');
    }

    let mut args = FluentArgs::new();
    args.set("date", format_release_date(locale, release_date));
    text.push('\n');
    text.push_str(&i18n::t_args(locale, "menu-presale-note", &args));
    text
}

/// `02/01/2026` for Portuguese, `Jan 2, 2026` for English.
pub fn format_release_date(locale: Locale, date: NaiveDate) -> String {
    match locale {
        Locale::Pt => date.format("%d/%m/%Y").to_string(),
        Locale::En => date.format("%b %-d, %Y").to_string(),
    }
}

/// Payment rails offered to buyers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Wise,
    Skrill,
    Binance,
    Btc,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Pix,
        PaymentMethod::Wise,
        PaymentMethod::Skrill,
        PaymentMethod::Binance,
        PaymentMethod::Btc,
    ];

    /// Methods offered for a locale: Pix for Portuguese, international rails for English.
    pub fn for_locale(locale: Locale) -> &'static [PaymentMethod] {
        match locale {
            Locale::Pt => &[PaymentMethod::Pix],
            Locale::En => &[
                PaymentMethod::Wise,
                PaymentMethod::Skrill,
                PaymentMethod::Binance,
                PaymentMethod::Btc,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "💳 Pix",
            PaymentMethod::Wise => "Wise",
            PaymentMethod::Skrill => "Skrill",
            PaymentMethod::Binance => "Binance",
            PaymentMethod::Btc => "Bitcoin",
        }
    }
}
