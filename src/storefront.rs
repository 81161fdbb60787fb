//! Buyer conversation: language → product → payment method → proof.
//!
//! Drives the [`SessionStore`] and [`LifecycleEngine`] from transport-neutral
//! events and answers through [`Messenger`], so the whole flow runs the same
//! under Telegram and under the test recorder.

use chrono::NaiveDate;
use fluent_templates::fluent_bundle::FluentArgs;
use std::sync::Arc;

use crate::catalog::{self, PaymentMethod, ProductId, PRODUCT_ROWS};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::i18n::{self, Locale};
use crate::messaging::{Button, Evidence, Keyboard, Messenger};
use crate::orders::{AdminAction, LifecycleEngine, NewOrder, Order, OrderError, OrderId, OrderStatus};
use crate::session::SessionStore;

/// Inline-button payloads understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Language(Locale),
    Product(ProductId),
    Payment(PaymentMethod),
    Admin(AdminAction, OrderId),
}

impl Callback {
    pub fn parse(data: &str) -> Option<Callback> {
        if let Some(code) = data.strip_prefix("lang_") {
            return code.parse().ok().map(Callback::Language);
        }
        if let Some(key) = data.strip_prefix("product_") {
            return key.parse().ok().map(Callback::Product);
        }
        if let Some(method) = data.strip_prefix("pay_") {
            return method.parse().ok().map(Callback::Payment);
        }
        AdminAction::parse_callback(data).map(|(action, id)| Callback::Admin(action, id))
    }

    pub fn data(&self) -> String {
        match self {
            Callback::Language(locale) => format!("lang_{}", locale.as_ref()),
            Callback::Product(product) => format!("product_{}", product.as_ref()),
            Callback::Payment(method) => format!("pay_{}", method.as_ref()),
            Callback::Admin(action, id) => action.callback_data(*id),
        }
    }
}

/// What happened to an inbound photo/document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    /// No awaiting-proof marker and no pending order: not a proof, nothing done
    Ignored,
    Accepted(Order),
    /// Marker was set but the latest order cannot take a proof
    Rejected,
}

pub struct Storefront {
    sessions: Arc<SessionStore>,
    engine: Arc<LifecycleEngine>,
    messenger: Arc<dyn Messenger>,
    release_date: NaiveDate,
    support_url: Option<String>,
}

impl Storefront {
    pub fn new(
        sessions: Arc<SessionStore>,
        engine: Arc<LifecycleEngine>,
        messenger: Arc<dyn Messenger>,
        release_date: NaiveDate,
    ) -> Self {
        Self {
            sessions,
            engine,
            messenger,
            release_date,
            support_url: None,
        }
    }

    /// Adds a support link button next to the Pix option.
    pub fn with_support_url(mut self, url: Option<String>) -> Self {
        self.support_url = url;
        self
    }

    /// `/start`: forget the session and ask for a language.
    pub async fn start(&self, buyer_id: i64) -> AppResult<()> {
        self.sessions.reset_buyer(buyer_id).await;

        let keyboard = Keyboard::new(
            Locale::ALL
                .iter()
                .map(|locale| vec![Button::callback(locale.label(), Callback::Language(*locale).data())])
                .collect(),
        );
        self.messenger
            .send_text(buyer_id, &i18n::t(Locale::default(), "start-choose-language"), Some(&keyboard))
            .await
    }

    pub async fn choose_language(&self, buyer_id: i64, locale: Locale) -> AppResult<()> {
        self.sessions
            .update_buyer(buyer_id, |s| {
                s.locale = Some(locale);
                s.product = None;
            })
            .await;

        let keyboard = Keyboard::new(
            PRODUCT_ROWS
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|id| Button::callback(catalog::entry(*id).name(locale), Callback::Product(*id).data()))
                        .collect()
                })
                .collect(),
        );
        let text = catalog::menu_text(locale, self.release_date);
        self.messenger.send_text(buyer_id, &text, Some(&keyboard)).await
    }

    pub async fn choose_product(&self, buyer_id: i64, product: ProductId) -> AppResult<()> {
        let session = self.sessions.update_buyer(buyer_id, |s| s.product = Some(product)).await;
        let locale = session.locale.unwrap_or_default();
        let entry = catalog::entry(product);

        let mut args = FluentArgs::new();
        args.set("product", format!("{} ({})", entry.name(locale), entry.price(locale)));
        let mut text = i18n::t_args(locale, "product-selected", &args);
        if entry.deferred_release {
            let mut args = FluentArgs::new();
            args.set("date", catalog::format_release_date(locale, self.release_date));
            text.push_str("\n\n");
            text.push_str(&i18n::t_args(locale, "product-selected-presale", &args));
        }

        let mut rows: Vec<Vec<Button>> = PaymentMethod::for_locale(locale)
            .iter()
            .map(|m| vec![Button::callback(m.label(), Callback::Payment(*m).data())])
            .collect();
        if locale == Locale::Pt {
            if let Some(url) = &self.support_url {
                rows.push(vec![Button::url(i18n::t(locale, "payment-support-button"), url.clone())]);
            }
        }

        self.messenger.send_text(buyer_id, &text, Some(&Keyboard::new(rows))).await
    }

    /// Creates the order and arms the awaiting-proof marker.
    ///
    /// Returns `None` when the session no longer knows the product.
    pub async fn choose_payment(
        &self,
        buyer_id: i64,
        buyer_handle: Option<String>,
        method: PaymentMethod,
    ) -> AppResult<Option<Order>> {
        let session = self.sessions.buyer(buyer_id).await;
        let locale = session.locale.unwrap_or_default();

        let Some(product) = session.product else {
            self.messenger
                .send_text(buyer_id, &i18n::t(locale, "payment-session-expired"), None)
                .await?;
            return Ok(None);
        };

        let order = match self.engine.create(NewOrder {
            buyer_id,
            buyer_handle,
            language: locale,
            product,
            payment_method: Some(method),
        }) {
            Ok(order) => order,
            Err(OrderError::Store(e)) => return Err(e),
            Err(e) => return Err(AppError::Validation(e.to_string())),
        };
        self.sessions.update_buyer(buyer_id, |s| s.awaiting_proof = true).await;

        let destination =
            config::payment::destination(method).unwrap_or_else(|| i18n::t(locale, "payment-destination-missing"));
        let mut args = FluentArgs::new();
        args.set("method", method.as_ref().to_uppercase());
        args.set("destination", destination);
        self.messenger
            .send_text(buyer_id, &i18n::t_args(locale, "payment-instructions", &args), None)
            .await?;

        Ok(Some(order))
    }

    /// Treats a photo/document as proof if the buyer's session awaits one.
    ///
    /// Sessions do not survive restarts or idle expiry, so without the marker
    /// the buyer's latest order decides: a `pending` one still takes the proof.
    pub async fn submit_proof(&self, buyer_id: i64, evidence: Evidence) -> AppResult<ProofOutcome> {
        let session = self.sessions.buyer(buyer_id).await;
        if !session.awaiting_proof && !self.has_pending_order(buyer_id)? {
            log::debug!("Ignoring attachment from {}: no proof expected", buyer_id);
            return Ok(ProofOutcome::Ignored);
        }

        match self.engine.attach_proof(buyer_id, evidence).await {
            Ok(order) => {
                self.sessions.update_buyer(buyer_id, |s| s.awaiting_proof = false).await;
                self.messenger
                    .send_text(buyer_id, &i18n::t(order.language, "proof-received"), None)
                    .await?;
                Ok(ProofOutcome::Accepted(order))
            }
            Err(OrderError::Store(e)) => Err(e),
            Err(e) => {
                log::info!("Proof from {} not applicable: {}", buyer_id, e);
                self.sessions.update_buyer(buyer_id, |s| s.awaiting_proof = false).await;
                let locale = session.locale.unwrap_or_default();
                self.messenger
                    .send_text(buyer_id, &i18n::t(locale, "proof-not-expected"), None)
                    .await?;
                Ok(ProofOutcome::Rejected)
            }
        }
    }

    fn has_pending_order(&self, buyer_id: i64) -> AppResult<bool> {
        match self.engine.latest_order(buyer_id) {
            Ok(latest) => {
                let pending = latest.is_some_and(|o| o.status == OrderStatus::Pending);
                if pending {
                    log::info!("No proof marker for {}, latest order is pending", buyer_id);
                }
                Ok(pending)
            }
            Err(OrderError::Store(e)) => Err(e),
            Err(e) => Err(AppError::Validation(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_buyer_callbacks() {
        assert_eq!(Callback::parse("lang_en"), Some(Callback::Language(Locale::En)));
        assert_eq!(
            Callback::parse("product_channel-2026"),
            Some(Callback::Product(ProductId::Channel2026))
        );
        assert_eq!(Callback::parse("pay_pix"), Some(Callback::Payment(PaymentMethod::Pix)));
    }

    #[test]
    fn parses_admin_callbacks() {
        assert_eq!(
            Callback::parse("admin_reject_12"),
            Some(Callback::Admin(AdminAction::Reject, OrderId(12)))
        );
    }

    #[test]
    fn unknown_payloads_are_none() {
        assert_eq!(Callback::parse("lang_es"), None);
        assert_eq!(Callback::parse("product_Canal 2026"), None);
        assert_eq!(Callback::parse("pay_paypal"), None);
        assert_eq!(Callback::parse(""), None);
    }

    #[test]
    fn data_round_trips() {
        for cb in [
            Callback::Language(Locale::Pt),
            Callback::Product(ProductId::Recent),
            Callback::Payment(PaymentMethod::Btc),
            Callback::Admin(AdminAction::Link, OrderId(5)),
        ] {
            assert_eq!(Callback::parse(&cb.data()), Some(cb));
        }
    }
}
