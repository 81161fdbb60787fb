//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{sender_id, HandlerDeps, HandlerError};
use crate::messaging::Evidence;
use crate::storefront::{Callback, ProofOutcome};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Order matters: commands first, then attachments (payment proofs), then
/// operator free text, then inline-button callbacks.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_proofs = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(proof_handler(deps_proofs))
        .branch(operator_text_handler(deps_text))
        .branch(callback_handler(deps_callback))
}

/// Handler for bot commands (/start and the operator commands)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let user_id = sender_id(msg.from.as_ref());
                log::info!("Received command: {:?} from user {}", cmd, user_id);

                let result = match cmd {
                    Command::Start => deps.storefront.start(user_id).await,
                    Command::Orders(args) => deps.desk.list_orders(user_id, &args).await,
                    Command::Order(args) => deps.desk.show_order(user_id, &args).await,
                    Command::Cancel => {
                        if deps.desk.is_operator(user_id) {
                            deps.desk.cancel_link(user_id).await
                        } else {
                            Ok(())
                        }
                    }
                    Command::ReleaseCheck => deps.desk.release_check(user_id).await,
                };

                if let Err(e) = result {
                    log::error!("Command handler failed for user {}: {}", user_id, e);
                }
                Ok(())
            }
        },
    ))
}

/// Handler for photos and documents sent as payment proof
fn proof_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.photo().is_some() || msg.document().is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let buyer_id = sender_id(msg.from.as_ref());
                let evidence = Evidence {
                    chat_id: msg.chat.id.0,
                    message_id: msg.id.0,
                };

                match deps.storefront.submit_proof(buyer_id, evidence).await {
                    Ok(ProofOutcome::Accepted(order)) => {
                        log::info!("Proof received for order #{} from buyer {}", order.id, buyer_id);
                    }
                    Ok(ProofOutcome::Ignored) | Ok(ProofOutcome::Rejected) => {}
                    Err(e) => log::error!("Failed to process proof from buyer {}: {}", buyer_id, e),
                }
                Ok(())
            }
        })
}

/// Handler for plain text: the operator's access link for the armed order
fn operator_text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = sender_id(msg.from.as_ref());
                if !deps.desk.is_operator(user_id) {
                    return Ok(());
                }

                let text = msg.text().unwrap_or_default();
                match deps.desk.handle_text(user_id, text).await {
                    Ok(true) => {}
                    Ok(false) => log::debug!("Operator text ignored: no order armed for link entry"),
                    Err(e) => log::error!("Failed to deliver operator link: {}", e),
                }
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            // Stop the client-side spinner before doing any work
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let user_id = sender_id(Some(&q.from));
            let Some(callback) = q.data.as_deref().and_then(Callback::parse) else {
                log::debug!("Unknown callback data from {}: {:?}", user_id, q.data);
                return Ok(());
            };

            let result = match callback {
                Callback::Language(locale) => deps.storefront.choose_language(user_id, locale).await,
                Callback::Product(product) => deps.storefront.choose_product(user_id, product).await,
                Callback::Payment(method) => deps
                    .storefront
                    .choose_payment(user_id, q.from.username.clone(), method)
                    .await
                    .map(|_| ()),
                Callback::Admin(action, order_id) => deps.desk.handle_action(user_id, action, order_id).await,
            };

            if let Err(e) = result {
                log::error!("Callback {:?} from {} failed: {}", callback, user_id, e);
            }
            Ok(())
        }
    })
}
