use thiserror::Error;

use crate::core::error::AppError;
use crate::orders::model::{OrderId, OrderStatus};

/// Outcomes of lifecycle and arbitration operations that did not apply.
///
/// None of these are fatal; the Telegram layer decides per variant whether
/// the operator sees a message (`NotFound`, `InvalidTransition`, `Validation`)
/// or the event is dropped (`Unauthorized`, `StaleSession`).
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("order #{0} not found")]
    NotFound(OrderId),

    #[error("buyer {0} has no order")]
    NoOrderForBuyer(i64),

    /// The acting user is not the operator
    #[error("not authorized")]
    Unauthorized,

    /// No session marker backs this input (no awaiting proof, nothing armed)
    #[error("no pending session marker")]
    StaleSession,

    #[error("order #{order_id} is {from}, cannot move to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<rusqlite::Error> for OrderError {
    fn from(err: rusqlite::Error) -> Self {
        OrderError::Store(AppError::Database(err))
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
