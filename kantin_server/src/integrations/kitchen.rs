//! Event hooks that tell the kitchen what to do.
//!
//! Vendors only start cooking once an order is paid, and stop if its payment falls through. For now the feed is the
//! server log, under the `kantin::kitchen` target.
use kantin_engine::events::{EventHandlers, EventHooks, OrderAnnulledEvent, OrderPaidEvent};
use log::*;

pub const KITCHEN_EVENT_BUFFER_SIZE: usize = 25;

pub fn create_kitchen_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev| {
        let OrderPaidEvent { order, payment } = ev;
        Box::pin(async move {
            info!(
                target: "kantin::kitchen",
                "🍽️ Order {} for {} at seat {} is paid ({} by {}). Start cooking.",
                order.id, order.buyer_name, order.seat, order.total_price, payment.payment_method
            );
            if !order.notes.is_empty() {
                info!(target: "kantin::kitchen", "🍽️ Notes for order {}: {}", order.id, order.notes);
            }
        })
    });
    hooks.on_order_annulled(move |ev| {
        let OrderAnnulledEvent { order, payment, status } = ev;
        Box::pin(async move {
            warn!(
                target: "kantin::kitchen",
                "🍽️ Order {} for seat {} is off. Payment {} ended as {status}.",
                order.id, order.seat, payment.provider_order_id
            );
        })
    });
    EventHandlers::new(KITCHEN_EVENT_BUFFER_SIZE, hooks)
}
