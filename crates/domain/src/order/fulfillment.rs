//! Per-item fulfillment state machine.

use chrono::Utc;
use common::{ItemStatus, UserId};
use order_store::{CartStore, ItemTransition, OrderItemRecord, OrderRepository, StoreError};

use crate::collaborators::Notification;
use crate::error::OrderError;

use super::{Actor, ActorRole, AdvanceStatus, OrderService, messages};

/// Fails with `IllegalTransition` unless `target` is the next pipeline step
/// or a cancellation the current status still permits.
pub fn ensure_legal(current: ItemStatus, target: ItemStatus) -> Result<(), OrderError> {
    if current.allows(target) {
        Ok(())
    } else {
        Err(OrderError::IllegalTransition {
            from: current,
            to: target,
        })
    }
}

/// Fails with `ForbiddenTransition` unless `actor` owns this kind of move.
///
/// Forward steps and seller cancellations belong to the item's seller.
/// Buyer cancellations belong to the order's buyer.
pub fn authorize(
    actor: &Actor,
    target: ItemStatus,
    seller_id: UserId,
    buyer_id: UserId,
) -> Result<(), OrderError> {
    let (role, owner) = match target {
        ItemStatus::CancelledByBuyer => (ActorRole::Buyer, buyer_id),
        _ => (ActorRole::Seller, seller_id),
    };

    if actor.role != role {
        return Err(OrderError::ForbiddenTransition {
            reason: format!("a {} cannot move an item to {target}", actor.role),
        });
    }
    if actor.id != owner {
        return Err(OrderError::ForbiddenTransition {
            reason: format!("{} {} does not own this item", actor.role, actor.id),
        });
    }
    Ok(())
}

/// Returns the reason to persist. Cancellations need a non-blank one;
/// anything sent with a forward step is dropped.
fn cancel_reason_for(target: ItemStatus, reason: Option<&str>) -> Result<Option<String>, OrderError> {
    if !target.is_cancellation() {
        return Ok(None);
    }
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(Some(r.to_string())),
        _ => Err(OrderError::Validation(
            "cancel_reason is required when cancelling".to_string(),
        )),
    }
}

fn transition_notice(buyer_id: UserId, item: &OrderItemRecord) -> Notification {
    let reason = item.cancel_reason.as_deref().unwrap_or_default();
    match item.status {
        ItemStatus::CancelledByBuyer => Notification::new(
            item.seller_id,
            messages::cancelled_by_buyer(item.order_id, &item.product_name, reason),
        ),
        ItemStatus::CancelledBySeller => Notification::new(
            buyer_id,
            messages::cancelled_by_seller(item.order_id, &item.product_name, reason),
        ),
        status => Notification::new(
            buyer_id,
            messages::status_changed(item.order_id, &item.product_name, status),
        ),
    }
}

impl<S: OrderRepository + CartStore> OrderService<S> {
    /// Moves one order item to a new status on behalf of an actor.
    ///
    /// Checks run in a fixed order: the item must exist, the move must be
    /// legal from its current status, the actor must own the move, and a
    /// cancellation must carry a reason. An illegal move by someone who is
    /// neither the buyer nor the item's seller fails with
    /// `TransitionRejected`, which leaves out the current status. The write is a compare-and-set on
    /// the item version, so of two racing calls exactly one wins and the
    /// other fails with `IllegalTransition`.
    #[tracing::instrument(
        skip(self, cmd),
        fields(
            order_id = %cmd.order_id,
            product_id = %cmd.product_id,
            actor_id = %cmd.actor.id,
            role = %cmd.actor.role,
            target = %cmd.target
        )
    )]
    pub async fn advance_status(&self, cmd: AdvanceStatus) -> Result<OrderItemRecord, OrderError> {
        let located = self
            .store
            .find_item(cmd.order_id, cmd.product_id)
            .await?
            .ok_or(OrderError::ItemNotFound {
                order_id: cmd.order_id,
                product_id: cmd.product_id,
            })?;
        let item = &located.item;

        if let Err(err) = ensure_legal(item.status, cmd.target) {
            let is_party = cmd.actor.id == located.buyer_id || cmd.actor.id == item.seller_id;
            return Err(if is_party {
                err
            } else {
                OrderError::TransitionRejected { to: cmd.target }
            });
        }
        authorize(&cmd.actor, cmd.target, item.seller_id, located.buyer_id)?;
        let cancel_reason = cancel_reason_for(cmd.target, cmd.cancel_reason.as_deref())?;

        let result = self
            .store
            .transition_item(ItemTransition {
                order_id: cmd.order_id,
                product_id: cmd.product_id,
                expected_version: item.version,
                status: cmd.target,
                cancel_reason,
                at: Utc::now(),
            })
            .await;

        let updated = match result {
            Ok(updated) => updated,
            Err(StoreError::StaleItem { .. }) => {
                // Report against whatever status won the race.
                let from = self
                    .store
                    .find_item(cmd.order_id, cmd.product_id)
                    .await?
                    .map_or(item.status, |l| l.item.status);
                tracing::info!(%from, "lost transition race");
                return Err(OrderError::IllegalTransition {
                    from,
                    to: cmd.target,
                });
            }
            Err(StoreError::ItemNotFound {
                order_id,
                product_id,
            }) => {
                return Err(OrderError::ItemNotFound {
                    order_id,
                    product_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        metrics::counter!("item_transitions_total", "status" => updated.status.as_str())
            .increment(1);
        tracing::info!(from = %item.status, to = %updated.status, "item status changed");

        self.notifications
            .dispatch(transition_notice(located.buyer_id, &updated))
            .await;

        Ok(updated)
    }
}
