use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use molino_bom::Requirement;
use molino_core::{
    Aggregate, AggregateRoot, BomId, DomainError, LotId, OrderId, ProductId, Quantity, UserId,
    WarehouseId,
};

/// Production order status lifecycle.
///
/// `Scheduled → InProgress → Completed`, with `Draft → Scheduled` and
/// `Draft | Scheduled → Cancelled` as the only other legal moves. No
/// transition ever leaves a terminal state, and cancelling an in-progress
/// order is deliberately unsupported (it would require compensating
/// movements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Scheduled => "scheduled",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: ProductionOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionOrder {
    id: OrderId,
    order_number: String,
    bom_id: Option<BomId>,
    /// Denormalized from the BOM at creation time.
    product_id: Option<ProductId>,
    warehouse_id: Option<WarehouseId>,
    planned_quantity: Quantity,
    produced_quantity: Quantity,
    waste_quantity: Quantity,
    status: OrderStatus,
    scheduled_start: Option<DateTime<Utc>>,
    scheduled_end: Option<DateTime<Utc>>,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    created_by: Option<UserId>,
    version: u64,
    created: bool,
}

impl ProductionOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: String::new(),
            bom_id: None,
            product_id: None,
            warehouse_id: None,
            planned_quantity: Quantity::ZERO,
            produced_quantity: Quantity::ZERO,
            waste_quantity: Quantity::ZERO,
            status: OrderStatus::Draft,
            scheduled_start: None,
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            created_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn bom_id(&self) -> Option<BomId> {
        self.bom_id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn planned_quantity(&self) -> Quantity {
        self.planned_quantity
    }

    pub fn produced_quantity(&self) -> Quantity {
        self.produced_quantity
    }

    pub fn waste_quantity(&self) -> Quantity {
        self.waste_quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn actual_start(&self) -> Option<DateTime<Utc>> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<DateTime<Utc>> {
        self.actual_end
    }
}

impl AggregateRoot for ProductionOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub bom_id: BomId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub planned_quantity: Quantity,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    /// Leave the order in `Draft` instead of `Scheduled`.
    pub as_draft: bool,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Schedule (only from Draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Start. Requirements come pre-resolved by the service so the
/// decision stays pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Start {
    pub order_id: OrderId,
    pub requirements: Vec<Requirement>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Complete. Produced/waste are operator-entered; the lot id is
/// assigned by the service before minting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complete {
    pub order_id: OrderId,
    pub produced_quantity: Quantity,
    pub waste_quantity: Quantity,
    pub lot_id: LotId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    CreateOrder(CreateOrder),
    Schedule(Schedule),
    Start(Start),
    Complete(Complete),
    Cancel(Cancel),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub order_number: String,
    pub bom_id: BomId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub planned_quantity: Quantity,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderScheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderScheduled {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductionStarted.
///
/// Carries the resolved consumption so the service can turn it into
/// `production_consume` movements without re-resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStarted {
    pub order_id: OrderId,
    pub consumed: Vec<Requirement>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductionCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompleted {
    pub order_id: OrderId,
    pub lot_id: LotId,
    pub produced_quantity: Quantity,
    pub waste_quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderScheduled(OrderScheduled),
    ProductionStarted(ProductionStarted),
    ProductionCompleted(ProductionCompleted),
    OrderCancelled(OrderCancelled),
}

impl Aggregate for ProductionOrder {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.order_number = e.order_number.clone();
                self.bom_id = Some(e.bom_id);
                self.product_id = Some(e.product_id);
                self.warehouse_id = Some(e.warehouse_id);
                self.planned_quantity = e.planned_quantity;
                self.scheduled_start = e.scheduled_start;
                self.scheduled_end = e.scheduled_end;
                self.status = e.status;
                self.created_by = Some(e.created_by);
                self.created = true;
            }
            OrderEvent::OrderScheduled(_) => {
                self.status = OrderStatus::Scheduled;
            }
            OrderEvent::ProductionStarted(e) => {
                self.status = OrderStatus::InProgress;
                self.actual_start = Some(e.occurred_at);
            }
            OrderEvent::ProductionCompleted(e) => {
                self.status = OrderStatus::Completed;
                self.produced_quantity = e.produced_quantity;
                self.waste_quantity = e.waste_quantity;
                self.actual_end = Some(e.occurred_at);
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            OrderCommand::Schedule(cmd) => self.handle_schedule(cmd),
            OrderCommand::Start(cmd) => self.handle_start(cmd),
            OrderCommand::Complete(cmd) => self.handle_complete(cmd),
            OrderCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl ProductionOrder {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("production order already exists"));
        }
        if cmd.order_number.trim().is_empty() {
            return Err(DomainError::validation("order number cannot be empty"));
        }
        if !cmd.planned_quantity.is_positive() {
            return Err(DomainError::validation(format!(
                "planned quantity must be positive, got {}",
                cmd.planned_quantity
            )));
        }

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            bom_id: cmd.bom_id,
            product_id: cmd.product_id,
            warehouse_id: cmd.warehouse_id,
            planned_quantity: cmd.planned_quantity,
            scheduled_start: cmd.scheduled_start,
            scheduled_end: cmd.scheduled_end,
            status: if cmd.as_draft {
                OrderStatus::Draft
            } else {
                OrderStatus::Scheduled
            },
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_schedule(&self, cmd: &Schedule) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::reference_not_found(format!(
                "production order {}",
                cmd.order_id
            )));
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status != OrderStatus::Draft {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                OrderStatus::Scheduled.as_str(),
            ));
        }

        Ok(vec![OrderEvent::OrderScheduled(OrderScheduled {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start(&self, cmd: &Start) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::reference_not_found(format!(
                "production order {}",
                cmd.order_id
            )));
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status != OrderStatus::Scheduled {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                OrderStatus::InProgress.as_str(),
            ));
        }

        if cmd.requirements.is_empty() {
            return Err(DomainError::invalid_bom(
                "cannot start production without resolved requirements",
            ));
        }
        for requirement in &cmd.requirements {
            if !requirement.quantity.is_positive() {
                return Err(DomainError::invalid_bom(format!(
                    "resolved requirement for product {} must be positive, got {}",
                    requirement.product_id, requirement.quantity
                )));
            }
        }

        Ok(vec![OrderEvent::ProductionStarted(ProductionStarted {
            order_id: cmd.order_id,
            consumed: cmd.requirements.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &Complete) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::reference_not_found(format!(
                "production order {}",
                cmd.order_id
            )));
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status != OrderStatus::InProgress {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                OrderStatus::Completed.as_str(),
            ));
        }

        if !cmd.produced_quantity.is_positive() {
            return Err(DomainError::validation(format!(
                "produced quantity must be positive, got {}",
                cmd.produced_quantity
            )));
        }
        if cmd.waste_quantity.is_negative() {
            return Err(DomainError::validation(format!(
                "waste quantity cannot be negative, got {}",
                cmd.waste_quantity
            )));
        }

        Ok(vec![OrderEvent::ProductionCompleted(ProductionCompleted {
            order_id: cmd.order_id,
            lot_id: cmd.lot_id,
            produced_quantity: cmd.produced_quantity,
            waste_quantity: cmd.waste_quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &Cancel) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::reference_not_found(format!(
                "production order {}",
                cmd.order_id
            )));
        }
        self.ensure_order_id(cmd.order_id)?;

        // Cancelling once consumption has happened would need compensating
        // movements; only pre-consumption states may escape.
        if !matches!(self.status, OrderStatus::Draft | OrderStatus::Scheduled) {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                OrderStatus::Cancelled.as_str(),
            ));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_order_id() -> OrderId {
        OrderId::new()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(order_id: OrderId, as_draft: bool) -> CreateOrder {
        CreateOrder {
            order_id,
            order_number: "OP-20260830-0001".to_string(),
            bom_id: BomId::new(),
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            planned_quantity: Quantity::new(dec!(50)),
            scheduled_start: None,
            scheduled_end: None,
            as_draft,
            created_by: UserId::new(),
            occurred_at: test_time(),
        }
    }

    fn requirements() -> Vec<Requirement> {
        vec![Requirement {
            product_id: ProductId::new(),
            quantity: Quantity::new(dec!(10)),
        }]
    }

    fn created_order(as_draft: bool) -> ProductionOrder {
        let order_id = test_order_id();
        let mut order = ProductionOrder::empty(order_id);
        let events = order
            .handle(&OrderCommand::CreateOrder(create_cmd(order_id, as_draft)))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    fn in_progress_order() -> ProductionOrder {
        let mut order = created_order(false);
        let events = order
            .handle(&OrderCommand::Start(Start {
                order_id: order.id_typed(),
                requirements: requirements(),
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    #[test]
    fn create_defaults_to_scheduled() {
        let order = created_order(false);
        assert_eq!(order.status(), OrderStatus::Scheduled);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn draft_can_be_scheduled() {
        let mut order = created_order(true);
        assert_eq!(order.status(), OrderStatus::Draft);

        let events = order
            .handle(&OrderCommand::Schedule(Schedule {
                order_id: order.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::Scheduled);
    }

    #[test]
    fn start_records_actual_start_and_consumption() {
        let mut order = created_order(false);
        let reqs = requirements();
        let events = order
            .handle(&OrderCommand::Start(Start {
                order_id: order.id_typed(),
                requirements: reqs.clone(),
                occurred_at: test_time(),
            }))
            .unwrap();

        match &events[0] {
            OrderEvent::ProductionStarted(e) => assert_eq!(e.consumed, reqs),
            other => panic!("expected ProductionStarted, got {other:?}"),
        }
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::InProgress);
        assert!(order.actual_start().is_some());
    }

    #[test]
    fn completing_a_scheduled_order_is_an_invalid_transition() {
        let order = created_order(false);
        let err = order
            .handle(&OrderCommand::Complete(Complete {
                order_id: order.id_typed(),
                produced_quantity: Quantity::new(dec!(48)),
                waste_quantity: Quantity::new(dec!(2)),
                lot_id: LotId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn starting_twice_is_an_invalid_transition() {
        let order = in_progress_order();
        let err = order
            .handle(&OrderCommand::Start(Start {
                order_id: order.id_typed(),
                requirements: requirements(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn complete_records_output_and_timestamps() {
        let mut order = in_progress_order();
        let lot_id = LotId::new();
        let events = order
            .handle(&OrderCommand::Complete(Complete {
                order_id: order.id_typed(),
                produced_quantity: Quantity::new(dec!(48)),
                waste_quantity: Quantity::new(dec!(2)),
                lot_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);

        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.produced_quantity(), Quantity::new(dec!(48)));
        assert_eq!(order.waste_quantity(), Quantity::new(dec!(2)));
        assert!(order.actual_end().is_some());
    }

    #[test]
    fn terminal_states_accept_no_transition() {
        let mut order = in_progress_order();
        let events = order
            .handle(&OrderCommand::Complete(Complete {
                order_id: order.id_typed(),
                produced_quantity: Quantity::new(dec!(48)),
                waste_quantity: Quantity::ZERO,
                lot_id: LotId::new(),
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        assert!(order.status().is_terminal());

        for command in [
            OrderCommand::Schedule(Schedule {
                order_id: order.id_typed(),
                occurred_at: test_time(),
            }),
            OrderCommand::Start(Start {
                order_id: order.id_typed(),
                requirements: requirements(),
                occurred_at: test_time(),
            }),
            OrderCommand::Cancel(Cancel {
                order_id: order.id_typed(),
                occurred_at: test_time(),
            }),
        ] {
            let err = order.handle(&command).unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn cancel_is_allowed_from_draft_and_scheduled_only() {
        for as_draft in [true, false] {
            let mut order = created_order(as_draft);
            let events = order
                .handle(&OrderCommand::Cancel(Cancel {
                    order_id: order.id_typed(),
                    occurred_at: test_time(),
                }))
                .unwrap();
            order.apply(&events[0]);
            assert_eq!(order.status(), OrderStatus::Cancelled);
        }

        let order = in_progress_order();
        let err = order
            .handle(&OrderCommand::Cancel(Cancel {
                order_id: order.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn rejects_non_positive_planned_quantity() {
        let order_id = test_order_id();
        let order = ProductionOrder::empty(order_id);
        let mut cmd = create_cmd(order_id, false);
        cmd.planned_quantity = Quantity::ZERO;
        let err = order
            .handle(&OrderCommand::CreateOrder(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
