//! Production orchestration.
//!
//! The aggregate decides, the service performs the writes: ledger movements,
//! lot minting and order persistence. Each step is idempotent so a run that
//! died between the movement append and the order save can be retried
//! without double-consuming or double-minting.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use molino_bom::{resolve, BomRegistry};
use molino_catalog::Catalog;
use molino_core::{
    Aggregate, AggregateRoot, BomId, DomainError, DomainResult, ExpectedVersion, LotId, OrderId,
    ProductId, Quantity, UserId, WarehouseId,
};
use molino_ledger::{
    LotScope, MovementFilter, MovementReference, MovementType, NewMovement, StockLedger, StockQuery,
};
use molino_lots::{Lot, LotRegistry, NewLot};

use crate::order::{
    Cancel, Complete, CreateOrder, OrderCommand, ProductionOrder, Schedule, Start,
};
use crate::store::OrderStore;

/// Feasibility check applied when production starts.
///
/// The ledger itself never blocks negative stock; this policy is the opt-in
/// layer above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityPolicy {
    /// Consume regardless of on-hand stock (stock may go negative).
    #[default]
    None,
    /// Refuse to start when any requirement exceeds warehouse on-hand.
    RejectShortfall,
}

/// Input for creating a production order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub bom_id: BomId,
    pub warehouse_id: WarehouseId,
    pub planned_quantity: Quantity,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    /// Create in `Draft` instead of going straight to `Scheduled`.
    pub as_draft: bool,
    pub created_by: UserId,
}

pub struct ProductionService<C, B, L, S, O> {
    catalog: C,
    boms: B,
    lots: L,
    ledger: S,
    orders: O,
    availability: AvailabilityPolicy,
}

/// `OP-YYYYMMDD-xxxx`; the suffix ties the number back to the order id.
///
/// The suffix is the *trailing* hex of the order UUID: v7 ids lead with the
/// timestamp, which is shared by ids minted close together.
fn derive_order_number(date: NaiveDate, order_id: OrderId) -> String {
    let uuid = order_id.as_uuid().simple().to_string();
    format!("OP-{}-{}", date.format("%Y%m%d"), &uuid[uuid.len() - 4..])
}

impl<C, B, L, S, O> ProductionService<C, B, L, S, O>
where
    C: Catalog,
    B: BomRegistry,
    L: LotRegistry,
    S: StockLedger,
    O: OrderStore,
{
    pub fn new(catalog: C, boms: B, lots: L, ledger: S, orders: O) -> Self {
        Self {
            catalog,
            boms,
            lots,
            ledger,
            orders,
            availability: AvailabilityPolicy::default(),
        }
    }

    pub fn with_availability_policy(mut self, policy: AvailabilityPolicy) -> Self {
        self.availability = policy;
        self
    }

    /// Validate references, snapshot the BOM's target product and persist a
    /// new order. Nothing moves in the ledger here.
    #[instrument(skip(self, request), fields(bom_id = %request.bom_id))]
    pub fn create_order(&self, request: CreateOrderRequest) -> DomainResult<ProductionOrder> {
        let bom = self.boms.require(request.bom_id)?;
        if !bom.header.active {
            return Err(DomainError::invalid_bom(format!(
                "bom {} is inactive",
                bom.header.id
            )));
        }
        self.catalog.require_warehouse(request.warehouse_id)?;
        self.catalog.require_product(bom.header.product_id)?;

        let order_id = OrderId::new();
        let now = Utc::now();
        let mut order = ProductionOrder::empty(order_id);
        let events = order.handle(&OrderCommand::CreateOrder(CreateOrder {
            order_id,
            order_number: derive_order_number(now.date_naive(), order_id),
            bom_id: bom.header.id,
            product_id: bom.header.product_id,
            warehouse_id: request.warehouse_id,
            planned_quantity: request.planned_quantity,
            scheduled_start: request.scheduled_start,
            scheduled_end: request.scheduled_end,
            as_draft: request.as_draft,
            created_by: request.created_by,
            occurred_at: now,
        }))?;
        for event in &events {
            order.apply(event);
        }

        self.orders.insert(order.clone())?;
        info!(order_number = order.order_number(), "production order created");
        Ok(order)
    }

    /// Move a draft order onto the schedule.
    #[instrument(skip(self))]
    pub fn schedule(&self, order_id: OrderId) -> DomainResult<ProductionOrder> {
        let mut order = self.orders.require(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let events = order.handle(&OrderCommand::Schedule(Schedule {
            order_id,
            occurred_at: Utc::now(),
        }))?;
        for event in &events {
            order.apply(event);
        }

        self.orders.save(order.clone(), expected)?;
        Ok(order)
    }

    /// Start production: resolve the recipe to the planned quantity and
    /// consume the materials in one atomic batch.
    ///
    /// Consumption movements are lot-agnostic. If a previous attempt already
    /// appended them the batch is skipped, so a crashed run can be retried.
    #[instrument(skip(self), fields(actor = %actor))]
    pub fn start(&self, order_id: OrderId, actor: UserId) -> DomainResult<ProductionOrder> {
        let mut order = self.orders.require(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        let bom_id = order
            .bom_id()
            .ok_or_else(|| DomainError::validation("order has no BOM"))?;
        let warehouse_id = order
            .warehouse_id()
            .ok_or_else(|| DomainError::validation("order has no warehouse"))?;

        let bom = self.boms.require(bom_id)?;
        let requirements = resolve(&bom, order.planned_quantity())?;

        let events = order.handle(&OrderCommand::Start(Start {
            order_id,
            requirements: requirements.clone(),
            occurred_at: Utc::now(),
        }))?;

        if self.availability == AvailabilityPolicy::RejectShortfall {
            for requirement in &requirements {
                let on_hand = self.on_hand(warehouse_id, requirement.product_id)?;
                if on_hand - requirement.quantity < Quantity::ZERO {
                    return Err(DomainError::validation(format!(
                        "insufficient stock for product {}: required {}, on hand {}",
                        requirement.product_id, requirement.quantity, on_hand
                    )));
                }
            }
        }

        let reference = MovementReference::production_order(order_id);
        if self.already_consumed(reference)? {
            warn!(%order_id, "consumption already recorded, skipping append");
        } else {
            let batch: Vec<NewMovement> = requirements
                .iter()
                .map(|requirement| NewMovement {
                    movement_type: MovementType::ProductionConsume,
                    warehouse_id,
                    product_id: requirement.product_id,
                    lot_id: None,
                    quantity: -requirement.quantity,
                    reference: Some(reference),
                    created_by: actor,
                })
                .collect();
            self.ledger.append(batch)?;
        }

        for event in &events {
            order.apply(event);
        }
        self.orders.save(order.clone(), expected)?;
        info!(order_number = order.order_number(), "production started");
        Ok(order)
    }

    /// Complete production: mint the output lot and credit it in the ledger.
    ///
    /// Waste is recorded on the order only; it never touches stock. Reuses
    /// the order's lot if an earlier attempt minted one.
    #[instrument(skip(self), fields(actor = %actor))]
    pub fn complete(
        &self,
        order_id: OrderId,
        produced_quantity: Quantity,
        waste_quantity: Quantity,
        expiry_date: Option<NaiveDate>,
        actor: UserId,
    ) -> DomainResult<(ProductionOrder, Lot)> {
        let mut order = self.orders.require(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());
        let product_id = order
            .product_id()
            .ok_or_else(|| DomainError::validation("order has no product"))?;
        let warehouse_id = order
            .warehouse_id()
            .ok_or_else(|| DomainError::validation("order has no warehouse"))?;

        let now = Utc::now();
        let existing_lot = self.lots.find_by_order(order_id)?;
        let lot_id = existing_lot.as_ref().map(|l| l.id).unwrap_or_else(LotId::new);

        // Decide first; an invalid transition must not mint anything.
        let events = order.handle(&OrderCommand::Complete(Complete {
            order_id,
            produced_quantity,
            waste_quantity,
            lot_id,
            occurred_at: now,
        }))?;

        let lot = match existing_lot {
            Some(existing) => {
                warn!(%order_id, lot = %existing.lot_number, "lot already minted, reusing");
                existing
            }
            None => self.lots.mint(NewLot {
                id: lot_id,
                product_id,
                order_id,
                production_date: now.date_naive(),
                expiry_date,
                initial_quantity: produced_quantity,
            })?,
        };

        let reference = MovementReference::production_order(order_id);
        if self.already_output(reference)? {
            warn!(%order_id, "output already recorded, skipping append");
        } else {
            self.ledger.append(vec![NewMovement {
                movement_type: MovementType::ProductionOutput,
                warehouse_id,
                product_id,
                lot_id: Some(lot.id),
                quantity: produced_quantity,
                reference: Some(reference),
                created_by: actor,
            }])?;
        }

        for event in &events {
            order.apply(event);
        }
        self.orders.save(order.clone(), expected)?;
        info!(
            order_number = order.order_number(),
            lot = %lot.lot_number,
            "production completed"
        );
        Ok((order, lot))
    }

    /// Cancel a draft or scheduled order. Pure status write: nothing has
    /// been consumed yet, so there is nothing to compensate.
    #[instrument(skip(self))]
    pub fn cancel(&self, order_id: OrderId) -> DomainResult<ProductionOrder> {
        let mut order = self.orders.require(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let events = order.handle(&OrderCommand::Cancel(Cancel {
            order_id,
            occurred_at: Utc::now(),
        }))?;
        for event in &events {
            order.apply(event);
        }

        self.orders.save(order.clone(), expected)?;
        info!(order_number = order.order_number(), "production order cancelled");
        Ok(order)
    }

    /// Total on-hand for a product in a warehouse, across lot buckets and
    /// the lot-agnostic bucket.
    fn on_hand(&self, warehouse_id: WarehouseId, product_id: ProductId) -> DomainResult<Quantity> {
        let entries = self.ledger.stock_levels(&StockQuery {
            warehouse_id: Some(warehouse_id),
            product_id: Some(product_id),
            lot: LotScope::Any,
        })?;
        Ok(entries
            .into_iter()
            .fold(Quantity::ZERO, |total, entry| total + entry.quantity))
    }

    fn already_consumed(&self, reference: MovementReference) -> DomainResult<bool> {
        let filter = MovementFilter {
            movement_type: Some(MovementType::ProductionConsume),
            ..MovementFilter::by_reference(reference)
        };
        Ok(!self.ledger.history(&filter)?.is_empty())
    }

    fn already_output(&self, reference: MovementReference) -> DomainResult<bool> {
        let filter = MovementFilter {
            movement_type: Some(MovementType::ProductionOutput),
            ..MovementFilter::by_reference(reference)
        };
        Ok(!self.ledger.history(&filter)?.is_empty())
    }
}
