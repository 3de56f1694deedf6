use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use teeforge_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use teeforge_events::Event;

use crate::category::InventoryCategoryId;
use crate::levels::StockLevels;
use crate::quantity::Quantity;

/// Inventory item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub AggregateId);

impl InventoryItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Descriptive fields of an item, replaced as a whole by the edit operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    pub category_id: InventoryCategoryId,
    pub unit: String,
    pub description: Option<String>,
}

impl ItemDetails {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        Ok(())
    }

    /// Trimmed copy; blank descriptions collapse to `None`.
    fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            unit: self.unit.trim().to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }
}

/// Aggregate root: InventoryItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    details: Option<ItemDetails>,
    levels: StockLevels,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InventoryItemId) -> Self {
        Self {
            id,
            details: None,
            levels: StockLevels::default(),
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn details(&self) -> Option<&ItemDetails> {
        self.details.as_ref()
    }

    pub fn levels(&self) -> StockLevels {
        self.levels
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Created and not deleted.
    pub fn exists(&self) -> bool {
        self.created && !self.deleted
    }
}

impl AggregateRoot for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub stock: Decimal,
    pub pending_restock: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock.
///
/// The "update item" entry point: replaces the descriptive fields and
/// reconciles `amount_added` against the backlog. A zero amount edits
/// details only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub amount_added: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceItem (administrative edit, no reconciliation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceItem {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub stock: Decimal,
    pub pending_restock: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConsumeForNeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeForNeed {
    pub item_id: InventoryItemId,
    pub needed_qty: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItem {
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    ReceiveStock(ReceiveStock),
    ReplaceItem(ReplaceItem),
    ConsumeForNeed(ConsumeForNeed),
    DeleteItem(DeleteItem),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub levels: StockLevels,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailsUpdated {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived. `levels` are the levels after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub item_id: InventoryItemId,
    pub amount: Quantity,
    pub levels: StockLevels,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LevelsReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsReplaced {
    pub item_id: InventoryItemId,
    pub levels: StockLevels,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockConsumed. `levels` are the levels after the deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConsumed {
    pub item_id: InventoryItemId,
    pub needed: Quantity,
    pub levels: StockLevels,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeleted {
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    ItemDetailsUpdated(ItemDetailsUpdated),
    StockReceived(StockReceived),
    LevelsReplaced(LevelsReplaced),
    StockConsumed(StockConsumed),
    ItemDeleted(ItemDeleted),
}

impl InventoryEvent {
    pub fn item_id(&self) -> InventoryItemId {
        match self {
            InventoryEvent::ItemCreated(e) => e.item_id,
            InventoryEvent::ItemDetailsUpdated(e) => e.item_id,
            InventoryEvent::StockReceived(e) => e.item_id,
            InventoryEvent::LevelsReplaced(e) => e.item_id,
            InventoryEvent::StockConsumed(e) => e.item_id,
            InventoryEvent::ItemDeleted(e) => e.item_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::ItemDetailsUpdated(_) => "inventory.item.details_updated",
            InventoryEvent::StockReceived(_) => "inventory.item.stock_received",
            InventoryEvent::LevelsReplaced(_) => "inventory.item.levels_replaced",
            InventoryEvent::StockConsumed(_) => "inventory.item.stock_consumed",
            InventoryEvent::ItemDeleted(_) => "inventory.item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::ItemDetailsUpdated(e) => e.occurred_at,
            InventoryEvent::StockReceived(e) => e.occurred_at,
            InventoryEvent::LevelsReplaced(e) => e.occurred_at,
            InventoryEvent::StockConsumed(e) => e.occurred_at,
            InventoryEvent::ItemDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.details = Some(e.details.clone());
                self.levels = e.levels;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            InventoryEvent::ItemDetailsUpdated(e) => {
                self.details = Some(e.details.clone());
            }
            InventoryEvent::StockReceived(e) => {
                self.levels = e.levels;
            }
            InventoryEvent::LevelsReplaced(e) => {
                self.levels = e.levels;
            }
            InventoryEvent::StockConsumed(e) => {
                self.levels = e.levels;
            }
            InventoryEvent::ItemDeleted(_) => {
                self.deleted = true;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            InventoryCommand::ReplaceItem(cmd) => self.handle_replace(cmd),
            InventoryCommand::ConsumeForNeed(cmd) => self.handle_consume(cmd),
            InventoryCommand::DeleteItem(cmd) => self.handle_delete(cmd),
        }
    }
}

impl InventoryItem {
    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: InventoryItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    /// `ItemDetailsUpdated` when the normalized details differ from the current ones.
    fn details_change(
        &self,
        details: &ItemDetails,
        occurred_at: DateTime<Utc>,
    ) -> Result<Option<InventoryEvent>, DomainError> {
        details.validate()?;
        let details = details.normalized();
        if self.details.as_ref() == Some(&details) {
            return Ok(None);
        }
        Ok(Some(InventoryEvent::ItemDetailsUpdated(ItemDetailsUpdated {
            item_id: self.id,
            details,
            occurred_at,
        })))
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        self.ensure_item_id(cmd.item_id)?;
        cmd.details.validate()?;

        let stock = Quantity::parse(cmd.stock, "stock")?;
        let pending = Quantity::parse(cmd.pending_restock.unwrap_or_default(), "pending_restock")?;

        Ok(vec![InventoryEvent::ItemCreated(ItemCreated {
            item_id: cmd.item_id,
            details: cmd.details.normalized(),
            levels: StockLevels::new(stock, pending),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_item_id(cmd.item_id)?;

        let amount = Quantity::parse(cmd.amount_added, "amount added")?;
        // Receiving nothing leaves the item untouched, details included.
        if amount.is_zero() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        if let Some(ev) = self.details_change(&cmd.details, cmd.occurred_at)? {
            events.push(ev);
        }
        events.push(InventoryEvent::StockReceived(StockReceived {
            item_id: cmd.item_id,
            amount,
            levels: self.levels.receive(amount)?,
            occurred_at: cmd.occurred_at,
        }));

        Ok(events)
    }

    fn handle_replace(&self, cmd: &ReplaceItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_item_id(cmd.item_id)?;

        let levels = StockLevels::replace(
            Quantity::parse(cmd.stock, "stock")?,
            Quantity::parse(cmd.pending_restock, "pending_restock")?,
        );

        let mut events = Vec::new();
        if let Some(ev) = self.details_change(&cmd.details, cmd.occurred_at)? {
            events.push(ev);
        }

        if levels != self.levels {
            events.push(InventoryEvent::LevelsReplaced(LevelsReplaced {
                item_id: cmd.item_id,
                levels,
                occurred_at: cmd.occurred_at,
            }));
        }

        Ok(events)
    }

    fn handle_consume(&self, cmd: &ConsumeForNeed) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_item_id(cmd.item_id)?;

        let needed = Quantity::parse(cmd.needed_qty, "needed quantity")?;
        if needed.is_zero() {
            return Ok(vec![]);
        }

        Ok(vec![InventoryEvent::StockConsumed(StockConsumed {
            item_id: cmd.item_id,
            needed,
            levels: self.levels.consume(needed)?,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_item_id(cmd.item_id)?;

        Ok(vec![InventoryEvent::ItemDeleted(ItemDeleted {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
