//! Stock / pending-restock reconciliation.
//!
//! An item carries two quantities: `stock` (available now) and
//! `pending_restock` (owed to demand that stock could not cover). The
//! rules below are the only way the pair changes:
//!
//! - [`StockLevels::receive`]: new stock pays down the backlog first; only
//!   the excess becomes visible stock.
//! - [`StockLevels::consume`]: a need is served from stock; any shortfall
//!   is added to the backlog.
//! - [`StockLevels::replace`]: an operator overrides both values verbatim.
//!
//! `receive` and `consume` both preserve the net position:
//! `stock - pending_restock` moves by exactly the amount received or needed.

use serde::{Deserialize, Serialize};

use teeforge_core::{DomainResult, ValueObject};

use crate::quantity::Quantity;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub stock: Quantity,
    pub pending_restock: Quantity,
}

impl StockLevels {
    pub fn new(stock: Quantity, pending_restock: Quantity) -> Self {
        Self {
            stock,
            pending_restock,
        }
    }

    /// Apply newly received stock against the backlog.
    pub fn receive(self, amount: Quantity) -> DomainResult<Self> {
        if amount >= self.pending_restock {
            let excess = amount.saturating_sub(self.pending_restock);
            Ok(Self {
                stock: self.stock.checked_add(excess)?,
                pending_restock: Quantity::ZERO,
            })
        } else {
            Ok(Self {
                stock: self.stock,
                pending_restock: self.pending_restock.saturating_sub(amount),
            })
        }
    }

    /// Take `needed` out of stock; whatever stock cannot cover is owed.
    pub fn consume(self, needed: Quantity) -> DomainResult<Self> {
        if needed > self.stock {
            let shortage = needed.saturating_sub(self.stock);
            Ok(Self {
                stock: Quantity::ZERO,
                pending_restock: self.pending_restock.checked_add(shortage)?,
            })
        } else {
            Ok(Self {
                stock: self.stock.saturating_sub(needed),
                pending_restock: self.pending_restock,
            })
        }
    }

    /// Direct replacement: what the operator typed is what is stored.
    pub fn replace(stock: Quantity, pending_restock: Quantity) -> Self {
        Self::new(stock, pending_restock)
    }

    pub fn has_backlog(&self) -> bool {
        !self.pending_restock.is_zero()
    }
}

impl ValueObject for StockLevels {}
