use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use teeforge_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use teeforge_events::Event;

/// Inventory category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryCategoryId(pub AggregateId);

impl InventoryCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What kind of material a category holds.
///
/// Textile queries filter on `Fabric`; the display name is free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Fabric,
    Ink,
    Blank,
    Trim,
    Packaging,
    Other,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Fabric => "fabric",
            CategoryKind::Ink => "ink",
            CategoryKind::Blank => "blank",
            CategoryKind::Trim => "trim",
            CategoryKind::Packaging => "packaging",
            CategoryKind::Other => "other",
        }
    }

    pub fn is_textile(self) -> bool {
        matches!(self, CategoryKind::Fabric)
    }
}

/// Aggregate root: InventoryCategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCategory {
    id: InventoryCategoryId,
    name: String,
    kind: CategoryKind,
    description: Option<String>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl InventoryCategory {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InventoryCategoryId) -> Self {
        Self {
            id,
            name: String::new(),
            kind: CategoryKind::Other,
            description: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.created && !self.deleted
    }
}

impl AggregateRoot for InventoryCategory {
    type Id = InventoryCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCategory {
    pub category_id: InventoryCategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub category_id: InventoryCategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteCategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCategory {
    pub category_id: InventoryCategoryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryCommand {
    CreateCategory(CreateCategory),
    UpdateCategory(UpdateCategory),
    DeleteCategory(DeleteCategory),
}

/// Event: CategoryCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCreated {
    pub category_id: InventoryCategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdated {
    pub category_id: InventoryCategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDeleted {
    pub category_id: InventoryCategoryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryEvent {
    CategoryCreated(CategoryCreated),
    CategoryUpdated(CategoryUpdated),
    CategoryDeleted(CategoryDeleted),
}

impl CategoryEvent {
    pub fn category_id(&self) -> InventoryCategoryId {
        match self {
            CategoryEvent::CategoryCreated(e) => e.category_id,
            CategoryEvent::CategoryUpdated(e) => e.category_id,
            CategoryEvent::CategoryDeleted(e) => e.category_id,
        }
    }
}

impl Event for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "inventory.category.created",
            CategoryEvent::CategoryUpdated(_) => "inventory.category.updated",
            CategoryEvent::CategoryDeleted(_) => "inventory.category.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CategoryEvent::CategoryCreated(e) => e.occurred_at,
            CategoryEvent::CategoryUpdated(e) => e.occurred_at,
            CategoryEvent::CategoryDeleted(e) => e.occurred_at,
        }
    }
}

fn clean_description(description: &Option<String>) -> Option<String> {
    description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn clean_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("category name cannot be empty"));
    }
    Ok(name.to_string())
}

impl Aggregate for InventoryCategory {
    type Command = CategoryCommand;
    type Event = CategoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CategoryEvent::CategoryCreated(e) => {
                self.id = e.category_id;
                self.name = e.name.clone();
                self.kind = e.kind;
                self.description = e.description.clone();
                self.created = true;
            }
            CategoryEvent::CategoryUpdated(e) => {
                self.name = e.name.clone();
                self.kind = e.kind;
                self.description = e.description.clone();
            }
            CategoryEvent::CategoryDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CategoryCommand::CreateCategory(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("category already exists"));
                }
                Ok(vec![CategoryEvent::CategoryCreated(CategoryCreated {
                    category_id: cmd.category_id,
                    name: clean_name(&cmd.name)?,
                    kind: cmd.kind,
                    description: clean_description(&cmd.description),
                    occurred_at: cmd.occurred_at,
                })])
            }
            CategoryCommand::UpdateCategory(cmd) => {
                if !self.exists() {
                    return Err(DomainError::not_found());
                }
                let name = clean_name(&cmd.name)?;
                let description = clean_description(&cmd.description);
                if name == self.name && cmd.kind == self.kind && description == self.description {
                    return Ok(vec![]);
                }
                Ok(vec![CategoryEvent::CategoryUpdated(CategoryUpdated {
                    category_id: cmd.category_id,
                    name,
                    kind: cmd.kind,
                    description,
                    occurred_at: cmd.occurred_at,
                })])
            }
            CategoryCommand::DeleteCategory(cmd) => {
                if !self.exists() {
                    return Err(DomainError::not_found());
                }
                Ok(vec![CategoryEvent::CategoryDeleted(CategoryDeleted {
                    category_id: cmd.category_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_category_id() -> InventoryCategoryId {
        InventoryCategoryId::new(AggregateId::new())
    }

    fn create(id: InventoryCategoryId, name: &str, kind: CategoryKind) -> CategoryCommand {
        CategoryCommand::CreateCategory(CreateCategory {
            category_id: id,
            name: name.to_string(),
            kind,
            description: None,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn create_category_trims_name() {
        let id = test_category_id();
        let mut category = InventoryCategory::empty(id);
        let events = category
            .handle(&create(id, "  Fabrics ", CategoryKind::Fabric))
            .unwrap();
        for e in &events {
            category.apply(e);
        }
        assert_eq!(category.name(), "Fabrics");
        assert!(category.kind().is_textile());
        assert_eq!(category.version(), 1);
    }

    #[test]
    fn create_category_rejects_empty_name() {
        let id = test_category_id();
        let err = InventoryCategory::empty(id)
            .handle(&create(id, " ", CategoryKind::Ink))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unchanged_update_emits_nothing() {
        let id = test_category_id();
        let mut category = InventoryCategory::empty(id);
        for e in category.handle(&create(id, "Inks", CategoryKind::Ink)).unwrap() {
            category.apply(&e);
        }
        let update = CategoryCommand::UpdateCategory(UpdateCategory {
            category_id: id,
            name: "Inks".to_string(),
            kind: CategoryKind::Ink,
            description: Some("".to_string()),
            occurred_at: Utc::now(),
        });
        assert!(category.handle(&update).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_category_is_not_found() {
        let id = test_category_id();
        let cmd = CategoryCommand::DeleteCategory(DeleteCategory {
            category_id: id,
            occurred_at: Utc::now(),
        });
        assert_eq!(
            InventoryCategory::empty(id).handle(&cmd).unwrap_err(),
            DomainError::NotFound
        );
    }
}
