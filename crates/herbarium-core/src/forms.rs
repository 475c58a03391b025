//! Plant form validation and submission.
//!
//! A draft is normalized, validated in full (every violation is collected),
//! and only then handed to the database.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::inventory_db::{InventoryDb, PlantDraft, PlantId, UpdateOutcome};
use crate::text::text_len;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CommonName,
    Description,
    Habitat,
    CareInstructions,
    InventoryNotes,
    PlantPartsUsed,
    Uses,
    Family,
    Location,
    Section,
    Supplier,
    SupplierContact,
    Sku,
    Quantity,
    MinimumStock,
    UnitPrice,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::CommonName => "Common name",
            Field::Description => "Description",
            Field::Habitat => "Habitat",
            Field::CareInstructions => "Care instructions",
            Field::InventoryNotes => "Inventory notes",
            Field::PlantPartsUsed => "Plant parts used",
            Field::Uses => "Uses",
            Field::Family => "Family",
            Field::Location => "Location",
            Field::Section => "Section",
            Field::Supplier => "Supplier",
            Field::SupplierContact => "Supplier contact",
            Field::Sku => "SKU",
            Field::Quantity => "Quantity",
            Field::MinimumStock => "Minimum stock",
            Field::UnitPrice => "Unit price",
        }
    }

    /// Verb that agrees with [`Field::label`] in messages.
    fn verb(self) -> &'static str {
        match self {
            Field::CareInstructions | Field::InventoryNotes => "are",
            _ => "is",
        }
    }
}

/// Rich-text fields, measured with tags stripped.
const HTML_LIMITS: &[(Field, usize)] = &[
    (Field::Description, 5000),
    (Field::Habitat, 2000),
    (Field::CareInstructions, 3000),
    (Field::InventoryNotes, 1000),
    (Field::PlantPartsUsed, 500),
    (Field::Uses, 2000),
];

/// Plain text fields, measured as typed.
const PLAIN_LIMITS: &[(Field, usize)] = &[
    (Field::Family, 200),
    (Field::Location, 200),
    (Field::Section, 100),
    (Field::Supplier, 200),
    (Field::SupplierContact, 200),
    (Field::Sku, 50),
];

/// Largest visible length accepted for a field, if it has one.
pub fn limit_for(field: Field) -> Option<usize> {
    HTML_LIMITS
        .iter()
        .chain(PLAIN_LIMITS)
        .find(|(f, _)| *f == field)
        .map(|(_, n)| *n)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every violation found in one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    fn push(&mut self, field: Field, message: String) {
        self.errors.push(FieldError { field, message });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(". "))
    }
}

fn field_value(draft: &PlantDraft, field: Field) -> Option<&str> {
    match field {
        Field::Description => draft.description.as_deref(),
        Field::Habitat => draft.habitat.as_deref(),
        Field::CareInstructions => draft.care_instructions.as_deref(),
        Field::InventoryNotes => draft.inventory_notes.as_deref(),
        Field::PlantPartsUsed => draft.plant_parts_used.as_deref(),
        Field::Uses => draft.uses.as_deref(),
        Field::Family => draft.family.as_deref(),
        Field::Location => draft.location.as_deref(),
        Field::Section => draft.section.as_deref(),
        Field::Supplier => draft.supplier.as_deref(),
        Field::SupplierContact => draft.supplier_contact.as_deref(),
        Field::Sku => draft.sku.as_deref(),
        _ => None,
    }
}

fn too_long(field: Field, len: usize, max: usize) -> String {
    format!("{} {} {} characters too long", field.label(), field.verb(), len - max)
}

/// Check a normalized draft. Returns all violations at once.
pub fn validate_draft(draft: &PlantDraft) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();

    if draft.common_name.trim().is_empty() {
        errs.push(Field::CommonName, "Common name is required".to_string());
    }
    for &(field, max) in HTML_LIMITS {
        if let Some(v) = field_value(draft, field) {
            let len = text_len(v);
            if len > max {
                errs.push(field, too_long(field, len, max));
            }
        }
    }
    for &(field, max) in PLAIN_LIMITS {
        if let Some(v) = field_value(draft, field) {
            let len = v.chars().count();
            if len > max {
                errs.push(field, too_long(field, len, max));
            }
        }
    }
    if draft.quantity < 0 {
        errs.push(Field::Quantity, "Quantity cannot be negative".to_string());
    }
    if draft.minimum_stock() < 0 {
        errs.push(Field::MinimumStock, "Minimum stock cannot be negative".to_string());
    }
    if let Some(price) = draft.unit_price {
        if !price.is_finite() || price < 0.0 {
            errs.push(Field::UnitPrice, "Unit price cannot be negative".to_string());
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

/// Normalize and validate a submitted draft.
pub fn prepare(draft: &PlantDraft, default_minimum_stock: i64) -> Result<PlantDraft, ValidationErrors> {
    let draft = draft.normalized(default_minimum_stock);
    validate_draft(&draft)?;
    Ok(draft)
}

/// Validate and insert a new plant.
pub async fn submit_new_plant(
    db: &InventoryDb,
    draft: &PlantDraft,
    default_minimum_stock: i64,
    actor: &str,
) -> Result<PlantId> {
    let draft = prepare(draft, default_minimum_stock)?;
    db.create_plant(&draft, actor).await
}

/// Validate and apply an edit.
pub async fn submit_plant_changes(
    db: &InventoryDb,
    id: PlantId,
    draft: &PlantDraft,
    default_minimum_stock: i64,
    actor: &str,
) -> Result<UpdateOutcome> {
    let draft = prepare(draft, default_minimum_stock)?;
    db.update_plant(id, &draft, actor).await
}
