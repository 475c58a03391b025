//! Tests for inventory_db (in-memory database).

use crate::catalog::listing::{ListingQuery, ListingSort};
use crate::inventory_db::{
    AdjustError, ChangeType, InventoryAdjustment, InventoryDb, PlantDraft, StoreError,
    UNCATEGORIZED,
};
use crate::stock::StockStatus;

const ACTOR: &str = "admin@example.org";

fn draft(name: &str, quantity: i64, minimum_stock: i64) -> PlantDraft {
    PlantDraft {
        common_name: name.to_string(),
        quantity,
        minimum_stock: Some(minimum_stock),
        ..Default::default()
    }
}

fn query() -> ListingQuery {
    ListingQuery {
        search: None,
        category: None,
        family: None,
        sort: ListingSort::NameAsc,
        page: 1,
    }
}

#[tokio::test]
async fn create_stores_derived_status_and_initial_history() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let id = db.create_plant(&draft("Lemon balm", 3, 5), ACTOR).await.unwrap();

    let plant = db.get_plant(id).await.unwrap().unwrap();
    assert_eq!(plant.status, StockStatus::LowStock);
    assert_eq!(plant.stock().shortage, 2);
    assert!(plant.date_acquired.is_some());

    let history = db.history_for_plant(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_type, ChangeType::Initial);
    assert_eq!((history[0].quantity_before, history[0].quantity_after), (0, 3));
    assert_eq!(history[0].changed_by, ACTOR);
}

#[tokio::test]
async fn unknown_category_rolls_back_the_plant() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let mut d = draft("Yarrow", 4, 1);
    d.category_ids = vec![999];
    let err = db.create_plant(&d, ACTOR).await.unwrap_err();
    assert_eq!(StoreError::classify(&err), Some(StoreError::UnknownReference));
    assert!(db.list_plants().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let mut d = draft("Thyme", 4, 1);
    d.sku = Some("HRB-1".into());
    db.create_plant(&d, ACTOR).await.unwrap();
    let err = db.create_plant(&d, ACTOR).await.unwrap_err();
    let classified = StoreError::classify(&err).unwrap();
    assert!(classified.is_conflict());
    assert_eq!(classified.to_string(), "A plant with this name or SKU already exists.");
}

#[tokio::test]
async fn negative_quantity_hits_check_constraint() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let err = db.create_plant(&draft("Rue", -1, 1), ACTOR).await.unwrap_err();
    assert_eq!(
        StoreError::classify(&err),
        Some(StoreError::Constraint("Quantity cannot be negative.".into()))
    );
}

#[tokio::test]
async fn categories_prefer_junction_then_legacy() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let herbs = db.add_category("Herbs").await.unwrap();
    let medicinal = db.add_category("Medicinal").await.unwrap();

    let mut d = draft("Chamomile", 9, 2);
    d.category_ids = vec![medicinal, herbs];
    let id = db.create_plant(&d, ACTOR).await.unwrap();
    let plant = db.get_plant(id).await.unwrap().unwrap();
    assert_eq!(plant.category_id, Some(medicinal));
    let names: Vec<_> = db
        .categories_for_plant(id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Herbs", "Medicinal"]);

    // Legacy row: no junction entries, only the old column.
    sqlx::query("DELETE FROM plant_categories WHERE plant_id = ?1")
        .bind(id)
        .execute(&db.pool)
        .await
        .unwrap();
    let cats = db.categories_for_plant(id).await.unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].id, medicinal);
}

#[tokio::test]
async fn update_replaces_categories_and_logs_quantity_change() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let a = db.add_category("A").await.unwrap();
    let b = db.add_category("B").await.unwrap();
    let mut d = draft("Sage", 10, 2);
    d.category_ids = vec![a];
    d.image_url = Some("http://x/plant-images/plants/old.jpg".into());
    let id = db.create_plant(&d, ACTOR).await.unwrap();

    d.category_ids = vec![b];
    d.quantity = 0;
    d.image_url = None;
    let outcome = db.update_plant(id, &d, ACTOR).await.unwrap();
    assert_eq!(outcome.previous_quantity, 10);
    assert_eq!(
        outcome.previous_image_url.as_deref(),
        Some("http://x/plant-images/plants/old.jpg")
    );

    let plant = db.get_plant(id).await.unwrap().unwrap();
    assert_eq!(plant.status, StockStatus::OutOfStock);
    assert_eq!(plant.category_id, Some(b));
    assert_eq!(db.categories_for_plant(id).await.unwrap()[0].id, b);

    let history = db.history_for_plant(id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].change_type, ChangeType::Adjustment);
    assert_eq!(history[0].quantity_change, -10);

    // Same quantity again: no new history row.
    db.update_plant(id, &d, ACTOR).await.unwrap();
    assert_eq!(db.history_for_plant(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_missing_plant_is_not_found() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let err = db.update_plant(42, &draft("Ghost", 1, 1), ACTOR).await.unwrap_err();
    assert!(StoreError::classify(&err).unwrap().is_not_found());
}

#[tokio::test]
async fn adjustments_update_status_and_reject_negative() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let id = db.create_plant(&draft("Mint", 2, 5), ACTOR).await.unwrap();

    let restock = InventoryAdjustment {
        change_type: ChangeType::Restock,
        quantity_change: 10,
        reason: Some("Spring order".into()),
        reference_number: Some("PO-7".into()),
    };
    let entry = db.adjust_quantity(id, &restock, ACTOR).await.unwrap();
    assert_eq!((entry.quantity_before, entry.quantity_after), (2, 12));
    assert_eq!(entry.reference_number.as_deref(), Some("PO-7"));
    let plant = db.get_plant(id).await.unwrap().unwrap();
    assert_eq!(plant.status, StockStatus::Available);
    assert!(plant.last_restocked.is_some());

    let sale = InventoryAdjustment {
        change_type: ChangeType::Sale,
        quantity_change: -13,
        reason: None,
        reference_number: None,
    };
    let err = db.adjust_quantity(id, &sale, ACTOR).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<AdjustError>(),
        Some(&AdjustError::NegativeResult { current: 12, change: -13 })
    );
    assert_eq!(db.get_plant(id).await.unwrap().unwrap().quantity, 12);
    assert_eq!(db.history_for_plant(id).await.unwrap().len(), 2);

    let missing = db.adjust_quantity(777, &restock, ACTOR).await.unwrap_err();
    assert_eq!(missing.downcast_ref::<AdjustError>(), Some(&AdjustError::PlantNotFound(777)));
}

#[tokio::test]
async fn adjustment_past_i64_range_is_rejected() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let id = db.create_plant(&draft("Moringa", 5, 1), ACTOR).await.unwrap();
    let huge = InventoryAdjustment {
        change_type: ChangeType::Restock,
        quantity_change: i64::MAX,
        reason: None,
        reference_number: None,
    };
    let err = db.adjust_quantity(id, &huge, ACTOR).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<AdjustError>(),
        Some(&AdjustError::OutOfRange { current: 5, change: i64::MAX })
    );
    let plant = db.get_plant(id).await.unwrap().unwrap();
    assert_eq!(plant.quantity, 5);
    assert!(plant.last_restocked.is_none());
    assert_eq!(db.history_for_plant(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_returns_row_and_cascades() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let cat = db.add_category("Trees").await.unwrap();
    let mut d = draft("Neem", 1, 1);
    d.category_ids = vec![cat];
    let id = db.create_plant(&d, ACTOR).await.unwrap();

    let removed = db.delete_plant(id).await.unwrap().unwrap();
    assert_eq!(removed.common_name, "Neem");
    assert!(db.get_plant(id).await.unwrap().is_none());
    assert!(db.history_for_plant(id).await.unwrap().is_empty());
    assert!(db.category_ids_by_plant().await.unwrap().is_empty());
    assert!(db.delete_plant(id).await.unwrap().is_none());
}

#[tokio::test]
async fn search_filters_sorts_and_counts() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let herbs = db.add_category("Herbs").await.unwrap();
    for (name, family) in [
        ("Basil", "Lamiaceae"),
        ("Mint", "Lamiaceae"),
        ("Peppermint", "Lamiaceae"),
        ("Aloe", "Asphodelaceae"),
    ] {
        let mut d = draft(name, 5, 1);
        d.family = Some(family.into());
        if name.contains("int") {
            d.category_ids = vec![herbs];
        }
        db.create_plant(&d, ACTOR).await.unwrap();
    }

    let (page, total) = db.search_plants(&query(), 2, 0).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(
        page.iter().map(|p| p.common_name.as_str()).collect::<Vec<_>>(),
        vec!["Aloe", "Basil"]
    );

    let q = ListingQuery {
        search: Some("MINT".into()),
        sort: ListingSort::NameDesc,
        ..query()
    };
    let (page, total) = db.search_plants(&q, 12, 0).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(page[0].common_name, "Peppermint");

    let q = ListingQuery {
        family: Some("lamiaceae".into()),
        category: Some(herbs),
        ..query()
    };
    let (_, total) = db.search_plants(&q, 12, 0).await.unwrap();
    assert_eq!(total, 2);

    assert_eq!(
        db.list_families().await.unwrap(),
        vec!["Asphodelaceae".to_string(), "Lamiaceae".to_string()]
    );
}

#[tokio::test]
async fn featured_plants_are_limited() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    for i in 0..5 {
        let mut d = draft(&format!("Plant {i}"), 1, 1);
        d.is_featured = i % 2 == 0;
        db.create_plant(&d, ACTOR).await.unwrap();
    }
    assert_eq!(db.featured_plants(2).await.unwrap().len(), 2);
    assert_eq!(db.featured_plants(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn reports_use_derived_status() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    let herbs = db.add_category("Herbs").await.unwrap();
    let mut a = draft("Basil", 3, 5);
    a.category_ids = vec![herbs];
    a.unit_price = Some(2.5);
    a.location = Some("Greenhouse".into());
    db.create_plant(&a, ACTOR).await.unwrap();
    let mut b = draft("Aloe", 0, 1);
    b.location = Some("Greenhouse".into());
    db.create_plant(&b, ACTOR).await.unwrap();
    let mut c = draft("Fern", 20, 5);
    c.unit_price = Some(1.0);
    c.location = Some("Shade house".into());
    db.create_plant(&c, ACTOR).await.unwrap();

    let low = db.low_stock_plants().await.unwrap();
    assert_eq!(low.len(), 2);
    assert_eq!(low[0].common_name, "Basil");
    assert_eq!(low[0].shortage, 2);
    assert_eq!(low[0].category_name.as_deref(), Some("Herbs"));
    assert_eq!(low[1].status, StockStatus::OutOfStock);

    let stats = db.inventory_stats().await.unwrap();
    assert_eq!(stats.total_plants, 3);
    assert_eq!(stats.total_quantity, 23);
    assert!((stats.total_value - 27.5).abs() < 1e-9);
    assert_eq!(
        (stats.available_count, stats.low_stock_count, stats.out_of_stock_count),
        (1, 1, 1)
    );
    assert_eq!(stats.unique_locations, 2);

    let summary = db.inventory_summary().await.unwrap();
    let names: Vec<_> = summary.iter().map(|s| s.category_name.as_str()).collect();
    assert_eq!(names, vec!["Herbs", UNCATEGORIZED]);
    assert_eq!(summary[1].total_plants, 2);
    assert_eq!(summary[1].available_quantity, 20);
    assert_eq!(summary[1].out_of_stock_count, 1);
}

#[tokio::test]
async fn admin_rows_are_case_insensitive() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    db.grant_admin("Ana@Example.org").await.unwrap();
    db.grant_admin("ana@example.org").await.unwrap();
    assert_eq!(db.count_admin_rows("ANA@example.ORG").await.unwrap(), 1);
    assert_eq!(db.list_admins().await.unwrap().len(), 1);
    assert!(db.revoke_admin("ana@example.org").await.unwrap());
    assert_eq!(db.count_admin_rows("ana@example.org").await.unwrap(), 0);
    assert!(db.grant_admin("not-an-email").await.is_err());
}

#[tokio::test]
async fn duplicate_category_is_a_conflict() {
    let db = InventoryDb::open_in_memory().await.unwrap();
    db.add_category("Herbs").await.unwrap();
    let err = db.add_category("Herbs").await.unwrap_err();
    assert_eq!(
        StoreError::classify(&err),
        Some(StoreError::AlreadyExists("Category already exists."))
    );
    assert!(db.remove_category(1).await.unwrap());
    assert!(!db.remove_category(1).await.unwrap());
}
