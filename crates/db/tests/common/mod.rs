//! Fixtures shared by the MySQL store tests.

#![allow(dead_code)]

use almacen_core::movement::MovementLine;
use almacen_core::types::{Date, DbId, Quantity};
use almacen_db::models::material::{MaterialRefs, NewMaterial};
use almacen_db::models::movement::{NewInbound, NewOutbound};
use almacen_db::repositories::MySqlStore;
use almacen_db::store::{CatalogStore, MaterialStore};
use chrono::NaiveDate;
use sqlx::MySqlPool;

pub fn store(pool: MySqlPool) -> MySqlStore {
    MySqlStore::new(pool)
}

pub fn date() -> Date {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

pub fn line(code: &str, quantity: Quantity) -> MovementLine {
    MovementLine {
        material_code: code.to_string(),
        quantity,
        notes: None,
    }
}

pub struct Parties {
    pub supplier_id: DbId,
    pub client_id: DbId,
}

pub async fn seed_parties(store: &MySqlStore) -> Parties {
    let supplier = store.create_supplier("Aceros del Norte").await.unwrap();
    let client = store.create_client("Constructora Ruiz SA de CV").await.unwrap();
    Parties {
        supplier_id: supplier.id,
        client_id: client.id,
    }
}

pub async fn create_material(store: &MySqlStore, code: &str, current: Quantity, minimum: Quantity) {
    store
        .create_material(NewMaterial {
            code: code.to_string(),
            description: format!("Material {code}"),
            unit: "PZA".into(),
            color: None,
            notes: None,
            stock_current: current,
            stock_minimum: minimum,
            image_url: None,
            internal_code: false,
            refs: MaterialRefs::default(),
        })
        .await
        .unwrap();
}

/// `(stock_current, stock_reserved)` straight from the table.
pub async fn stock(pool: &MySqlPool, code: &str) -> (Quantity, Quantity) {
    sqlx::query_as("SELECT stock_current, stock_reserved FROM materials WHERE code = ?")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count(pool: &MySqlPool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

pub fn inbound(parties: &Parties, work_order: &str, lines: Vec<MovementLine>) -> NewInbound {
    NewInbound {
        work_order: work_order.to_string(),
        date: date(),
        supplier_id: parties.supplier_id,
        client_id: None,
        notes: None,
        lines,
    }
}

pub fn outbound(parties: &Parties, work_order: &str, lines: Vec<MovementLine>) -> NewOutbound {
    NewOutbound {
        work_order: work_order.to_string(),
        date: date(),
        quotation: None,
        client_id: parties.client_id,
        reservation_id: None,
        lines,
    }
}
