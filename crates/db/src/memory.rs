//! In-process [`Store`](crate::store::Store) with the same rules as the MySQL
//! store.
//!
//! All state lives behind one mutex. Every write runs against a copy of the
//! state which replaces the original only when the whole operation succeeds,
//! so a failure half-way through a movement leaves nothing behind.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use almacen_core::alert::{self, AlertAction, AlertKind, STATE_ACTIVE, STATE_CLOSED};
use almacen_core::error::CoreError;
use almacen_core::movement::{Direction, MovementLine, MovementState};
use almacen_core::reservation::{self, ReservationState};
use almacen_core::stock::StockLevel;
use almacen_core::types::{Date, DbId, Quantity, Timestamp};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::alert::{AlertDetail, AlertFilter};
use crate::models::catalog::{Category, Client, Location, NamedEntry};
use crate::models::material::{Material, MaterialChanges, MaterialFilter, MaterialRefs, NewMaterial};
use crate::models::movement::{
    GeneratedOutbound, NewInbound, NewOutbound, PendingInbound, PendingOutbound,
};
use crate::models::report::{
    AlertCounters, CategoryStock, Dashboard, HistoryEntry, HistoryFilter, HistoryTotal,
    MovementsToday, Notifications, PendingApprovals, StockTotals,
};
use crate::models::reservation::{
    NewReservation, NewReservationLine, Reservation, ReservationDetail, ReservationLine,
    ReservationSummary,
};
use crate::models::user::{AccessLevel, NewUser, User, UserChanges, UserProfile};
use crate::store::{
    AlertStore, CatalogStore, MaterialStore, MovementStore, ReportStore, ReservationStore,
    UserStore,
};
use crate::StoreResult;

const SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone)]
struct MaterialRecord {
    description: String,
    unit: String,
    color: Option<String>,
    notes: Option<String>,
    stock: StockLevel,
    image_url: Option<String>,
    internal_code: bool,
    refs: MaterialRefs,
    active: bool,
}

#[derive(Debug, Clone)]
struct InboundRecord {
    work_order: String,
    date: Date,
    supplier_id: DbId,
    client_id: Option<DbId>,
    state: MovementState,
    lines: Vec<MovementLine>,
}

#[derive(Debug, Clone)]
struct OutboundRecord {
    work_order: String,
    date: Date,
    quotation: Option<String>,
    client_id: DbId,
    reservation_id: Option<DbId>,
    state: MovementState,
    lines: Vec<MovementLine>,
}

#[derive(Debug, Clone)]
struct HeldLine {
    quantity: Quantity,
    notes: Option<String>,
    alert: bool,
}

#[derive(Debug, Clone)]
struct ReservationRecord {
    work_order: Option<String>,
    date: Date,
    quotation: Option<String>,
    client_id: DbId,
    state: ReservationState,
    converted: bool,
    lines: BTreeMap<String, HeldLine>,
}

#[derive(Debug, Clone)]
struct AlertRecord {
    material_code: String,
    kind: AlertKind,
    active: bool,
    seen: bool,
    created_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    categories: BTreeMap<DbId, Category>,
    locations: BTreeMap<DbId, Location>,
    brands: BTreeMap<DbId, NamedEntry>,
    suppliers: BTreeMap<DbId, NamedEntry>,
    clients: BTreeMap<DbId, Client>,
    access_levels: Vec<AccessLevel>,
    users: BTreeMap<String, User>,
    materials: BTreeMap<String, MaterialRecord>,
    inbound: BTreeMap<DbId, InboundRecord>,
    outbound: BTreeMap<DbId, OutboundRecord>,
    reservations: BTreeMap<DbId, ReservationRecord>,
    alerts: BTreeMap<DbId, AlertRecord>,
}

/// Next auto-increment key of a table.
fn next_id<V>(table: &BTreeMap<DbId, V>) -> DbId {
    table.keys().next_back().map_or(1, |last| last + 1)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn ensure_unique_name<'a>(
    mut names: impl Iterator<Item = &'a str>,
    name: &str,
    entity: &str,
) -> Result<(), CoreError> {
    if names.any(|existing| existing == name) {
        return Err(CoreError::Conflict(format!("{entity} '{name}' already exists")));
    }
    Ok(())
}

fn ensure_ref<V>(
    table: &BTreeMap<DbId, V>,
    id: Option<DbId>,
    field: &str,
) -> Result<(), CoreError> {
    match id {
        Some(id) if !table.contains_key(&id) => {
            Err(CoreError::Validation(format!("Unknown {field} {id}")))
        }
        _ => Ok(()),
    }
}

impl MemoryState {
    fn check_refs(&self, refs: &MaterialRefs) -> Result<(), CoreError> {
        ensure_ref(&self.categories, refs.category_id, "categoria")?;
        ensure_ref(&self.locations, refs.location_id, "ubicacion")?;
        ensure_ref(&self.brands, refs.brand_id, "marca")?;
        ensure_ref(&self.suppliers, refs.supplier_id, "proveedor")
    }

    fn material_view(&self, code: &str, record: &MaterialRecord) -> Material {
        let refs = &record.refs;
        Material {
            code: code.to_string(),
            description: record.description.clone(),
            unit: record.unit.clone(),
            color: record.color.clone(),
            notes: record.notes.clone(),
            stock_current: record.stock.current,
            stock_minimum: record.stock.minimum,
            stock_reserved: record.stock.reserved,
            image_url: record.image_url.clone(),
            internal_code: record.internal_code,
            category_id: refs.category_id,
            category_name: refs
                .category_id
                .and_then(|id| self.categories.get(&id))
                .map(|c| c.name.clone()),
            location_id: refs.location_id,
            location_name: refs
                .location_id
                .and_then(|id| self.locations.get(&id))
                .map(|l| l.name.clone()),
            brand_id: refs.brand_id,
            brand_name: refs
                .brand_id
                .and_then(|id| self.brands.get(&id))
                .map(|b| b.name.clone()),
            supplier_id: refs.supplier_id,
            supplier_name: refs
                .supplier_id
                .and_then(|id| self.suppliers.get(&id))
                .map(|s| s.name.clone()),
        }
    }

    fn active_materials(&self) -> impl Iterator<Item = (&String, &MaterialRecord)> {
        self.materials.iter().filter(|(_, m)| m.active)
    }

    fn find_material(&self, code: &str) -> Result<Material, CoreError> {
        self.materials
            .get(code)
            .filter(|m| m.active)
            .map(|m| self.material_view(code, m))
            .ok_or_else(|| CoreError::not_found("Material", code))
    }

    fn stock_of(&self, code: &str, require_active: bool) -> Result<StockLevel, CoreError> {
        self.materials
            .get(code)
            .filter(|m| m.active || !require_active)
            .map(|m| m.stock)
            .ok_or_else(|| CoreError::not_found("Material", code))
    }

    /// Transform a material's counters, then bring its alert in line.
    fn apply_stock<F>(
        &mut self,
        code: &str,
        require_active: bool,
        change: F,
    ) -> Result<StockLevel, CoreError>
    where
        F: FnOnce(StockLevel) -> Result<StockLevel, CoreError>,
    {
        let next = change(self.stock_of(code, require_active)?)?;
        if let Some(material) = self.materials.get_mut(code) {
            material.stock = next;
        }
        self.sync_alert(code, &next);
        Ok(next)
    }

    fn sync_alert(&mut self, code: &str, level: &StockLevel) {
        let active = self
            .alerts
            .iter()
            .rev()
            .find(|(_, a)| a.active && a.material_code == code)
            .map(|(id, a)| (*id, a.kind));

        match alert::sync(level, active.map(|(_, kind)| kind)) {
            AlertAction::Keep => {}
            AlertAction::Open(kind) => {
                let id = next_id(&self.alerts);
                self.alerts.insert(
                    id,
                    AlertRecord {
                        material_code: code.to_string(),
                        kind,
                        active: true,
                        seen: false,
                        created_at: Utc::now(),
                    },
                );
            }
            AlertAction::Retype(kind) => {
                if let Some(alert) = active.and_then(|(id, _)| self.alerts.get_mut(&id)) {
                    alert.kind = kind;
                    alert.seen = false;
                }
            }
            AlertAction::Close => self.close_alerts_for(code),
        }
    }

    fn close_alerts_for(&mut self, code: &str) {
        for alert in self.alerts.values_mut() {
            if alert.material_code == code {
                alert.active = false;
            }
        }
    }

    fn ensure_client(&self, id: DbId) -> Result<(), CoreError> {
        if !self.clients.contains_key(&id) {
            return Err(CoreError::not_found("Cliente", id));
        }
        Ok(())
    }

    fn reservation_taken(&self, reservation_id: DbId) -> bool {
        self.outbound
            .values()
            .any(|s| s.reservation_id == Some(reservation_id))
    }

    /// Holds of a reservation that an outbound movement is about to take over.
    fn takeover_holds(&self, id: DbId) -> Result<BTreeMap<String, Quantity>, CoreError> {
        let record = self
            .reservations
            .get(&id)
            .ok_or_else(|| CoreError::not_found("Apartado", id))?;
        reservation::ensure_convertible(record.state, record.converted, record.lines.len())?;
        if self.reservation_taken(id) {
            return Err(reservation::already_generated());
        }
        Ok(record
            .lines
            .iter()
            .map(|(code, line)| (code.clone(), line.quantity))
            .collect())
    }

    fn reservation_mut(&mut self, id: DbId) -> Result<&mut ReservationRecord, CoreError> {
        self.reservations
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("Apartado", id))
    }

    fn reservation_header(&self, id: DbId, record: &ReservationRecord) -> Reservation {
        Reservation {
            id,
            work_order: record.work_order.clone(),
            date: record.date,
            quotation: record.quotation.clone(),
            client_id: record.client_id,
            client_name: self.clients.get(&record.client_id).map(|c| c.legal_name.clone()),
            state: record.state.code().to_string(),
            converted: record.converted,
        }
    }

    fn history(&self) -> Vec<HistoryEntry> {
        let description = |code: &str| {
            self.materials
                .get(code)
                .map(|m| m.description.clone())
                .unwrap_or_default()
        };
        let inbound = self.inbound.iter().flat_map(|(id, e)| {
            e.lines.iter().map(move |l| (Direction::Inbound, *id, e.work_order.clone(), e.date, l, e.state))
        });
        let outbound = self.outbound.iter().flat_map(|(id, s)| {
            s.lines.iter().map(move |l| (Direction::Outbound, *id, s.work_order.clone(), s.date, l, s.state))
        });
        inbound
            .chain(outbound)
            .map(|(kind, id, work_order, date, line, state)| HistoryEntry {
                kind: kind.code().to_string(),
                movement_id: id,
                work_order: Some(work_order),
                date,
                material_code: line.material_code.clone(),
                description: description(&line.material_code),
                quantity: line.quantity,
                state: state.code().to_string(),
            })
            .collect()
    }
}

/// A [`Store`](crate::store::Store) kept entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store with the standard access levels.
    pub fn new() -> Self {
        let state = MemoryState {
            access_levels: vec![
                AccessLevel {
                    code: "ADM".into(),
                    name: "Administrador".into(),
                },
                AccessLevel {
                    code: "ALM".into(),
                    name: "Almacenista".into(),
                },
                AccessLevel {
                    code: "CON".into(),
                    name: "Consulta".into(),
                },
            ],
            ..MemoryState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Add a category (categories have no HTTP create route).
    pub fn seed_category(&self, name: &str) -> StoreResult<DbId> {
        self.write(|state| {
            ensure_unique_name(state.categories.values().map(|c| c.name.as_str()), name, "Categoria")?;
            let id = next_id(&state.categories);
            state.categories.insert(
                id,
                Category {
                    id,
                    name: name.to_string(),
                },
            );
            Ok(id)
        })
    }

    /// Add a location (locations have no HTTP create route).
    pub fn seed_location(&self, name: &str, color: Option<&str>) -> StoreResult<DbId> {
        self.write(|state| {
            ensure_unique_name(state.locations.values().map(|l| l.name.as_str()), name, "Ubicacion")?;
            let id = next_id(&state.locations);
            state.locations.insert(
                id,
                Location {
                    id,
                    name: name.to_string(),
                    color: color.map(str::to_string),
                },
            );
            Ok(id)
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Internal("Memory store lock poisoned".into()))
    }

    fn read<T>(&self, op: impl FnOnce(&MemoryState) -> T) -> StoreResult<T> {
        let guard = self.lock()?;
        Ok(op(&guard))
    }

    /// Run `op` on a copy of the state; keep the copy only if `op` succeeds.
    fn write<T>(
        &self,
        op: impl FnOnce(&mut MemoryState) -> Result<T, CoreError>,
    ) -> StoreResult<T> {
        let mut guard = self.lock()?;
        let mut draft = guard.clone();
        let out = op(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl MaterialStore for MemoryStore {
    async fn list_materials(&self, filter: &MaterialFilter) -> StoreResult<Vec<Material>> {
        self.read(|state| {
            let mut rows: Vec<Material> = state
                .active_materials()
                .filter(|(_, m)| {
                    filter
                        .description
                        .as_deref()
                        .map_or(true, |d| contains_ci(&m.description, d))
                })
                .filter(|(_, m)| {
                    filter
                        .category_id
                        .map_or(true, |c| m.refs.category_id == Some(c))
                })
                .map(|(code, m)| state.material_view(code, m))
                .collect();
            rows.sort_by(|a, b| (&a.description, &a.code).cmp(&(&b.description, &b.code)));
            rows
        })
    }

    async fn search_materials(&self, term: &str) -> StoreResult<Vec<Material>> {
        self.read(|state| {
            let mut rows: Vec<Material> = state
                .active_materials()
                .filter(|(code, m)| contains_ci(code, term) || contains_ci(&m.description, term))
                .map(|(code, m)| state.material_view(code, m))
                .collect();
            rows.sort_by(|a, b| (&a.description, &a.code).cmp(&(&b.description, &b.code)));
            rows.truncate(SEARCH_LIMIT);
            rows
        })
    }

    async fn create_material(&self, input: NewMaterial) -> StoreResult<Material> {
        self.write(|state| {
            let level = StockLevel::new(0, 0, 0)
                .with_minimum(input.stock_minimum)?
                .adjust_current(input.stock_current)?;
            if state.materials.contains_key(&input.code) {
                return Err(CoreError::Conflict(format!(
                    "Material {} already exists",
                    input.code
                )));
            }
            state.check_refs(&input.refs)?;

            state.materials.insert(
                input.code.clone(),
                MaterialRecord {
                    description: input.description,
                    unit: input.unit,
                    color: input.color,
                    notes: input.notes,
                    stock: level,
                    image_url: input.image_url,
                    internal_code: input.internal_code,
                    refs: input.refs,
                    active: true,
                },
            );
            state.sync_alert(&input.code, &level);
            state.find_material(&input.code)
        })
    }

    async fn update_material(
        &self,
        code: &str,
        changes: MaterialChanges,
    ) -> StoreResult<Material> {
        self.write(|state| {
            let current = state.stock_of(code, true)?;
            let next = current
                .with_minimum(changes.stock_minimum)?
                .adjust_current(changes.stock_current)?;
            state.check_refs(&changes.refs)?;

            if let Some(material) = state.materials.get_mut(code) {
                material.description = changes.description;
                material.unit = changes.unit;
                material.color = changes.color;
                material.notes = changes.notes;
                material.image_url = changes.image_url;
                material.refs = changes.refs;
                material.stock = next;
            }
            state.sync_alert(code, &next);
            state.find_material(code)
        })
    }

    async fn deactivate_material(&self, code: &str) -> StoreResult<()> {
        self.write(|state| {
            let level = state.stock_of(code, true)?;
            if level.reserved > 0 {
                return Err(CoreError::InvalidState(format!(
                    "Material {code} has {} reserved units",
                    level.reserved
                )));
            }
            if let Some(material) = state.materials.get_mut(code) {
                material.active = false;
            }
            state.close_alerts_for(code);
            Ok(())
        })
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.read(|state| {
            let mut rows: Vec<Category> = state.categories.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        self.read(|state| {
            let mut rows: Vec<Location> = state.locations.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    async fn list_brands(&self) -> StoreResult<Vec<NamedEntry>> {
        self.read(|state| {
            let mut rows: Vec<NamedEntry> = state.brands.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    async fn create_brand(&self, name: &str) -> StoreResult<NamedEntry> {
        self.write(|state| {
            ensure_unique_name(state.brands.values().map(|b| b.name.as_str()), name, "Marca")?;
            let entry = NamedEntry {
                id: next_id(&state.brands),
                name: name.to_string(),
            };
            state.brands.insert(entry.id, entry.clone());
            Ok(entry)
        })
    }

    async fn list_suppliers(&self) -> StoreResult<Vec<NamedEntry>> {
        self.read(|state| {
            let mut rows: Vec<NamedEntry> = state.suppliers.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    async fn create_supplier(&self, name: &str) -> StoreResult<NamedEntry> {
        self.write(|state| {
            ensure_unique_name(state.suppliers.values().map(|s| s.name.as_str()), name, "Proveedor")?;
            let entry = NamedEntry {
                id: next_id(&state.suppliers),
                name: name.to_string(),
            };
            state.suppliers.insert(entry.id, entry.clone());
            Ok(entry)
        })
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        self.read(|state| {
            let mut rows: Vec<Client> = state.clients.values().cloned().collect();
            rows.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
            rows
        })
    }

    async fn get_client(&self, id: DbId) -> StoreResult<Client> {
        self.read(|state| state.clients.get(&id).cloned())?
            .ok_or_else(|| CoreError::not_found("Cliente", id).into())
    }

    async fn create_client(&self, legal_name: &str) -> StoreResult<Client> {
        self.write(|state| {
            ensure_unique_name(
                state.clients.values().map(|c| c.legal_name.as_str()),
                legal_name,
                "Cliente",
            )?;
            let client = Client {
                id: next_id(&state.clients),
                legal_name: legal_name.to_string(),
            };
            state.clients.insert(client.id, client.clone());
            Ok(client)
        })
    }

    async fn update_client(&self, id: DbId, legal_name: &str) -> StoreResult<Client> {
        self.write(|state| {
            state.ensure_client(id)?;
            ensure_unique_name(
                state
                    .clients
                    .values()
                    .filter(|c| c.id != id)
                    .map(|c| c.legal_name.as_str()),
                legal_name,
                "Cliente",
            )?;
            let client = Client {
                id,
                legal_name: legal_name.to_string(),
            };
            state.clients.insert(id, client.clone());
            Ok(client)
        })
    }
}

#[async_trait]
impl MovementStore for MemoryStore {
    async fn register_inbound(&self, input: NewInbound) -> StoreResult<DbId> {
        self.write(|state| {
            if !state.suppliers.contains_key(&input.supplier_id) {
                return Err(CoreError::not_found("Proveedor", input.supplier_id));
            }
            if let Some(client_id) = input.client_id {
                state.ensure_client(client_id)?;
            }
            for line in &input.lines {
                state.stock_of(&line.material_code, true)?;
            }

            let id = next_id(&state.inbound);
            state.inbound.insert(
                id,
                InboundRecord {
                    work_order: input.work_order,
                    date: input.date,
                    supplier_id: input.supplier_id,
                    client_id: input.client_id,
                    state: MovementState::Pending,
                    lines: input.lines,
                },
            );
            Ok(id)
        })
    }

    async fn register_outbound(&self, input: NewOutbound) -> StoreResult<DbId> {
        self.write(|state| {
            state.ensure_client(input.client_id)?;
            let held = match input.reservation_id {
                Some(reservation_id) => state.takeover_holds(reservation_id)?,
                None => BTreeMap::new(),
            };
            for change in reservation::hold_changes(&held, &input.lines) {
                let (from, to) = (change.held, change.wanted);
                // Materials new to the hold must still be active.
                state.apply_stock(&change.material_code, from == 0, |level| {
                    level.rehold(from, to)
                })?;
            }
            if let Some(reservation_id) = input.reservation_id {
                state.reservation_mut(reservation_id)?.converted = true;
            }

            let id = next_id(&state.outbound);
            state.outbound.insert(
                id,
                OutboundRecord {
                    work_order: input.work_order,
                    date: input.date,
                    quotation: input.quotation,
                    client_id: input.client_id,
                    reservation_id: input.reservation_id,
                    state: MovementState::Pending,
                    lines: input.lines,
                },
            );
            Ok(id)
        })
    }

    async fn pending_inbound(&self) -> StoreResult<Vec<PendingInbound>> {
        self.read(|state| {
            let mut rows: Vec<PendingInbound> = state
                .inbound
                .iter()
                .filter(|(_, e)| e.state == MovementState::Pending)
                .map(|(id, e)| PendingInbound {
                    id: *id,
                    work_order: e.work_order.clone(),
                    date: e.date,
                    supplier_name: state.suppliers.get(&e.supplier_id).map(|s| s.name.clone()),
                    supplier_id: e.supplier_id,
                    client_id: e.client_id,
                    client_name: e
                        .client_id
                        .and_then(|c| state.clients.get(&c))
                        .map(|c| c.legal_name.clone()),
                    state: e.state.code().to_string(),
                    total_materials: e.lines.len() as i64,
                })
                .collect();
            rows.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
            rows
        })
    }

    async fn pending_outbound(&self) -> StoreResult<Vec<PendingOutbound>> {
        self.read(|state| {
            let mut rows: Vec<PendingOutbound> = state
                .outbound
                .iter()
                .filter(|(_, s)| s.state == MovementState::Pending)
                .map(|(id, s)| PendingOutbound {
                    id: *id,
                    work_order: s.work_order.clone(),
                    date: s.date,
                    quotation: s.quotation.clone(),
                    client_name: state.clients.get(&s.client_id).map(|c| c.legal_name.clone()),
                    reservation_id: s.reservation_id,
                    state: s.state.code().to_string(),
                    total_materials: s.lines.len() as i64,
                })
                .collect();
            rows.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
            rows
        })
    }

    async fn approve_inbound(&self, id: DbId) -> StoreResult<()> {
        self.write(|state| {
            let record = state
                .inbound
                .get_mut(&id)
                .ok_or_else(|| CoreError::not_found(Direction::Inbound.entity(), id))?;
            record.state = record.state.approve()?;
            let lines = record.lines.clone();

            for line in lines {
                state.apply_stock(&line.material_code, false, |level| {
                    level.receive(line.quantity)
                })?;
            }
            Ok(())
        })
    }

    async fn approve_outbound(&self, id: DbId) -> StoreResult<()> {
        self.write(|state| {
            let record = state
                .outbound
                .get_mut(&id)
                .ok_or_else(|| CoreError::not_found(Direction::Outbound.entity(), id))?;
            record.state = record.state.approve()?;
            let lines = record.lines.clone();

            for line in lines {
                state.apply_stock(&line.material_code, false, |level| {
                    level.ship_reserved(line.quantity)
                })?;
            }
            Ok(())
        })
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create_reservation(&self, input: NewReservation) -> StoreResult<DbId> {
        self.write(|state| {
            state.ensure_client(input.client_id)?;
            let id = next_id(&state.reservations);
            state.reservations.insert(
                id,
                ReservationRecord {
                    work_order: input.work_order,
                    date: input.date,
                    quotation: input.quotation,
                    client_id: input.client_id,
                    state: input.state,
                    converted: false,
                    lines: BTreeMap::new(),
                },
            );
            Ok(id)
        })
    }

    async fn list_reservations(&self) -> StoreResult<Vec<ReservationSummary>> {
        self.read(|state| {
            let mut rows: Vec<ReservationSummary> = state
                .reservations
                .iter()
                .map(|(id, r)| {
                    let header = state.reservation_header(*id, r);
                    ReservationSummary {
                        id: header.id,
                        work_order: header.work_order,
                        date: header.date,
                        quotation: header.quotation,
                        client_id: header.client_id,
                        client_name: header.client_name,
                        state: header.state,
                        converted: header.converted,
                        total_materials: r.lines.len() as i64,
                        total_quantity: r.lines.values().map(|l| i64::from(l.quantity)).sum(),
                    }
                })
                .collect();
            rows.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
            rows
        })
    }

    async fn get_reservation(&self, id: DbId) -> StoreResult<ReservationDetail> {
        self.read(|state| -> Result<ReservationDetail, CoreError> {
            let record = state
                .reservations
                .get(&id)
                .ok_or_else(|| CoreError::not_found("Apartado", id))?;
            let lines = record
                .lines
                .iter()
                .map(|(code, line)| {
                    let material = state.materials.get(code);
                    ReservationLine {
                        material_code: code.clone(),
                        quantity: line.quantity,
                        notes: line.notes.clone(),
                        alert: line.alert,
                        description: material.map(|m| m.description.clone()),
                        unit: material.map(|m| m.unit.clone()),
                        stock_current: material.map(|m| m.stock.current),
                        stock_reserved: material.map(|m| m.stock.reserved),
                    }
                })
                .collect();
            Ok(ReservationDetail {
                header: state.reservation_header(id, record),
                lines,
            })
        })?
        .map_err(Into::into)
    }

    async fn add_reservation_line(&self, id: DbId, line: NewReservationLine) -> StoreResult<()> {
        self.write(|state| {
            let record = state.reservation_mut(id)?;
            reservation::ensure_lines_mutable(record.state, record.converted)?;
            reservation::ensure_quantity(line.quantity)?;

            let quantity = line.quantity;
            state.apply_stock(&line.material_code, true, |level| level.reserve(quantity))?;

            let record = state.reservation_mut(id)?;
            let held = record
                .lines
                .entry(line.material_code)
                .or_insert(HeldLine {
                    quantity: 0,
                    notes: None,
                    alert: false,
                });
            held.quantity += quantity;
            if line.notes.is_some() {
                held.notes = line.notes;
            }
            held.alert = line.alert;
            Ok(())
        })
    }

    async fn remove_reservation_line(&self, id: DbId, material_code: &str) -> StoreResult<()> {
        self.write(|state| {
            let record = state.reservation_mut(id)?;
            reservation::ensure_lines_mutable(record.state, record.converted)?;
            let quantity = record
                .lines
                .get(material_code)
                .map(|l| l.quantity)
                .ok_or_else(|| CoreError::not_found("Material apartado", material_code))?;

            state.apply_stock(material_code, false, |level| level.release(quantity))?;
            state.reservation_mut(id)?.lines.remove(material_code);
            Ok(())
        })
    }

    async fn convert_reservation(&self, id: DbId, date: Date) -> StoreResult<DbId> {
        self.write(|state| {
            let record = state
                .reservations
                .get(&id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("Apartado", id))?;
            reservation::ensure_convertible(record.state, record.converted, record.lines.len())?;

            for (code, line) in &record.lines {
                state.stock_of(code, false)?.ensure_reserved(line.quantity)?;
            }
            if state.reservation_taken(id) {
                return Err(reservation::already_generated());
            }

            let outbound_id = next_id(&state.outbound);
            state.outbound.insert(
                outbound_id,
                OutboundRecord {
                    work_order: record.work_order.clone().unwrap_or_default(),
                    date,
                    quotation: record.quotation.clone(),
                    client_id: record.client_id,
                    reservation_id: Some(id),
                    state: MovementState::Pending,
                    lines: record
                        .lines
                        .iter()
                        .map(|(code, line)| MovementLine {
                            material_code: code.clone(),
                            quantity: line.quantity,
                            notes: line.notes.clone(),
                        })
                        .collect(),
                },
            );
            state.reservation_mut(id)?.converted = true;
            Ok(outbound_id)
        })
    }

    async fn generated_outbound(&self, id: DbId) -> StoreResult<GeneratedOutbound> {
        self.read(|state| {
            state
                .outbound
                .iter()
                .find(|(_, s)| s.reservation_id == Some(id))
                .map(|(outbound_id, s)| GeneratedOutbound {
                    id: *outbound_id,
                    date: s.date,
                    state: s.state.code().to_string(),
                    total_materials: s.lines.len() as i64,
                })
        })?
        .ok_or_else(|| CoreError::not_found("Salida generada para apartado", id).into())
    }

    async fn update_reservation_state(
        &self,
        id: DbId,
        next: ReservationState,
    ) -> StoreResult<()> {
        self.write(|state| {
            let record = state.reservation_mut(id)?;
            let change = reservation::transition(record.state, next, record.converted)?;
            record.state = change.next;
            let lines = record.lines.clone();

            if change.release_holds {
                for (code, line) in lines {
                    state.apply_stock(&code, false, |level| level.release(line.quantity))?;
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn list_alerts(&self, filter: &AlertFilter) -> StoreResult<Vec<AlertDetail>> {
        self.read(|state| {
            let mut rows: Vec<AlertDetail> = state
                .alerts
                .iter()
                .filter_map(|(id, a)| {
                    let material = state.materials.get(&a.material_code)?;
                    let state_code = if a.active { STATE_ACTIVE } else { STATE_CLOSED };
                    Some(AlertDetail {
                        id: *id,
                        material_code: a.material_code.clone(),
                        description: material.description.clone(),
                        stock_current: material.stock.current,
                        stock_minimum: material.stock.minimum,
                        kind: a.kind.code().to_string(),
                        state: state_code.to_string(),
                        seen: a.seen,
                        created_at: a.created_at,
                    })
                })
                .filter(|a| filter.kind.as_deref().map_or(true, |k| a.kind == k))
                .filter(|a| filter.state.as_deref().map_or(true, |s| a.state == s))
                .filter(|a| filter.seen.map_or(true, |v| a.seen == v))
                .collect();
            rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            rows
        })
    }

    async fn mark_alert_seen(&self, id: DbId) -> StoreResult<()> {
        self.write(|state| {
            let alert = state
                .alerts
                .get_mut(&id)
                .ok_or_else(|| CoreError::not_found("Alerta", id))?;
            alert.seen = true;
            Ok(())
        })
    }

    async fn close_alert(&self, id: DbId) -> StoreResult<()> {
        self.write(|state| {
            let alert = state
                .alerts
                .get_mut(&id)
                .ok_or_else(|| CoreError::not_found("Alerta", id))?;
            alert.active = false;
            Ok(())
        })
    }

    async fn average_stock(&self) -> StoreResult<f64> {
        self.read(|state| {
            let (count, sum) = state
                .active_materials()
                .fold((0u32, 0f64), |(n, s), (_, m)| (n + 1, s + f64::from(m.stock.current)));
            if count == 0 {
                0.0
            } else {
                sum / f64::from(count)
            }
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        self.read(|state| state.users.get(username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserProfile>> {
        self.read(|state| {
            let mut rows: Vec<UserProfile> = state.users.values().map(UserProfile::from).collect();
            rows.sort_by(|a, b| {
                (&a.first_name, &a.paternal_surname).cmp(&(&b.first_name, &b.paternal_surname))
            });
            rows
        })
    }

    async fn create_user(&self, input: NewUser) -> StoreResult<UserProfile> {
        self.write(|state| {
            if state.users.contains_key(&input.username) {
                return Err(CoreError::Conflict(format!(
                    "User {} already exists",
                    input.username
                )));
            }
            if !state.access_levels.iter().any(|a| a.code == input.access_code) {
                return Err(CoreError::Validation(format!(
                    "Unknown access level {}",
                    input.access_code
                )));
            }
            let user = User {
                username: input.username,
                password_hash: input.password_hash,
                first_name: input.first_name,
                paternal_surname: input.paternal_surname,
                maternal_surname: input.maternal_surname,
                access_code: input.access_code,
            };
            let profile = UserProfile::from(&user);
            state.users.insert(user.username.clone(), user);
            Ok(profile)
        })
    }

    async fn update_user(&self, username: &str, changes: UserChanges) -> StoreResult<UserProfile> {
        self.write(|state| {
            if let Some(code) = &changes.access_code {
                if !state.access_levels.iter().any(|a| &a.code == code) {
                    return Err(CoreError::Validation(format!("Unknown access level {code}")));
                }
            }
            let user = state
                .users
                .get_mut(username)
                .ok_or_else(|| CoreError::not_found("Usuario", username))?;
            if let Some(hash) = changes.password_hash {
                user.password_hash = hash;
            }
            if let Some(v) = changes.first_name {
                user.first_name = v;
            }
            if let Some(v) = changes.paternal_surname {
                user.paternal_surname = v;
            }
            if let Some(v) = changes.maternal_surname {
                user.maternal_surname = v;
            }
            if let Some(v) = changes.access_code {
                user.access_code = v;
            }
            Ok(UserProfile::from(&*user))
        })
    }

    async fn delete_user(&self, username: &str) -> StoreResult<()> {
        self.write(|state| {
            state
                .users
                .remove(username)
                .map(|_| ())
                .ok_or_else(|| CoreError::not_found("Usuario", username))
        })
    }

    async fn list_access_levels(&self) -> StoreResult<Vec<AccessLevel>> {
        self.read(|state| state.access_levels.clone())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read(|_| ())
    }

    async fn notifications(&self) -> StoreResult<Notifications> {
        self.read(|state| Notifications {
            active_alerts: state.alerts.values().filter(|a| a.active).count() as i64,
            pending_inbound: state
                .inbound
                .values()
                .filter(|e| e.state == MovementState::Pending)
                .count() as i64,
            pending_outbound: state
                .outbound
                .values()
                .filter(|s| s.state == MovementState::Pending)
                .count() as i64,
        })
    }

    async fn stock_totals(&self) -> StoreResult<StockTotals> {
        self.read(|state| {
            let mut totals = StockTotals {
                material_count: 0,
                stock_total: 0,
                stock_available: 0,
            };
            for (_, m) in state.active_materials() {
                totals.material_count += 1;
                totals.stock_total += i64::from(m.stock.current);
                totals.stock_available += i64::from(m.stock.available());
            }
            totals
        })
    }

    async fn dashboard(&self, today: Date) -> StoreResult<Dashboard> {
        let totals = self.stock_totals().await?;
        let notifications = self.notifications().await?;
        self.read(|state| {
            let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
            for (_, m) in state.active_materials() {
                let name = m
                    .refs
                    .category_id
                    .and_then(|id| state.categories.get(&id))
                    .map_or_else(|| "Sin categoria".to_string(), |c| c.name.clone());
                *by_category.entry(name).or_default() += i64::from(m.stock.current);
            }

            let inbound = state.inbound.values().filter(|e| e.date == today).count() as i64;
            let outbound = state.outbound.values().filter(|s| s.date == today).count() as i64;

            Dashboard {
                totals,
                alerts: AlertCounters {
                    active: notifications.active_alerts,
                    unseen: state.alerts.values().filter(|a| a.active && !a.seen).count() as i64,
                },
                pending: PendingApprovals {
                    inbound: notifications.pending_inbound,
                    outbound: notifications.pending_outbound,
                },
                today: MovementsToday {
                    inbound,
                    outbound,
                    total: inbound + outbound,
                },
                stock_by_category: by_category
                    .into_iter()
                    .map(|(category, stock_total)| CategoryStock {
                        category,
                        stock_total,
                    })
                    .collect(),
            }
        })
    }

    async fn history(&self, filter: &HistoryFilter) -> StoreResult<Vec<HistoryEntry>> {
        self.read(|state| {
            let mut rows: Vec<HistoryEntry> = state
                .history()
                .into_iter()
                .filter(|h| {
                    filter.search.as_deref().map_or(true, |s| {
                        contains_ci(&h.material_code, s) || contains_ci(&h.description, s)
                    })
                })
                .filter(|h| filter.kind.as_deref().map_or(true, |k| h.kind == k))
                .filter(|h| {
                    filter
                        .range
                        .map_or(true, |(from, to)| h.date >= from && h.date <= to)
                })
                .collect();
            rows.sort_by(|a, b| {
                (b.date, b.movement_id)
                    .cmp(&(a.date, a.movement_id))
                    .then_with(|| a.material_code.cmp(&b.material_code))
            });
            rows
        })
    }

    async fn history_totals(&self) -> StoreResult<Vec<HistoryTotal>> {
        self.read(|state| {
            let mut totals: BTreeMap<String, (BTreeSet<DbId>, i64)> =
                BTreeMap::new();
            for entry in state.history() {
                let slot = totals.entry(entry.kind).or_default();
                slot.0.insert(entry.movement_id);
                slot.1 += i64::from(entry.quantity);
            }
            totals
                .into_iter()
                .map(|(kind, (movements, quantity))| HistoryTotal {
                    kind,
                    movements: movements.len() as i64,
                    quantity,
                })
                .collect()
        })
    }
}
