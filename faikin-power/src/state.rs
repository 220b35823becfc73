use crate::models::UnitsMap;
use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

/// Map partagée des unités; un seul verrou sérialise messages entrants et
/// réveils de deadlines (voir engine & hold).
pub type SharedUnits = Shared<UnitsMap>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
