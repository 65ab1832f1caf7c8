//! # Route Dictionary
//!
//! Bidirectional route <-> code table consulted by the message codec.
//!
//! Both peers load the same dictionary (usually from configuration or from the
//! handshake response) so that a route such as `"user.login"` can travel as a
//! 2-byte code. Registration is first-wins and there is no removal, so a code
//! never changes meaning once traffic has used it.
//!
//! The table is guarded by an `RwLock` and meant to be shared as
//! `Arc<RouteTable>`; registering while traffic flows is safe.

use crate::error::{constants, ProtocolError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Entries {
    codes_by_route: HashMap<String, u16>,
    routes_by_code: HashMap<u16, String>,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: RwLock<Entries>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a route -> code mapping.
    pub fn from_dict<I, S>(routes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u16)>,
        S: Into<String>,
    {
        let table = Self::new();
        table.register(routes)?;
        Ok(table)
    }

    /// Register routes in iteration order.
    ///
    /// An entry is skipped when its route or its code is already registered,
    /// including by an earlier entry of the same call. Returns how many entries
    /// were inserted.
    pub fn register<I, S>(&self, routes: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, u16)>,
        S: Into<String>,
    {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ProtocolError::LockPoisoned(constants::ERR_ROUTE_TABLE_WRITE_LOCK))?;

        let mut inserted = 0;
        for (route, code) in routes {
            let route = route.into();
            if entries.codes_by_route.contains_key(&route)
                || entries.routes_by_code.contains_key(&code)
            {
                trace!(route = %route, code, "Route or code already registered, skipping");
                continue;
            }
            entries.routes_by_code.insert(code, route.clone());
            entries.codes_by_route.insert(route, code);
            inserted += 1;
        }

        debug!(inserted, total = entries.codes_by_route.len(), "Registered routes");
        Ok(inserted)
    }

    // Lookups never leave the maps half-updated, so a poisoned lock is still readable.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn code_for(&self, route: &str) -> Option<u16> {
        self.read().codes_by_route.get(route).copied()
    }

    pub fn route_for(&self, code: u16) -> Option<String> {
        self.read().routes_by_code.get(&code).cloned()
    }

    /// Code to send for `route`, if the route is registered in both directions.
    pub fn compression_code(&self, route: &str) -> Option<u16> {
        let entries = self.read();
        let code = *entries.codes_by_route.get(route)?;
        match entries.routes_by_code.get(&code) {
            Some(back) if back == route => Some(code),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.read().codes_by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the dictionary, ordered by route.
    pub fn snapshot(&self) -> BTreeMap<String, u16> {
        self.read()
            .codes_by_route
            .iter()
            .map(|(route, code)| (route.clone(), *code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn lookups_both_directions() {
        let table = RouteTable::from_dict([("user.login", 1), ("mail.sendTo", 2)]).unwrap();
        assert_eq!(table.code_for("user.login"), Some(1));
        assert_eq!(table.route_for(2).as_deref(), Some("mail.sendTo"));
        assert_eq!(table.compression_code("mail.sendTo"), Some(2));
        assert_eq!(table.code_for("chat.send"), None);
        assert_eq!(table.route_for(3), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn first_registration_wins() {
        let table = RouteTable::new();
        assert_eq!(table.register([("user.login", 1)]).unwrap(), 1);

        // Same route with a new code, and a new route with a taken code.
        assert_eq!(table.register([("user.login", 9), ("user.logout", 1)]).unwrap(), 0);
        assert_eq!(table.code_for("user.login"), Some(1));
        assert_eq!(table.route_for(1).as_deref(), Some("user.login"));
        assert_eq!(table.route_for(9), None);
        assert_eq!(table.code_for("user.logout"), None);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn duplicates_within_one_call_follow_input_order() {
        let table = RouteTable::new();
        let inserted = table
            .register(vec![("a.b", 1), ("a.b", 2), ("c.d", 1), ("c.d", 3)])
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(table.code_for("a.b"), Some(1));
        assert_eq!(table.code_for("c.d"), Some(3));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn snapshot_is_sorted_copy() {
        let table = RouteTable::from_dict([("z.last", 3), ("a.first", 7)]).unwrap();
        let snapshot: Vec<_> = table.snapshot().into_iter().collect();
        assert_eq!(
            snapshot,
            vec![("a.first".to_string(), 7), ("z.last".to_string(), 3)]
        );
    }

    #[test]
    fn empty_table() {
        let table = RouteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.compression_code(""), None);
    }
}
