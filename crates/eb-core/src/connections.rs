//! Directed connections between shapes.
//!
//! Besides the connections themselves the store keeps two indexes:
//! a per-shape list of touching connection IDs (so moving or deleting a
//! shape only visits its own connections) and a shape-level digraph used
//! for cycle queries.

use crate::error::{EditorError, Result};
use crate::geometry::{ConnectionPath, closest_anchors};
use crate::id::{ConnectionId, IdGenerator, SequentialIds, ShapeId, draw_unique};
use crate::model::{Connection, Shape, Side};
use crate::shapes::ShapeStore;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use smallvec::SmallVec;
use std::collections::HashMap;

pub type TouchingIds = SmallVec<[ConnectionId; 4]>;

pub struct ConnectionStore {
    connections: HashMap<ConnectionId, Connection>,
    order: Vec<ConnectionId>,
    by_shape: HashMap<ShapeId, TouchingIds>,
    /// Edge weight counts parallel connections between the same pair.
    topology: DiGraphMap<ShapeId, usize>,
    ids: Box<dyn IdGenerator>,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new(Box::new(SequentialIds::new()))
    }
}

impl ConnectionStore {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            connections: HashMap::new(),
            order: Vec::new(),
            by_shape: HashMap::new(),
            topology: DiGraphMap::new(),
            ids,
        }
    }

    /// Create `source → target`. Rejects self-connections and unknown
    /// endpoints without mutating anything.
    ///
    /// Closing a cycle is allowed; it is only reported at debug level.
    /// Use [`ConnectionStore::would_create_cycle`] to ask beforehand.
    pub fn create(
        &mut self,
        shapes: &ShapeStore,
        source: ShapeId,
        target: ShapeId,
    ) -> Result<Connection> {
        if source == target {
            return Err(EditorError::SelfConnection(source));
        }
        let src = shapes.get(source).ok_or(EditorError::ShapeNotFound(source))?;
        let dst = shapes.get(target).ok_or(EditorError::ShapeNotFound(target))?;

        if self.would_create_cycle(source, target) {
            log::debug!("{source} -> {target} closes a cycle");
        }

        let (source_side, target_side) = closest_anchors(&src.bounds(), &dst.bounds());
        let connection = Connection {
            id: self.fresh_id(),
            source,
            target,
            source_side,
            target_side,
        };
        self.index(&connection);
        self.order.push(connection.id);
        self.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    /// Remove a connection. The caller removes its visual separately.
    pub fn remove(&mut self, id: ConnectionId) -> Result<Connection> {
        let connection = self
            .connections
            .remove(&id)
            .ok_or(EditorError::ConnectionNotFound(id))?;
        self.order.retain(|c| *c != id);
        self.unindex(&connection);
        Ok(connection)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connections where `shape` is source or target.
    pub fn connections_touching(&self, shape: ShapeId) -> Vec<&Connection> {
        self.touching_ids(shape)
            .iter()
            .filter_map(|id| self.connections.get(id))
            .collect()
    }

    pub fn touching_ids(&self, shape: ShapeId) -> TouchingIds {
        self.by_shape.get(&shape).cloned().unwrap_or_default()
    }

    /// Re-pick the closest anchor pair for one connection.
    pub fn recompute_anchors(
        &mut self,
        id: ConnectionId,
        source: &Shape,
        target: &Shape,
    ) -> Result<(Side, Side)> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(EditorError::ConnectionNotFound(id))?;
        let sides = closest_anchors(&source.bounds(), &target.bounds());
        connection.source_side = sides.0;
        connection.target_side = sides.1;
        Ok(sides)
    }

    /// Recompute anchors for the connections touching `shape` only, and
    /// return their new paths for replotting.
    pub fn recompute_for_shape(
        &mut self,
        shapes: &ShapeStore,
        shape: ShapeId,
    ) -> Vec<(ConnectionId, ConnectionPath)> {
        let mut replots = Vec::new();
        for id in self.touching_ids(shape) {
            let Some((source, target)) = self
                .connections
                .get(&id)
                .map(|c| (c.source, c.target))
            else {
                continue;
            };
            let (Some(src), Some(dst)) = (shapes.get(source), shapes.get(target)) else {
                log::warn!("{id} has a dangling endpoint, skipping replot");
                continue;
            };
            if self.recompute_anchors(id, src, dst).is_ok()
                && let Some(connection) = self.connections.get(&id)
            {
                replots.push((id, ConnectionPath::new(connection, src, dst)));
            }
        }
        log::trace!("replotted {} connection(s) of {shape}", replots.len());
        replots
    }

    /// Whether adding `source → target` would close a directed cycle, i.e.
    /// `source` is already reachable from `target`.
    pub fn would_create_cycle(&self, source: ShapeId, target: ShapeId) -> bool {
        if source == target {
            return true;
        }
        if !self.topology.contains_node(source) || !self.topology.contains_node(target) {
            return false;
        }
        has_path_connecting(&self.topology, target, source, None)
    }

    /// Connections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.order.iter().filter_map(|id| self.connections.get(id))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn index(&mut self, connection: &Connection) {
        self.by_shape
            .entry(connection.source)
            .or_default()
            .push(connection.id);
        self.by_shape
            .entry(connection.target)
            .or_default()
            .push(connection.id);
        match self
            .topology
            .edge_weight_mut(connection.source, connection.target)
        {
            Some(count) => *count += 1,
            None => {
                self.topology
                    .add_edge(connection.source, connection.target, 1);
            }
        }
    }

    fn unindex(&mut self, connection: &Connection) {
        for shape in [connection.source, connection.target] {
            if let Some(ids) = self.by_shape.get_mut(&shape) {
                ids.retain(|id| *id != connection.id);
                if ids.is_empty() {
                    self.by_shape.remove(&shape);
                }
            }
        }
        let remaining = match self
            .topology
            .edge_weight_mut(connection.source, connection.target)
        {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.topology
                .remove_edge(connection.source, connection.target);
        }
        for shape in [connection.source, connection.target] {
            if !self.by_shape.contains_key(&shape) {
                self.topology.remove_node(shape);
            }
        }
    }

    fn fresh_id(&mut self) -> ConnectionId {
        let connections = &self.connections;
        let raw = draw_unique(self.ids.as_mut(), "conn", |s| {
            connections.contains_key(&ConnectionId::intern(s))
        });
        ConnectionId::intern(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeKind;
    use pretty_assertions::assert_eq;

    fn board() -> (ShapeStore, ShapeId, ShapeId, ShapeId) {
        let mut shapes = ShapeStore::default();
        let a = shapes.create(ShapeKind::Command, 0.0, 0.0, None).shape.id;
        let b = shapes.create(ShapeKind::Event, 300.0, 0.0, None).shape.id;
        let c = shapes.create(ShapeKind::ReadModel, 600.0, 0.0, None).shape.id;
        (shapes, a, b, c)
    }

    #[test]
    fn create_picks_facing_anchors() {
        let (shapes, a, b, _) = board();
        let mut conns = ConnectionStore::default();
        let conn = conns.create(&shapes, a, b).unwrap();
        assert_eq!((conn.source_side, conn.target_side), (Side::Right, Side::Left));
        assert_eq!(conns.connections_touching(a).len(), 1);
        assert_eq!(conns.connections_touching(b).len(), 1);
    }

    #[test]
    fn repeating_generator_still_yields_unique_ids() {
        let (shapes, a, b, c) = board();
        let mut conns = ConnectionStore::new(Box::new(|_: &str| "link".to_string()));
        let first = conns.create(&shapes, a, b).unwrap().id;
        let second = conns.create(&shapes, b, c).unwrap().id;
        assert_ne!(first, second);
        assert_eq!(conns.len(), 2);
    }

    #[test]
    fn self_connection_is_rejected() {
        let (shapes, a, _, _) = board();
        let mut conns = ConnectionStore::default();
        assert_eq!(conns.create(&shapes, a, a), Err(EditorError::SelfConnection(a)));
        assert!(conns.is_empty());
    }

    #[test]
    fn unknown_endpoint_is_rejected_without_mutation() {
        let (shapes, a, _, _) = board();
        let ghost = ShapeId::intern("ghost_endpoint");
        let mut conns = ConnectionStore::default();
        assert_eq!(
            conns.create(&shapes, a, ghost),
            Err(EditorError::ShapeNotFound(ghost))
        );
        assert_eq!(
            conns.create(&shapes, ghost, a),
            Err(EditorError::ShapeNotFound(ghost))
        );
        assert!(conns.is_empty());
        assert!(conns.touching_ids(a).is_empty());
        assert!(!conns.would_create_cycle(a, ghost));
    }

    #[test]
    fn cycles_are_detected_but_allowed() {
        let (shapes, a, b, c) = board();
        let mut conns = ConnectionStore::default();
        conns.create(&shapes, a, b).unwrap();
        conns.create(&shapes, b, c).unwrap();
        assert!(conns.would_create_cycle(c, a));
        assert!(!conns.would_create_cycle(a, c));

        conns.create(&shapes, c, a).unwrap();
        assert_eq!(conns.len(), 3);
    }

    #[test]
    fn remove_cleans_indexes() {
        let (shapes, a, b, c) = board();
        let mut conns = ConnectionStore::default();
        let ab = conns.create(&shapes, a, b).unwrap();
        let ab2 = conns.create(&shapes, a, b).unwrap();
        conns.create(&shapes, b, c).unwrap();

        conns.remove(ab.id).unwrap();
        // Parallel edge still keeps the path alive.
        assert!(conns.would_create_cycle(b, a));
        conns.remove(ab2.id).unwrap();
        assert!(!conns.would_create_cycle(b, a));
        assert!(conns.touching_ids(a).is_empty());
        assert_eq!(conns.touching_ids(b).len(), 1);
        assert_eq!(
            conns.remove(ab.id),
            Err(EditorError::ConnectionNotFound(ab.id))
        );
    }

    #[test]
    fn recompute_only_touches_moved_shape() {
        let (mut shapes, a, b, c) = board();
        let d = shapes.create(ShapeKind::Event, 600.0, 400.0, None).shape.id;
        let mut conns = ConnectionStore::default();
        let ab = conns.create(&shapes, a, b).unwrap();
        let cd = conns.create(&shapes, c, d).unwrap();

        // Move B below A and C far away without recomputing C.
        shapes.move_to(b, 0.0, 400.0).unwrap();
        shapes.move_to(c, 600.0, 900.0).unwrap();

        let replots = conns.recompute_for_shape(&shapes, b);
        assert_eq!(replots.len(), 1);
        assert_eq!(replots[0].0, ab.id);

        let ab_now = conns.get(ab.id).unwrap();
        assert_eq!((ab_now.source_side, ab_now.target_side), (Side::Bottom, Side::Top));
        // C→D keeps its stale cached anchors until C or D is recomputed.
        assert_eq!(conns.get(cd.id).unwrap(), &cd);
    }
}
