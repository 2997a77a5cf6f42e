//! A demand-driven query engine with dependency tracking and invalidation.
//!
//! Each query is a type implementing [`Query`]; [`QueryEngine::execute`]
//! evaluates it for a given key, caching the result and recording which
//! other queries it called along the way. Invalidating a query drops its
//! cached value and recursively drops every query that (transitively)
//! depended on it.
//!
//! Queries are distinguished by [`Query::NAME`] plus a hash of their key,
//! rather than by a type-erased `compute` callback: [`QueryEngine::execute`]
//! is generic over `Q`, so the only place a cached value is downcast out of
//! its type-erased storage is the call site that already knows `Q::Value`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A single demand-computed value, keyed by `Self::Key`.
///
/// `compute` may call `engine.execute::<OtherQuery>(...)` to depend on
/// other queries; the engine records that edge automatically so that
/// invalidating `OtherQuery` also invalidates anything that read it.
pub trait Query<C>: 'static {
    type Key: Clone + Eq + Hash + 'static;
    type Value: Clone + 'static;

    /// A name unique among queries sharing an engine. Used both for
    /// diagnostics (cycle panics name the query by this) and as half of
    /// the identity of a dependency-graph node.
    const NAME: &'static str;

    fn compute(engine: &QueryEngine<C>, key: &Self::Key) -> Self::Value;
}

type NodeId = (&'static str, u64);

fn hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

struct QueryState<V> {
    value: Option<V>,
}

/// Type-erased bookkeeping for one graph node: a closure that knows how to
/// drop the cached value behind this node's typed storage, without the
/// engine itself needing to know `Q::Key`/`Q::Value` at invalidation time.
struct NodeMeta {
    invalidate: Box<dyn Fn()>,
}

/// The engine. `C` is whatever shared context queries need to read from
/// (e.g. a source-file table); it is immutable for the engine's lifetime,
/// since all caching and invalidation happen through interior mutability.
pub struct QueryEngine<C> {
    context: C,
    storage: RefCell<HashMap<&'static str, Rc<dyn Any>>>,
    node_meta: RefCell<HashMap<NodeId, NodeMeta>>,
    dependencies: RefCell<HashMap<NodeId, Vec<NodeId>>>,
    dependents: RefCell<HashMap<NodeId, Vec<NodeId>>>,
    active: RefCell<HashSet<NodeId>>,
    invalidating: RefCell<HashSet<NodeId>>,
    stack: RefCell<Vec<NodeId>>,
}

impl<C> QueryEngine<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            storage: RefCell::new(HashMap::new()),
            node_meta: RefCell::new(HashMap::new()),
            dependencies: RefCell::new(HashMap::new()),
            dependents: RefCell::new(HashMap::new()),
            active: RefCell::new(HashSet::new()),
            invalidating: RefCell::new(HashSet::new()),
            stack: RefCell::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    fn typed_storage<Q: Query<C>>(&self) -> Rc<RefCell<HashMap<Q::Key, QueryState<Q::Value>>>> {
        let mut storage = self.storage.borrow_mut();
        let entry = storage
            .entry(Q::NAME)
            .or_insert_with(|| Rc::new(RefCell::new(HashMap::<Q::Key, QueryState<Q::Value>>::new())) as Rc<dyn Any>);
        Rc::clone(entry)
            .downcast::<RefCell<HashMap<Q::Key, QueryState<Q::Value>>>>()
            .unwrap_or_else(|_| unreachable!("storage type mismatch for query {}", Q::NAME))
    }

    fn add_dependency_edge(&self, from: NodeId, to: NodeId) {
        let mut deps = self.dependencies.borrow_mut();
        let list = deps.entry(from).or_default();
        if !list.contains(&to) {
            list.push(to);
            drop(deps);
            self.dependents.borrow_mut().entry(to).or_default().push(from);
        }
    }

    fn clear_dependencies(&self, node_id: NodeId) {
        let old = self.dependencies.borrow_mut().remove(&node_id).unwrap_or_default();
        let mut dependents = self.dependents.borrow_mut();
        for dep in old {
            if let Some(list) = dependents.get_mut(&dep) {
                list.retain(|&d| d != node_id);
            }
        }
    }

    /// Evaluates `Q` for `key`, returning a cached value if one is
    /// present. Panics if evaluating `Q(key)` would require evaluating
    /// itself (a dependency cycle), naming `Q::NAME` in the message.
    pub fn execute<Q: Query<C>>(&self, key: Q::Key) -> Q::Value {
        let node_id = (Q::NAME, hash_key(&key));

        if let Some(&caller) = self.stack.borrow().last() {
            self.add_dependency_edge(caller, node_id);
        }

        if self.active.borrow().contains(&node_id) {
            panic!("query cycle detected while evaluating {}", Q::NAME);
        }

        let typed = self.typed_storage::<Q>();
        if let Some(state) = typed.borrow().get(&key) {
            if let Some(value) = &state.value {
                return value.clone();
            }
        }

        {
            let storage_for_meta = Rc::clone(&typed);
            let key_for_meta = key.clone();
            self.node_meta.borrow_mut().insert(
                node_id,
                NodeMeta {
                    invalidate: Box::new(move || {
                        if let Some(state) = storage_for_meta.borrow_mut().get_mut(&key_for_meta) {
                            state.value = None;
                        }
                    }),
                },
            );
        }
        typed.borrow_mut().entry(key.clone()).or_insert(QueryState { value: None });

        self.active.borrow_mut().insert(node_id);
        self.stack.borrow_mut().push(node_id);
        self.clear_dependencies(node_id);

        let value = Q::compute(self, &key);

        self.stack.borrow_mut().pop();
        self.active.borrow_mut().remove(&node_id);
        if let Some(state) = typed.borrow_mut().get_mut(&key) {
            state.value = Some(value.clone());
        }

        value
    }

    /// Drops the cached value for `Q(key)` and recursively invalidates
    /// every query that depended on it, in the same traversal order the
    /// dependency edges were recorded.
    pub fn invalidate<Q: Query<C>>(&self, key: &Q::Key) {
        self.invalidate_node((Q::NAME, hash_key(key)));
    }

    fn invalidate_node(&self, node_id: NodeId) {
        if self.active.borrow().contains(&node_id) {
            panic!("cannot invalidate query {} while it is executing", node_id.0);
        }
        if !self.invalidating.borrow_mut().insert(node_id) {
            return;
        }
        if let Some(meta) = self.node_meta.borrow().get(&node_id) {
            (meta.invalidate)();
        }
        let dependents = self.dependents.borrow().get(&node_id).cloned().unwrap_or_default();
        for dependent in dependents {
            self.invalidate_node(dependent);
        }
        self.invalidating.borrow_mut().remove(&node_id);
    }

    /// Drops every cached value belonging to `Q`, regardless of key.
    /// Does not require `Q::Key` to be enumerable: it walks whatever keys
    /// are currently cached.
    pub fn invalidate_all<Q: Query<C>>(&self) {
        let typed = self.typed_storage::<Q>();
        let keys: Vec<Q::Key> = typed.borrow().keys().cloned().collect();
        for key in keys {
            self.invalidate::<Q>(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        value: RefCell<i64>,
    }

    struct Doubled;
    impl Query<Ctx> for Doubled {
        type Key = ();
        type Value = i64;
        const NAME: &'static str = "doubled";
        fn compute(engine: &QueryEngine<Ctx>, _key: &()) -> i64 {
            *engine.context().value.borrow() * 2
        }
    }

    struct QuadrupledViaDoubled;
    impl Query<Ctx> for QuadrupledViaDoubled {
        type Key = ();
        type Value = i64;
        const NAME: &'static str = "quadrupled";
        fn compute(engine: &QueryEngine<Ctx>, key: &()) -> i64 {
            engine.execute::<Doubled>(*key) * 2
        }
    }

    #[test]
    fn caches_and_recomputes_after_invalidation() {
        let engine = QueryEngine::new(Ctx { value: RefCell::new(10) });
        assert_eq!(engine.execute::<Doubled>(()), 20);
        *engine.context().value.borrow_mut() = 50;
        assert_eq!(engine.execute::<Doubled>(()), 20, "cache should still hold the old value");
        engine.invalidate::<Doubled>(&());
        assert_eq!(engine.execute::<Doubled>(()), 100);
    }

    #[test]
    fn invalidation_propagates_to_dependents() {
        let engine = QueryEngine::new(Ctx { value: RefCell::new(3) });
        assert_eq!(engine.execute::<QuadrupledViaDoubled>(()), 12);
        *engine.context().value.borrow_mut() = 7;
        engine.invalidate::<Doubled>(&());
        assert_eq!(engine.execute::<QuadrupledViaDoubled>(()), 28);
    }

    struct CyclesOnItself;
    impl Query<Ctx> for CyclesOnItself {
        type Key = ();
        type Value = ();
        const NAME: &'static str = "cycles_on_itself";
        fn compute(engine: &QueryEngine<Ctx>, key: &()) {
            engine.execute::<CyclesOnItself>(*key)
        }
    }

    #[test]
    #[should_panic(expected = "cycles_on_itself")]
    fn self_dependency_panics() {
        let engine = QueryEngine::new(Ctx { value: RefCell::new(0) });
        engine.execute::<CyclesOnItself>(());
    }
}
