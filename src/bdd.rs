//! The BDD manager.
//!
//! All Boolean functions live inside a single [`Bdd`] manager and are addressed
//! through [`Ref`] handles. Nodes are hash-consed and complement edges are only
//! allowed on low edges, so each function has exactly one handle: comparing two
//! handles with `==` decides semantic equality.
//!
//! The variable order is fixed to the order of variable identifiers.
//! Nodes are never collected; the manager only grows.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;

use log::debug;
use num_bigint::BigUint;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::table::Table;
use crate::types::Var;
use crate::utils::{pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.raw() as u64,
            self.high.raw() as u64,
        )
    }
}

/// Sizing parameters of a [`Bdd`] manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// Initial node storage is `2^storage_bits` slots; it grows past that on demand.
    pub storage_bits: usize,
    /// The computed table has `2^cache_bits` entries.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 20,
            cache_bits: 16,
        }
    }
}

pub struct Bdd {
    storage: RefCell<Table<Node>>,
    cache: RefCell<Cache<(Ref, Ref, Ref), Ref>>,
    one: Ref,
}

impl Bdd {
    pub fn new(config: BddConfig) -> Self {
        assert!(
            config.storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Table::new(config.storage_bits);

        // Allocate the terminal node:
        let one = storage.add(Node::default());
        assert_eq!(one, 1); // Make sure the terminal node is (1).

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits.min(config.storage_bits))),
            one: Ref::positive(one as u32),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("nodes", &storage.len())
            .field("buckets", &storage.num_buckets())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    pub fn one(&self) -> Ref {
        self.one
    }
    pub fn zero(&self) -> Ref {
        -self.one
    }

    /// Number of allocated nodes, the terminal included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().len()
    }

    fn node(&self, index: usize) -> Node {
        *self.storage.borrow().value(index)
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.node(index).variable
    }

    pub fn low_node(&self, f: Ref) -> Ref {
        let low = self.node(f.index()).low;
        if f.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, f: Ref) -> Ref {
        let high = self.node(f.index()).high;
        if f.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f == self.zero()
    }
    pub fn is_one(&self, f: Ref) -> bool {
        f == self.one
    }
    pub fn is_terminal(&self, f: Ref) -> bool {
        f.index() == self.one.index()
    }

    /// Position of the top variable of `f`; terminals sit below every variable.
    fn level(&self, f: Ref) -> u32 {
        if self.is_terminal(f) {
            u32::MAX
        } else {
            self.variable(f.index())
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if low == high {
            return low;
        }

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        assert!(i < (1 << 31), "Storage is full");
        Ref::positive(i as u32)
    }

    pub fn mk_var(&self, v: Var) -> Ref {
        self.mk_node(v.id(), self.zero(), self.one)
    }

    pub fn top_cofactors(&self, f: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.level(f) > v {
            return (f, f);
        }
        assert_eq!(v, self.level(f));
        (self.low_node(f), self.high_node(f))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_strategy::bdd::Bdd;
    /// use bdd_strategy::types::Var;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(Var::new(1));
    /// let y = bdd.mk_var(Var::new(2));
    /// let z = bdd.mk_var(Var::new(3));
    /// let f = bdd.apply_ite(x, y, z);
    /// let x_and_y = bdd.apply_and(x, y);
    /// let not_x_and_z = bdd.apply_and(-x, z);
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z));
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero()
        } else {
            g
        };
        let h = if h == f {
            self.zero()
        } else if h == -f {
            self.one
        } else {
            h
        };

        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, n) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: apply_ite{:?} -> {}", key, res);
            return if n { -res } else { res };
        }

        // Determine the top variable:
        let m = self.level(f).min(self.level(g)).min(self.level(h));
        assert_ne!(m, u32::MAX);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);

        let res = self.mk_node(m, e, t);
        debug!("computed: apply_ite{:?} -> {}", key, res);
        self.cache.borrow_mut().insert(key, res);

        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero())
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero();
        for node in nodes {
            res = self.apply_or(res, node);
        }
        res
    }

    /// Existential abstraction `∃vars. f`.
    pub fn exists(&self, f: Ref, vars: &[Var]) -> Ref {
        debug!("exists(f = {}, vars = {:?})", f, vars);
        let mut vars: Vec<u32> = vars.iter().map(|v| v.id()).collect();
        vars.sort_unstable();
        vars.dedup();
        let mut cache = HashMap::new();
        self.exists_(f, &vars, &mut cache)
    }

    fn exists_(&self, f: Ref, vars: &[u32], cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }

        // Variables above the top of `f` do not occur in it.
        let v = self.variable(f.index());
        let vars = &vars[vars.partition_point(|&x| x < v)..];
        if vars.is_empty() {
            return f;
        }

        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let low = self.exists_(self.low_node(f), vars, cache);
        let res = if vars[0] == v {
            if self.is_one(low) {
                self.one
            } else {
                let high = self.exists_(self.high_node(f), vars, cache);
                self.apply_or(low, high)
            }
        } else {
            let high = self.exists_(self.high_node(f), vars, cache);
            self.mk_node(v, low, high)
        };
        cache.insert(f, res);
        res
    }

    fn descendants(&self, f: Ref) -> HashSet<usize> {
        let mut visited = HashSet::new();
        let mut stack = vec![f.index()];
        while let Some(i) = stack.pop() {
            if visited.insert(i) && i != self.one.index() {
                let node = self.node(i);
                stack.push(node.low.index());
                stack.push(node.high.index());
            }
        }
        visited
    }

    /// The variables `f` depends on, in order.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let vars: BTreeSet<u32> = self
            .descendants(f)
            .into_iter()
            .filter(|&i| i != self.one.index())
            .map(|i| self.variable(i))
            .collect();
        vars.into_iter().map(Var::new).collect()
    }

    /// Number of nodes reachable from `f`, the terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants(f).len()
    }

    /// Number of satisfying assignments of `f` over `num_vars` variables.
    ///
    /// The support of `f` must consist of at most `num_vars` variables.
    pub fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_(f, &max, &mut cache)
    }

    fn sat_count_(&self, f: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(f) {
            return BigUint::ZERO;
        } else if self.is_one(f) {
            return max.clone();
        }

        let node = f.regular();
        let count = if let Some(count) = cache.get(&node) {
            count.clone()
        } else {
            let Node { low, high, .. } = self.node(node.index());
            let count_low = self.sat_count_(low, max, cache);
            let count_high = self.sat_count_(high, max, cache);
            let count: BigUint = (count_low + count_high) >> 1;
            cache.insert(node, count.clone());
            count
        };

        if f.is_negated() {
            max - count
        } else {
            count
        }
    }
}
