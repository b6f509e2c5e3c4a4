//! Interned states.
//!
//! A [`State`] is an immutable total assignment over the configured
//! propositions. [`StateCollection`] hands out exactly one `State` per distinct
//! assignment, so states compare by identity.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::domain::{Assignment, BitAssignment, PropositionConfig, Value};
use crate::error::Result;

#[derive(Debug)]
struct StateData {
    id: usize,
    values: Assignment,
}

/// Handle to an interned assignment. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct State(Arc<StateData>);

impl State {
    /// Position of the state in its collection, in creation order.
    pub fn id(&self) -> usize {
        self.0.id
    }

    /// Full assignment, domains as value indices.
    pub fn values(&self) -> &Assignment {
        &self.0.values
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.values.get(name).copied()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State #{} {{", self.id())?;
        for (i, (name, value)) in self.values().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", name, value)?;
        }
        write!(f, " }}")
    }
}

#[derive(Debug, Default)]
struct Interner {
    states: Vec<State>,
    index: HashMap<Assignment, State>,
}

/// Registry of every state seen so far. Grows monotonically.
#[derive(Debug, Default)]
pub struct StateCollection {
    config: PropositionConfig,
    interner: Mutex<Interner>,
}

impl StateCollection {
    pub fn new(config: PropositionConfig) -> Self {
        Self {
            config,
            interner: Mutex::new(Interner::default()),
        }
    }

    pub fn config(&self) -> &PropositionConfig {
        &self.config
    }

    /// Replace the proposition configuration.
    ///
    /// States interned under the previous configuration are forgotten.
    pub fn configure(&mut self, config: PropositionConfig) {
        let interner = self
            .interner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if !interner.states.is_empty() {
            debug!(
                "Reconfiguring propositions, dropping {} states",
                interner.states.len()
            );
        }
        *interner = Interner::default();
        self.config = config;
    }

    /// Configured proposition names; with `expand_domains`, domains are replaced by their bits.
    pub fn propositions(&self, expand_domains: bool) -> Vec<String> {
        if expand_domains {
            self.config.bit_names().to_vec()
        } else {
            self.config.names().into_iter().map(str::to_string).collect()
        }
    }

    /// Intern a complete assignment.
    ///
    /// Returns the existing state if the same assignment was added before.
    pub fn add_new_state(&self, values: Assignment) -> Result<State> {
        self.config.check_complete(&values)?;

        let mut interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = interner.index.get(&values) {
            return Ok(state.clone());
        }

        let state = State(Arc::new(StateData {
            id: interner.states.len(),
            values: values.clone(),
        }));
        debug!("New state: {}", state);
        interner.states.push(state.clone());
        interner.index.insert(values, state.clone());
        Ok(state)
    }

    /// Intern the state given by bit-level values.
    pub fn add_state_from_bits(&self, bits: &BitAssignment) -> Result<State> {
        let values = self.config.collapse(bits)?;
        self.add_new_state(values)
    }

    /// Bit-level values of `state`.
    pub fn expand(&self, state: &State) -> Result<BitAssignment> {
        self.config.expand(state.values())
    }

    pub fn get(&self, id: usize) -> Option<State> {
        let interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
        interner.states.get(id).cloned()
    }

    /// Snapshot of all states, in creation order.
    pub fn states(&self) -> Vec<State> {
        let interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
        interner.states.clone()
    }

    pub fn len(&self) -> usize {
        let interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
        interner.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use test_log::test;

    use super::*;
    use crate::domain::{BitOrder, Domain, Proposition};
    use crate::error::Error;

    fn collection() -> StateCollection {
        let region = Domain::new("region", ["p1", "p2", "p3"], BitOrder::MsbFirst).unwrap();
        let config = PropositionConfig::new([
            Proposition::from("person"),
            Proposition::from(region),
        ])
        .unwrap();
        StateCollection::new(config)
    }

    fn assignment(person: bool, region: usize) -> Assignment {
        Assignment::from([
            ("person".to_string(), Value::Bool(person)),
            ("region".to_string(), Value::Index(region)),
        ])
    }

    #[test]
    fn test_interning() {
        let states = collection();
        let a = states.add_new_state(assignment(true, 1)).unwrap();
        let b = states.add_new_state(assignment(true, 1)).unwrap();
        let c = states.add_new_state(assignment(false, 1)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(states.len(), 2);
        assert_eq!(c.id(), 1);
        assert_eq!(states.get(1), Some(c));
        assert_eq!(a.get("region"), Some(Value::Index(1)));
    }

    #[test]
    fn test_rejects_incomplete_state() {
        let states = collection();
        let mut values = assignment(true, 0);
        values.remove("region");
        assert!(matches!(
            states.add_new_state(values),
            Err(Error::Configuration(_))
        ));
        assert!(states.is_empty());
    }

    #[test]
    fn test_rejects_bad_values() {
        let states = collection();
        assert!(matches!(
            states.add_new_state(assignment(true, 3)),
            Err(Error::Configuration(_))
        ));

        let mut values = assignment(true, 0);
        values.insert("radio".to_string(), Value::Bool(false));
        assert!(matches!(
            states.add_new_state(values),
            Err(Error::UnknownVariableName(n)) if n == "radio"
        ));
    }

    #[test]
    fn test_from_bits() {
        let states = collection();
        let bits = BitAssignment::from([
            ("person".to_string(), false),
            ("region_b0".to_string(), true),
            ("region_b1".to_string(), false),
        ]);
        let state = states.add_state_from_bits(&bits).unwrap();
        assert_eq!(state.get("region"), Some(Value::Index(2)));
        assert_eq!(states.expand(&state).unwrap(), bits);
    }

    #[test]
    fn test_propositions() {
        let states = collection();
        assert_eq!(states.propositions(false), ["person", "region"]);
        assert_eq!(
            states.propositions(true),
            ["person", "region_b0", "region_b1"]
        );
    }

    #[test]
    fn test_configure_forgets_states() {
        let mut states = collection();
        states.add_new_state(assignment(true, 0)).unwrap();
        states.configure(PropositionConfig::new([Proposition::from("radio")]).unwrap());
        assert!(states.is_empty());
        assert_eq!(states.propositions(false), ["radio"]);
    }

    #[test]
    fn test_concurrent_interning() {
        let states = collection();
        let found: Vec<State> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| states.add_new_state(assignment(false, 2)).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(found.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_display() {
        let states = collection();
        let state = states.add_new_state(assignment(true, 0)).unwrap();
        assert_eq!(state.to_string(), "State #0 { person: true, region: #0 }");
    }
}
