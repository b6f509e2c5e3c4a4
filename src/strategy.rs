//! Queries against a loaded strategy.
//!
//! The strategy relation ranges over current and next-state propositions, the
//! justice index bits and the phase bit. [`BddStrategy`] turns states and
//! partial assignments into BDDs over those variables and turns query results
//! back into interned [`State`]s.

use std::cell::OnceCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use log::{debug, info};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::cubes::Cubes;
use crate::domain::{Assignment, BitAssignment, PropositionConfig};
use crate::error::{Error, Result};
use crate::loader::{self, LoadedStrategy};
use crate::reference::Ref;
use crate::state::{State, StateCollection};
use crate::types::Var;
use crate::variables::VariableModel;

/// Move kind of a transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Moves that keep pursuing the current justice goal.
    Y,
    /// Moves that switch to the next justice goal.
    Z,
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Y" => Ok(Phase::Y),
            "Z" => Ok(Phase::Z),
            _ => Err(Error::InvalidPhase(s.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Y => write!(f, "Y"),
            Phase::Z => write!(f, "Z"),
        }
    }
}

pub struct BddStrategy {
    bdd: Rc<Bdd>,
    relation: Ref,
    variables: VariableModel,
    states: StateCollection,
    /// Current-state projection of the relation, computed on first use.
    universe: OnceCell<Ref>,
}

impl fmt::Debug for BddStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BddStrategy")
            .field("relation", &self.relation)
            .field("variables", &self.variables.len())
            .field("states", &self.states.len())
            .finish()
    }
}

impl BddStrategy {
    /// Empty strategy (the relation is `false`) over the given manager.
    pub fn new(bdd: Rc<Bdd>) -> Self {
        let relation = bdd.zero();
        Self {
            bdd,
            relation,
            variables: VariableModel::new(),
            states: StateCollection::default(),
            universe: OnceCell::new(),
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn relation(&self) -> Ref {
        self.relation
    }

    pub fn variables(&self) -> &VariableModel {
        &self.variables
    }

    pub fn states(&self) -> &StateCollection {
        &self.states
    }

    pub fn config(&self) -> &PropositionConfig {
        self.states.config()
    }

    /// Install the propositions and domains states are made of.
    pub fn configure_propositions(&mut self, config: PropositionConfig) {
        info!(
            "Configuring {} propositions ({} bits)",
            config.propositions().len(),
            config.bit_names().len()
        );
        self.states.configure(config);
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = loader::load_from_file(&self.bdd, path)?;
        self.install(loaded);
        Ok(())
    }

    pub fn load_from_str(&mut self, text: &str) -> Result<()> {
        let loaded = loader::load_from_str(&self.bdd, text)?;
        self.install(loaded);
        Ok(())
    }

    fn install(&mut self, loaded: LoadedStrategy) {
        self.relation = loaded.relation;
        self.variables = loaded.variables;
        self.universe = OnceCell::new();
    }

    /// Conjunction of one literal per entry of `bits`, over next-state variables if `primed`.
    pub fn assignment_to_cube(&self, bits: &BitAssignment, primed: bool) -> Result<Ref> {
        let mut cube = self.bdd.one();
        for (name, &value) in bits {
            let x = self.bdd.mk_var(self.variables.lookup(name, primed)?);
            cube = self.bdd.apply_and(cube, if value { x } else { -x });
        }
        Ok(cube)
    }

    pub fn state_to_cube(&self, state: &State, primed: bool) -> Result<Ref> {
        let bits = self.states.expand(state)?;
        self.assignment_to_cube(&bits, primed)
    }

    /// Disjunction of the cubes of `states`.
    pub fn states_to_cube(&self, states: &[State], primed: bool) -> Result<Ref> {
        if states.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut res = self.bdd.zero();
        for state in states {
            res = self.bdd.apply_or(res, self.state_to_cube(state, primed)?);
        }
        Ok(res)
    }

    /// Cube of the justice index `jx`; bit `i` of `jx` is the `i`-th justice variable.
    pub fn justice_cube(&self, jx: u64) -> Result<Ref> {
        let justice = self.variables.justice_vars();
        if jx.checked_shr(justice.len() as u32).unwrap_or(0) != 0 {
            return Err(Error::InvalidJusticeIndex {
                jx,
                width: justice.len(),
            });
        }

        let mut cube = self.bdd.one();
        for (i, &v) in justice.iter().enumerate() {
            let x = self.bdd.mk_var(v);
            let bit = jx.checked_shr(i as u32).unwrap_or(0) & 1 == 1;
            cube = self.bdd.apply_and(cube, if bit { x } else { -x });
        }
        Ok(cube)
    }

    /// Justice index fixed by `cube`, the inverse of [`justice_cube`][Self::justice_cube].
    ///
    /// Returns `None` if the index does not fit in a `u64`.
    pub fn decode_justice(&self, cube: Ref) -> Option<u64> {
        self.bdd
            .cube_values(cube, self.variables.justice_vars())
            .into_iter()
            .enumerate()
            .filter(|&(_, bit)| bit)
            .try_fold(0u64, |jx, (i, _)| {
                let i = u32::try_from(i).ok()?;
                Some(jx | 1u64.checked_shl(i)?)
            })
    }

    fn phase_literal(&self, phase: Phase) -> Result<Ref> {
        let v = self
            .variables
            .phase_var()
            .ok_or_else(|| Error::malformed("strategy has no `strat_type` variable"))?;
        let x = self.bdd.mk_var(v);
        Ok(match phase {
            Phase::Y => -x,
            Phase::Z => x,
        })
    }

    /// Transitions out of `state` pursuing justice goal `jx` in the phase named `phase`.
    ///
    /// `phase` must be `"Y"` or `"Z"`. The result is not projected onto the
    /// next-state variables.
    pub fn get_transitions(&self, state: &State, jx: u64, phase: &str) -> Result<Ref> {
        let phase: Phase = phase.parse()?;
        self.transitions(state, jx, phase)
    }

    pub fn transitions(&self, state: &State, jx: u64, phase: Phase) -> Result<Ref> {
        debug!("transitions(state = {}, jx = {}, phase = {})", state.id(), jx, phase);
        let from = self.state_to_cube(state, false)?;
        let justice = self.justice_cube(jx)?;
        let phase = self.phase_literal(phase)?;
        Ok(self
            .bdd
            .apply_and_many([self.relation, from, justice, phase]))
    }

    /// Every current-state assignment appearing in the relation.
    pub fn universe(&self) -> Ref {
        *self.universe.get_or_init(|| {
            let primed = self.variables.primed_vars();
            debug!("Computing state universe over {} primed variables", primed.len());
            self.bdd.exists(self.relation, &primed)
        })
    }

    fn state_vars(&self, primed: bool) -> Result<Vec<Var>> {
        self.config()
            .bit_names()
            .iter()
            .map(|name| self.variables.lookup(name, primed))
            .collect()
    }

    /// States satisfying `partial`, among `candidates` or else among all states of the relation.
    ///
    /// Every returned state is interned in [`states`][Self::states].
    pub fn search_for_states(
        &self,
        partial: &Assignment,
        candidates: Option<&[State]>,
    ) -> Result<States<'_>> {
        let universe = match candidates {
            Some(candidates) => self.states_to_cube(candidates, false)?,
            None => self.universe(),
        };
        let bits = self.config().expand(partial)?;
        let constraint = self.assignment_to_cube(&bits, false)?;
        let f = self.bdd.apply_and(universe, constraint);
        self.enumerate(f, false)
    }

    pub fn search_for_one_state(&self, partial: &Assignment) -> Result<Option<State>> {
        self.search_for_states(partial, None)?.next().transpose()
    }

    /// Next states `state` may move to pursuing `jx` in `phase`.
    pub fn successors(&self, state: &State, jx: u64, phase: Phase) -> Result<States<'_>> {
        let f = self.transitions(state, jx, phase)?;
        self.enumerate(f, true)
    }

    fn enumerate(&self, f: Ref, primed: bool) -> Result<States<'_>> {
        let vars = self.state_vars(primed)?;
        Ok(States {
            bdd: &*self.bdd,
            states: &self.states,
            names: self.config().bit_names().to_vec(),
            cubes: self.bdd.cubes(f, &vars),
        })
    }

    /// Number of current-state assignments in `f`.
    pub fn count_states(&self, f: Ref) -> Result<BigUint> {
        let vars = self.state_vars(false)?;
        let others: Vec<Var> = self
            .bdd
            .support(f)
            .into_iter()
            .filter(|v| !vars.contains(v))
            .collect();
        let projection = self.bdd.exists(f, &others);
        Ok(self.bdd.sat_count(projection, vars.len()))
    }

    /// Render `cube` over all file variables: `name`, `!name`, or `--` when unconstrained.
    pub fn cube_to_string(&self, cube: Ref) -> String {
        self.variables
            .ordered()
            .iter()
            .map(|(v, name)| {
                let x = self.bdd.mk_var(*v);
                if self.bdd.is_zero(self.bdd.apply_and(cube, -x)) {
                    name.clone()
                } else if self.bdd.is_zero(self.bdd.apply_and(cube, x)) {
                    format!("!{}", name)
                } else {
                    "--".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lazily interned results of a query.
///
/// Yields an error when a result does not decode to a valid state, for
/// example a domain code past the last value.
#[derive(Debug)]
pub struct States<'a> {
    bdd: &'a Bdd,
    states: &'a StateCollection,
    names: Vec<String>,
    cubes: Cubes<'a>,
}

impl Iterator for States<'_> {
    type Item = Result<State>;

    fn next(&mut self) -> Option<Self::Item> {
        let cube = self.cubes.next()?;
        let values = self.bdd.cube_values(cube, self.cubes.vars());
        let bits: BitAssignment = self.names.iter().cloned().zip(values).collect();
        Some(self.states.add_state_from_bits(&bits))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::dddmp;
    use crate::domain::{Proposition, Value};

    // p, p', jx, jx, strat_type
    fn toggle() -> BddStrategy {
        let bdd = Rc::new(Bdd::default());
        let x: Vec<Ref> = (0..5).map(|i| bdd.mk_var(Var::from_index(i))).collect();
        // p' = !p in phase Y, p' = p in phase Z
        let relation = bdd.apply_ite(x[4], bdd.apply_eq(x[0], x[1]), bdd.apply_xor(x[0], x[1]));
        let names: Vec<String> = ["p", "p'", "jx", "jx", "strat_type"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut text = String::from("# Variable names:\n");
        for (i, name) in names.iter().enumerate() {
            text += &format!("#\t{}: <{}>\n", i, name);
        }
        text += "\n";
        text += &dddmp::store(&bdd, relation, "toggle", &names);

        let mut strategy = BddStrategy::new(bdd);
        strategy.configure_propositions(PropositionConfig::new([Proposition::from("p")]).unwrap());
        strategy.load_from_str(&text).unwrap();
        strategy
    }

    fn state(strategy: &BddStrategy, p: bool) -> State {
        strategy
            .states()
            .add_new_state(Assignment::from([("p".to_string(), Value::Bool(p))]))
            .unwrap()
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("Y".parse::<Phase>().unwrap(), Phase::Y);
        assert_eq!("Z".parse::<Phase>().unwrap(), Phase::Z);
        assert!(matches!("y".parse::<Phase>(), Err(Error::InvalidPhase(s)) if s == "y"));
    }

    #[test]
    fn test_justice_cube() {
        let strategy = toggle();
        let bdd = strategy.bdd();
        let j0 = bdd.mk_var(Var::from_index(2));
        let j1 = bdd.mk_var(Var::from_index(3));

        assert_eq!(strategy.justice_cube(0).unwrap(), bdd.apply_and(-j0, -j1));
        assert_eq!(strategy.justice_cube(1).unwrap(), bdd.apply_and(j0, -j1));
        assert_eq!(strategy.justice_cube(2).unwrap(), bdd.apply_and(-j0, j1));
        for jx in 0..4 {
            let cube = strategy.justice_cube(jx).unwrap();
            assert_eq!(strategy.decode_justice(cube), Some(jx));
        }
        assert!(matches!(
            strategy.justice_cube(4),
            Err(Error::InvalidJusticeIndex { jx: 4, width: 2 })
        ));
        assert!(strategy.justice_cube(u64::MAX).is_err());
    }

    #[test]
    fn test_justice_wider_than_u64() {
        let mut text = String::from("# Variable names:\n#\t0: <p>\n#\t1: <p'>\n");
        for i in 2..67 {
            text += &format!("#\t{}: <jx>\n", i);
        }
        text += "\n";
        let bdd = Rc::new(Bdd::default());
        let relation = bdd.mk_var(Var::from_index(0));
        text += &dddmp::store(&bdd, relation, "wide", &[]);

        let mut strategy = BddStrategy::new(Rc::clone(&bdd));
        strategy.load_from_str(&text).unwrap();
        let justice = strategy.variables().justice_vars().to_vec();
        assert_eq!(justice.len(), 65);

        let zero = strategy.justice_cube(0).unwrap();
        let negated: Vec<Ref> = justice.iter().map(|&v| -bdd.mk_var(v)).collect();
        assert_eq!(zero, bdd.apply_and_many(negated));
        assert_eq!(strategy.decode_justice(zero), Some(0));

        let top = strategy.justice_cube(1 << 63).unwrap();
        assert_eq!(bdd.apply_and(top, bdd.mk_var(justice[63])), top);
        assert_eq!(bdd.apply_and(top, bdd.mk_var(justice[64])), bdd.zero());
        assert_eq!(strategy.decode_justice(top), Some(1 << 63));

        let past = bdd.apply_and_many(
            justice[..64]
                .iter()
                .map(|&v| -bdd.mk_var(v))
                .chain([bdd.mk_var(justice[64])]),
        );
        assert_eq!(strategy.decode_justice(past), None);
    }

    #[test]
    fn test_transitions() {
        let strategy = toggle();
        let bdd = strategy.bdd();
        let off = state(&strategy, false);
        let next_p = bdd.mk_var(strategy.variables().lookup("p", true).unwrap());

        let y = strategy.get_transitions(&off, 1, "Y").unwrap();
        let z = strategy.get_transitions(&off, 1, "Z").unwrap();
        assert!(bdd.is_zero(bdd.apply_and(y, z)));
        assert_eq!(bdd.apply_and(y, -next_p), bdd.zero());
        assert_eq!(bdd.apply_and(z, next_p), bdd.zero());

        let all = bdd.apply_and_many([
            strategy.relation(),
            strategy.state_to_cube(&off, false).unwrap(),
            strategy.justice_cube(1).unwrap(),
        ]);
        assert_eq!(bdd.apply_or(y, z), all);
    }

    #[test]
    fn test_invalid_phase() {
        let strategy = toggle();
        let off = state(&strategy, false);
        assert!(matches!(
            strategy.get_transitions(&off, 0, "Q"),
            Err(Error::InvalidPhase(s)) if s == "Q"
        ));
        assert_eq!(strategy.states().len(), 1);
    }

    #[test]
    fn test_successors() {
        let strategy = toggle();
        let off = state(&strategy, false);

        let next: Vec<State> = strategy
            .successors(&off, 0, Phase::Y)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].get("p"), Some(Value::Bool(true)));

        let stay: Vec<State> = strategy
            .successors(&off, 0, Phase::Z)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(stay, [off]);
    }

    #[test]
    fn test_search() {
        let strategy = toggle();
        let all: Vec<State> = strategy
            .search_for_states(&Assignment::new(), None)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(strategy.count_states(strategy.universe()).unwrap(), BigUint::from(2u32));

        let on = strategy
            .search_for_one_state(&Assignment::from([("p".to_string(), Value::Bool(true))]))
            .unwrap()
            .unwrap();
        assert_eq!(on.get("p"), Some(Value::Bool(true)));
        assert!(all.contains(&on));
    }

    #[test]
    fn test_search_among_candidates() {
        let strategy = toggle();
        let off = state(&strategy, false);
        let found: Vec<State> = strategy
            .search_for_states(&Assignment::new(), Some(std::slice::from_ref(&off)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(found, [off]);

        assert!(matches!(
            strategy.search_for_states(&Assignment::new(), Some(&[][..])),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_unknown_name() {
        let strategy = toggle();
        let bits = BitAssignment::from([("radio".to_string(), true)]);
        assert!(matches!(
            strategy.assignment_to_cube(&bits, false),
            Err(Error::UnknownVariableName(n)) if n == "radio"
        ));
    }

    #[test]
    fn test_cube_to_string() {
        let strategy = toggle();
        let off = state(&strategy, false);
        let cube = strategy.bdd().apply_and(
            strategy.state_to_cube(&off, false).unwrap(),
            strategy.justice_cube(2).unwrap(),
        );
        assert_eq!(strategy.cube_to_string(cube), "!p, --, !jx, jx, --");
    }
}
