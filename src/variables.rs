//! Variable model of a loaded strategy.
//!
//! Maps proposition names to manager variables. Next-state copies carry a
//! trailing [`PRIME`]. Two names are reserved: every `jx` variable is one bit of
//! the justice index, and `strat_type` is the strategy phase bit. Neither has a
//! primed form.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Var;

/// Marker of next-state variable names.
pub const PRIME: char = '\'';

/// Name of the justice-index bit variables.
pub const JUSTICE_NAME: &str = "jx";

/// Name of the strategy phase variable.
pub const PHASE_NAME: &str = "strat_type";

/// Append the prime marker to `name`.
pub fn primed(name: &str) -> String {
    format!("{}{}", name, PRIME)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VariableModel {
    by_name: HashMap<String, Var>,
    by_var: HashMap<Var, String>,
    justice: Vec<Var>,
    phase: Option<Var>,
    /// Every recorded variable, in the order it was recorded.
    order: Vec<(Var, String)>,
    consecutive: bool,
}

impl Default for VariableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableModel {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_var: HashMap::new(),
            justice: Vec::new(),
            phase: None,
            order: Vec::new(),
            consecutive: true,
        }
    }

    /// Classify and record the variable `var` named `name`.
    ///
    /// Justice bits are appended in call order, which is their significance
    /// order (least significant first).
    pub fn record(&mut self, var: Var, name: &str) {
        debug!("record(var = {}, name = {:?})", var, name);

        if self.consecutive && var.index() as usize != self.order.len() {
            warn!(
                "Variable {:?} has id {}, expected {}: variable ids are not consecutive",
                name,
                var.index(),
                self.order.len()
            );
            self.consecutive = false;
        }

        match name {
            JUSTICE_NAME => self.justice.push(var),
            PHASE_NAME => {
                if let Some(old) = self.phase.replace(var) {
                    warn!("Phase variable redefined: {} replaces {}", var, old);
                }
            }
            _ => {
                self.by_name.insert(name.to_string(), var);
                self.by_var.insert(var, name.to_string());
            }
        }

        self.order.push((var, name.to_string()));
    }

    /// Variable of the proposition `name`, or of its next-state copy if `primed`.
    pub fn lookup(&self, name: &str, primed: bool) -> Result<Var> {
        let full = if primed {
            self::primed(name)
        } else {
            name.to_string()
        };
        self.by_name
            .get(&full)
            .copied()
            .ok_or(Error::UnknownVariableName(full))
    }

    /// Full name (primed names included) of a proposition variable.
    pub fn name_of(&self, var: Var) -> Option<&str> {
        self.by_var.get(&var).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Justice bits, least significant first.
    pub fn justice_vars(&self) -> &[Var] {
        &self.justice
    }

    pub fn phase_var(&self) -> Option<Var> {
        self.phase
    }

    /// Variables in recording order, paired with their names.
    pub fn ordered(&self) -> &[(Var, String)] {
        &self.order
    }

    /// Current-state proposition variables, sorted.
    pub fn current_vars(&self) -> Vec<Var> {
        self.proposition_vars(false)
    }

    /// Next-state proposition variables, sorted.
    pub fn primed_vars(&self) -> Vec<Var> {
        self.proposition_vars(true)
    }

    fn proposition_vars(&self, primed: bool) -> Vec<Var> {
        let mut vars: Vec<Var> = self
            .by_var
            .iter()
            .filter(|(_, name)| name.ends_with(PRIME) == primed)
            .map(|(&var, _)| var)
            .collect();
        vars.sort_unstable();
        vars
    }

    /// Whether variables were recorded with ids `0, 1, 2, ...` without gaps.
    pub fn is_consecutive(&self) -> bool {
        self.consecutive
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn model(names: &[&str]) -> VariableModel {
        let mut model = VariableModel::new();
        for (i, name) in names.iter().enumerate() {
            model.record(Var::from_index(i as u32), name);
        }
        model
    }

    #[test]
    fn test_classification() {
        let model = model(&["p", "p'", "jx", "jx", "strat_type", "q", "q'"]);

        assert_eq!(model.lookup("p", false).unwrap(), Var::from_index(0));
        assert_eq!(model.lookup("p", true).unwrap(), Var::from_index(1));
        assert_eq!(model.lookup("q", true).unwrap(), Var::from_index(6));
        assert_eq!(
            model.justice_vars(),
            [Var::from_index(2), Var::from_index(3)]
        );
        assert_eq!(model.phase_var(), Some(Var::from_index(4)));
        assert_eq!(
            model.current_vars(),
            [Var::from_index(0), Var::from_index(5)]
        );
        assert_eq!(model.primed_vars(), [Var::from_index(1), Var::from_index(6)]);
        assert_eq!(model.name_of(Var::from_index(6)), Some("q'"));
        assert_eq!(model.name_of(Var::from_index(2)), None);
        assert_eq!(model.len(), 7);
        assert!(model.is_consecutive());
    }

    #[test]
    fn test_reserved_names_are_not_propositions() {
        let model = model(&["jx", "strat_type"]);
        assert!(matches!(
            model.lookup("jx", false),
            Err(Error::UnknownVariableName(n)) if n == "jx"
        ));
        assert!(!model.contains("strat_type"));
    }

    #[test]
    fn test_unknown_primed_name() {
        let model = model(&["p"]);
        assert!(matches!(
            model.lookup("p", true),
            Err(Error::UnknownVariableName(n)) if n == "p'"
        ));
    }

    #[test]
    fn test_gap_in_ids() {
        let mut model = VariableModel::new();
        model.record(Var::from_index(0), "a");
        model.record(Var::from_index(2), "b");
        assert!(!model.is_consecutive());
        assert_eq!(model.lookup("b", false).unwrap(), Var::from_index(2));
    }
}
