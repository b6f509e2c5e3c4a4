//! # bdd-strategy: symbolic queries over synthesized controller strategies
//!
//! A game synthesizer emits a winning strategy as one large transition relation
//! stored as a BDD. This crate loads such a strategy and answers two questions
//! about it without ever enumerating the relation:
//!
//! - which known states satisfy some proposition constraints
//!   ([`BddStrategy::search_for_states`][crate::strategy::BddStrategy::search_for_states]);
//! - which moves the strategy allows from a state, for a given justice goal and phase
//!   ([`BddStrategy::get_transitions`][crate::strategy::BddStrategy::get_transitions]).
//!
//! ## Architecture
//!
//! All Boolean functions live in one [`Bdd`][crate::bdd::Bdd] manager and are
//! handled through lightweight [`Ref`][crate::reference::Ref] handles. Nodes are
//! hash-consed, so two handles are equal iff they denote the same function.
//! Variables are 1-indexed; variable `k` of a strategy file is `Var::from_index(k)`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::rc::Rc;
//!
//! use bdd_strategy::bdd::Bdd;
//! use bdd_strategy::domain::{Assignment, BitOrder, Domain, Proposition, PropositionConfig, Value};
//! use bdd_strategy::strategy::{BddStrategy, Phase};
//!
//! # fn main() -> bdd_strategy::error::Result<()> {
//! let region = Domain::new("region", ["p1", "p2", "p3"], BitOrder::MsbFirst)?;
//! let config = PropositionConfig::new([
//!     Proposition::from("person"),
//!     Proposition::from("radio"),
//!     Proposition::from(region),
//! ])?;
//!
//! let mut strategy = BddStrategy::new(Rc::new(Bdd::default()));
//! strategy.configure_propositions(config);
//! strategy.load_from_file("robot.bdd")?;
//!
//! let partial = Assignment::from([("person".to_string(), Value::Bool(false))]);
//! for state in strategy.search_for_states(&partial, None)? {
//!     let state = state?;
//!     println!("{}", state);
//!     let moves = strategy.get_transitions(&state, 0, "Y")?;
//!     println!("  {} transition nodes", strategy.bdd().size(moves));
//!     for next in strategy.successors(&state, 0, Phase::Y)? {
//!         println!("  -> {}", next?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the manager with the Boolean operations and existential abstraction.
//! - **[`dddmp`]**: reader and writer of the DDDMP text format strategies are stored in.
//! - **[`cubes`]**: enumeration of total assignments over a set of variables.
//! - **[`loader`]**: strategy files, with their variable-name metadata.
//! - **[`strategy`]**: the query engine.

pub mod bdd;
pub mod cache;
pub mod cubes;
pub mod dddmp;
pub mod domain;
pub mod error;
pub mod loader;
pub mod reference;
pub mod state;
pub mod strategy;
pub mod table;
pub mod types;
pub mod utils;
pub mod variables;
