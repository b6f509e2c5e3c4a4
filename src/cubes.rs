//! Enumeration of cubes over a chosen set of variables.
//!
//! A cube over `V` fixes every variable of `V`, so it is a single total
//! assignment over `V`. [`Bdd::cubes`] partitions the `V`-projection of a
//! function into such cubes. The partition is not a minimal cover.
//!
//! # Example
//!
//! ```
//! use bdd_strategy::bdd::Bdd;
//! use bdd_strategy::types::Var;
//!
//! let bdd = Bdd::default();
//! let x = Var::new(1);
//! let y = Var::new(2);
//!
//! // x OR y has three models over {x, y}
//! let f = bdd.apply_or(bdd.mk_var(x), bdd.mk_var(y));
//! assert_eq!(bdd.cubes(f, &[x, y]).count(), 3);
//!
//! // ...but only two over {x}
//! assert_eq!(bdd.cubes(f, &[x]).count(), 2);
//! ```

use log::debug;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Narrow `f` to one total assignment over `vars`, preferring `false` per variable.
    ///
    /// Returns `f` constrained by one literal per variable, or `zero` if `f` is `zero`.
    /// The result is non-false and implies `f` whenever `f` is non-false.
    pub fn pick_cube(&self, f: Ref, vars: &[Var]) -> Ref {
        let mut cube = f;
        if self.is_zero(cube) {
            return cube;
        }
        for &v in vars {
            let x = self.mk_var(v);
            let low = self.apply_and(cube, -x);
            cube = if self.is_zero(low) {
                self.apply_and(cube, x)
            } else {
                low
            };
        }
        cube
    }

    /// Lazily enumerate disjoint cubes over `vars` covering the `vars`-projection of `f`.
    pub fn cubes(&self, f: Ref, vars: &[Var]) -> Cubes<'_> {
        Cubes {
            bdd: self,
            rest: f,
            vars: vars.to_vec(),
        }
    }

    /// Values of `vars` fixed by `cube`, in the order of `vars`.
    ///
    /// A variable counts as `true` when `cube` is compatible with it being true,
    /// so the result is only meaningful for variables the cube actually fixes.
    pub fn cube_values(&self, cube: Ref, vars: &[Var]) -> Vec<bool> {
        vars.iter()
            .map(|&v| !self.is_zero(self.apply_and(cube, self.mk_var(v))))
            .collect()
    }
}

/// Iterator returned by [`Bdd::cubes`].
///
/// Each step removes the yielded cube from the remaining function.
#[derive(Debug)]
pub struct Cubes<'a> {
    bdd: &'a Bdd,
    rest: Ref,
    vars: Vec<Var>,
}

impl Cubes<'_> {
    /// Variables every yielded cube fixes.
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }
}

impl Iterator for Cubes<'_> {
    type Item = Ref;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bdd.is_zero(self.rest) {
            return None;
        }

        // Nothing to fix: the whole function is the only cube.
        if self.vars.is_empty() {
            let f = self.rest;
            self.rest = self.bdd.zero();
            return Some(f);
        }

        let cube = self.bdd.pick_cube(self.rest, &self.vars);
        debug!("cube {} picked from {}", cube, self.rest);
        self.rest = self.bdd.apply_and(self.rest, -cube);
        Some(cube)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use num_bigint::BigUint;
    use test_log::test;

    use super::*;

    fn vars(n: u32) -> Vec<Var> {
        (1..=n).map(Var::new).collect()
    }

    #[test]
    fn test_pick_cube_prefers_false() {
        let bdd = Bdd::default();
        let v = vars(3);
        let f = bdd.apply_or(bdd.mk_var(v[0]), bdd.mk_var(v[2]));
        let cube = bdd.pick_cube(f, &v);
        assert_eq!(bdd.cube_values(cube, &v), [false, false, true]);
        assert_eq!(bdd.apply_and(cube, f), cube);
    }

    #[test]
    fn test_pick_cube_of_zero() {
        let bdd = Bdd::default();
        assert!(bdd.is_zero(bdd.pick_cube(bdd.zero(), &vars(2))));
    }

    #[test]
    fn test_cubes_partition() {
        let bdd = Bdd::default();
        let v = vars(4);
        let x: Vec<Ref> = v.iter().map(|&v| bdd.mk_var(v)).collect();
        // (x1 XOR x2) OR (x3 AND NOT x4)
        let f = bdd.apply_or(
            bdd.apply_xor(x[0], x[1]),
            bdd.apply_and(x[2], -x[3]),
        );

        let cubes: Vec<Ref> = bdd.cubes(f, &v).collect();
        assert_eq!(
            BigUint::from(cubes.len()),
            bdd.sat_count(f, v.len())
        );

        let distinct: HashSet<Vec<bool>> = cubes.iter().map(|&c| bdd.cube_values(c, &v)).collect();
        assert_eq!(distinct.len(), cubes.len());

        for (i, &a) in cubes.iter().enumerate() {
            for &b in &cubes[i + 1..] {
                assert!(bdd.is_zero(bdd.apply_and(a, b)));
            }
        }
        assert_eq!(bdd.apply_or_many(cubes), f);
    }

    #[test]
    fn test_cubes_over_subset() {
        let bdd = Bdd::default();
        let v = vars(3);
        let x: Vec<Ref> = v.iter().map(|&v| bdd.mk_var(v)).collect();
        let f = bdd.apply_and(x[0], bdd.apply_or(x[1], x[2]));

        let subset = [v[0], v[1]];
        let cubes: Vec<Vec<bool>> = bdd
            .cubes(f, &subset)
            .map(|c| bdd.cube_values(c, &subset))
            .collect();
        assert_eq!(cubes, [vec![true, false], vec![true, true]]);

        let projection = bdd.exists(f, &[v[2]]);
        assert_eq!(bdd.cubes(f, &subset).count(), 2);
        let cover = bdd.apply_or_many(bdd.cubes(f, &subset).collect::<Vec<_>>());
        assert_eq!(bdd.exists(cover, &[v[2]]), projection);
    }

    #[test]
    fn test_cubes_without_vars() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(Var::new(1));

        let cubes: Vec<Ref> = bdd.cubes(x, &[]).collect();
        assert_eq!(cubes, [x]);
        assert_eq!(bdd.cubes(bdd.zero(), &[]).count(), 0);
    }

    #[test]
    fn test_cubes_of_constants() {
        let bdd = Bdd::default();
        let v = vars(3);
        assert_eq!(bdd.cubes(bdd.one(), &v).count(), 8);
        assert_eq!(bdd.cubes(bdd.zero(), &v).count(), 0);
    }
}
