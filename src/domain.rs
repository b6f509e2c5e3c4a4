//! Propositions and multi-valued domains.
//!
//! A [`Domain`] is a named variable ranging over a list of values. It is stored
//! as `num_bits` Boolean propositions named `<name>_b<i>`, holding the binary code
//! of the value's index. [`PropositionConfig::expand`] turns domain values into
//! those bits and [`PropositionConfig::collapse`] reverses it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// Significance of the domain bit `<name>_b0`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BitOrder {
    /// `_b0` is the most significant bit.
    #[default]
    MsbFirst,
    /// `_b0` is the least significant bit.
    LsbFirst,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Domain {
    name: String,
    values: Vec<String>,
    bit_order: BitOrder,
    num_bits: usize,
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
        bit_order: BitOrder,
    ) -> Result<Self> {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(Error::configuration(format!("domain {:?} has no values", name)));
        }

        // At least one bit, even for a single value.
        let num_bits = if values.len() == 1 {
            1
        } else {
            (usize::BITS - (values.len() - 1).leading_zeros()) as usize
        };

        Ok(Self {
            name,
            values,
            bit_order,
            num_bits,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn bit_name(&self, i: usize) -> String {
        format!("{}_b{}", self.name, i)
    }

    pub fn bit_names(&self) -> Vec<String> {
        (0..self.num_bits).map(|i| self.bit_name(i)).collect()
    }

    fn weight(&self, i: usize) -> usize {
        match self.bit_order {
            BitOrder::MsbFirst => 1 << (self.num_bits - 1 - i),
            BitOrder::LsbFirst => 1 << i,
        }
    }

    /// Bits of the value `index`, in `bit_names` order.
    pub fn encode(&self, index: usize) -> Result<Vec<bool>> {
        if index >= self.values.len() {
            return Err(Error::configuration(format!(
                "value {} is out of range for domain {:?} with {} values",
                index,
                self.name,
                self.values.len()
            )));
        }
        Ok((0..self.num_bits)
            .map(|i| index & self.weight(i) != 0)
            .collect())
    }

    /// Value index encoded by `bits`, given in `bit_names` order.
    pub fn decode(&self, bits: &[bool]) -> Result<usize> {
        assert_eq!(bits.len(), self.num_bits);
        let index: usize = bits
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b)
            .map(|(i, _)| self.weight(i))
            .sum();
        if index >= self.values.len() {
            return Err(Error::configuration(format!(
                "bits of domain {:?} encode {}, but it only has {} values",
                self.name,
                index,
                self.values.len()
            )));
        }
        Ok(index)
    }
}

/// Value of a proposition or domain in an [`Assignment`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    /// Index into the domain's value list.
    Index(usize),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<usize> for Value {
    fn from(index: usize) -> Self {
        Value::Index(index)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Index(i) => write!(f, "#{}", i),
        }
    }
}

/// Proposition and domain names to values.
pub type Assignment = BTreeMap<String, Value>;

/// Bit-level proposition names to values; domains appear as their bits.
pub type BitAssignment = BTreeMap<String, bool>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Proposition {
    Bool(String),
    Domain(Domain),
}

impl Proposition {
    pub fn name(&self) -> &str {
        match self {
            Proposition::Bool(name) => name,
            Proposition::Domain(domain) => domain.name(),
        }
    }

    pub fn bit_names(&self) -> Vec<String> {
        match self {
            Proposition::Bool(name) => vec![name.clone()],
            Proposition::Domain(domain) => domain.bit_names(),
        }
    }
}

impl From<Domain> for Proposition {
    fn from(domain: Domain) -> Self {
        Proposition::Domain(domain)
    }
}

impl From<&str> for Proposition {
    fn from(name: &str) -> Self {
        Proposition::Bool(name.to_string())
    }
}

/// The configured propositions, in a fixed order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PropositionConfig {
    propositions: Vec<Proposition>,
    bit_names: Vec<String>,
}

impl PropositionConfig {
    pub fn new(propositions: impl IntoIterator<Item = Proposition>) -> Result<Self> {
        let propositions: Vec<Proposition> = propositions.into_iter().collect();
        let bit_names: Vec<String> = propositions.iter().flat_map(|p| p.bit_names()).collect();

        // A boolean proposition is its own bit, so clashes between a boolean and
        // a domain bit show up among the bit names.
        for names in [
            propositions.iter().map(|p| p.name()).collect::<Vec<_>>(),
            bit_names.iter().map(String::as_str).collect(),
        ] {
            let mut seen = HashSet::new();
            if let Some(name) = names.into_iter().find(|&name| !seen.insert(name)) {
                return Err(Error::configuration(format!(
                    "proposition name {:?} is used twice",
                    name
                )));
            }
        }

        Ok(Self {
            propositions,
            bit_names,
        })
    }

    pub fn propositions(&self) -> &[Proposition] {
        &self.propositions
    }

    pub fn get(&self, name: &str) -> Option<&Proposition> {
        self.propositions.iter().find(|p| p.name() == name)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        match self.get(name) {
            Some(Proposition::Domain(domain)) => Some(domain),
            _ => None,
        }
    }

    /// Proposition and domain names, domains unexpanded.
    pub fn names(&self) -> Vec<&str> {
        self.propositions.iter().map(|p| p.name()).collect()
    }

    /// Flat list of bit-level proposition names, domains expanded in place.
    pub fn bit_names(&self) -> &[String] {
        &self.bit_names
    }

    /// Translate a (possibly partial) assignment into bit-level values.
    pub fn expand(&self, assignment: &Assignment) -> Result<BitAssignment> {
        let mut bits = BitAssignment::new();
        for (name, &value) in assignment {
            match (self.get(name), value) {
                (None, _) => return Err(Error::UnknownVariableName(name.clone())),
                (Some(Proposition::Bool(_)), Value::Bool(b)) => {
                    bits.insert(name.clone(), b);
                }
                (Some(Proposition::Domain(domain)), Value::Index(index)) => {
                    let code = domain.encode(index)?;
                    bits.extend(domain.bit_names().into_iter().zip(code));
                }
                (Some(Proposition::Bool(_)), Value::Index(_)) => {
                    return Err(Error::configuration(format!(
                        "proposition {:?} expects a boolean, got {}",
                        name, value
                    )))
                }
                (Some(Proposition::Domain(_)), Value::Bool(_)) => {
                    return Err(Error::configuration(format!(
                        "domain {:?} expects a value index, got {}",
                        name, value
                    )))
                }
            }
        }
        Ok(bits)
    }

    /// Inverse of [`expand`][Self::expand].
    ///
    /// A domain must have either all or none of its bits assigned.
    pub fn collapse(&self, bits: &BitAssignment) -> Result<Assignment> {
        if let Some(name) = bits.keys().find(|&k| !self.bit_names.contains(k)) {
            return Err(Error::UnknownVariableName(name.clone()));
        }

        let mut assignment = Assignment::new();
        for proposition in &self.propositions {
            match proposition {
                Proposition::Bool(name) => {
                    if let Some(&b) = bits.get(name) {
                        assignment.insert(name.clone(), Value::Bool(b));
                    }
                }
                Proposition::Domain(domain) => {
                    let code: Vec<Option<bool>> = domain
                        .bit_names()
                        .iter()
                        .map(|bit| bits.get(bit).copied())
                        .collect();
                    if code.iter().all(Option::is_none) {
                        continue;
                    }
                    let code: Vec<bool> = code
                        .into_iter()
                        .collect::<Option<_>>()
                        .ok_or_else(|| {
                            Error::configuration(format!(
                                "domain {:?} is only partially assigned",
                                domain.name()
                            ))
                        })?;
                    let index = domain.decode(&code)?;
                    assignment.insert(domain.name().to_string(), Value::Index(index));
                }
            }
        }
        Ok(assignment)
    }

    /// Check that `assignment` gives every proposition a well-typed value and
    /// mentions nothing else.
    pub fn check_complete(&self, assignment: &Assignment) -> Result<()> {
        if let Some(missing) = self
            .propositions
            .iter()
            .find(|p| !assignment.contains_key(p.name()))
        {
            return Err(Error::configuration(format!(
                "state does not assign {:?}",
                missing.name()
            )));
        }
        // Unknown names and ill-typed or out-of-range values.
        self.expand(assignment).map(|_| ())
    }
}
