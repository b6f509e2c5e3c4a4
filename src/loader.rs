//! Loading of synthesized strategy files.
//!
//! A strategy file is a DDDMP text file whose comment lines carry a metadata
//! section naming every variable:
//!
//! ```text
//! # Variable names:
//! #   0: <p>
//! #   1: <p'>
//! #   2: <jx>
//! #   3: <strat_type>
//!
//! .ver DDDMP-2.0
//! ...
//! ```
//!
//! The variable list ends at the first line that is not a variable line,
//! blank lines included.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use log::{debug, info};
use regex::Regex;

use crate::bdd::Bdd;
use crate::dddmp;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::types::Var;
use crate::variables::VariableModel;

/// Line opening the metadata section.
pub const METADATA_HEADER: &str = "# Variable names:";

fn variable_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s*([0-9]+)\s*:\s*<([A-Za-z0-9_]+'?)>").expect("valid regex"))
}

fn legacy_bit_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^bit([0-9]+)('?)$").expect("valid regex"))
}

/// Rewrite legacy region bit names: `bit<N>` becomes `region_b<N>`, keeping a prime.
pub fn canonical_name(name: &str) -> String {
    legacy_bit_name()
        .replace(name, "region_b${1}${2}")
        .into_owned()
}

/// Parse the metadata section into `(file id, name)` pairs in file order.
///
/// Names are returned after the legacy bit-name rewrite.
pub fn parse_metadata(text: &str) -> Result<Vec<(u32, String)>> {
    let mut lines = text.lines();
    if !lines.any(|line| line.trim_end() == METADATA_HEADER) {
        return Err(Error::malformed(format!(
            "no `{}` section found",
            METADATA_HEADER
        )));
    }

    let mut variables = Vec::new();
    for line in lines {
        let Some(caps) = variable_line().captures(line) else {
            break;
        };
        let id = caps[1]
            .parse::<u32>()
            .ok()
            .filter(|&id| id <= Var::MAX_INDEX)
            .ok_or_else(|| Error::malformed(format!("variable id {} is out of range", &caps[1])))?;
        variables.push((id, canonical_name(&caps[2])));
    }
    Ok(variables)
}

/// Relation and variable model read from a strategy file.
#[derive(Debug, Clone)]
pub struct LoadedStrategy {
    pub relation: Ref,
    pub variables: VariableModel,
}

/// Load a strategy from its textual contents.
pub fn load_from_str(bdd: &Bdd, text: &str) -> Result<LoadedStrategy> {
    let relation = dddmp::load(bdd, text)?;
    debug!("Relation has {} nodes", bdd.size(relation));

    let mut variables = VariableModel::new();
    for (id, name) in parse_metadata(text)? {
        variables.record(Var::from_index(id), &name);
    }

    Ok(LoadedStrategy {
        relation,
        variables,
    })
}

pub fn load_from_reader<R: Read>(bdd: &Bdd, mut reader: R) -> Result<LoadedStrategy> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    load_from_str(bdd, &text)
}

pub fn load_from_file(bdd: &Bdd, path: impl AsRef<Path>) -> Result<LoadedStrategy> {
    let path = path.as_ref();
    info!("Loading strategy from file '{}'...", path.display());
    let start = Instant::now();

    let text = fs::read_to_string(path)?;
    let loaded = load_from_str(bdd, &text)?;

    info!(
        "Loaded {} variables in {:.3} seconds",
        loaded.variables.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(loaded)
}
