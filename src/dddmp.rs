//! Textual DDDMP format, as written by CUDD's `dddmp` package.
//!
//! # Format
//!
//! ```text
//! .ver DDDMP-2.0
//! .add                      # or .bdd
//! .mode A                   # text mode; binary mode `B` is not supported
//! .varinfo 0
//! .dd <name>
//! .nnodes <count>
//! .nvars <count>
//! .nsuppvars <count>
//! .suppvarnames <name>*
//! .orderedvarnames <name>*
//! .ids <id>*                # variable ids of the support, in support order
//! .permids <id>*
//! .nroots <count>
//! .rootids <node>*
//! .nodes
//! <node> T <value> 0 0      # terminal
//! <node> [<info>] <supp-index> <then> <else>
//! .end
//! ```
//!
//! Nodes appear bottom-up (children before parents). The `supp-index` of an
//! internal node is translated through `.ids`, i.e. variables are matched by id.
//! File variable id `k` is manager variable `Var::from_index(k)`.
//!
//! ADD files are coerced into BDDs: a nonzero terminal is `true`.
//! In BDD files a negative `else` index denotes a complemented edge.
//!
//! Lines starting with `#` are comments and may appear anywhere.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::Var;

#[derive(Debug, Error)]
pub enum DddmpError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("missing `{0}` section")]
    Missing(&'static str),

    #[error("unsupported DDDMP mode {0:?}, only text mode `A` is supported")]
    UnsupportedMode(String),

    #[error("line {line}: reference to undefined node {node}")]
    UndefinedNode { line: usize, node: i64 },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DdType {
    #[default]
    Bdd,
    Add,
}

/// Header fields of a DDDMP file. Absent fields stay `None` or empty.
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub version: Option<String>,
    pub dd_type: DdType,
    pub varinfo: Option<u32>,
    pub name: Option<String>,
    pub nnodes: Option<usize>,
    pub nvars: Option<usize>,
    pub nsuppvars: Option<usize>,
    pub supp_var_names: Vec<String>,
    pub ordered_var_names: Vec<String>,
    pub ids: Vec<u32>,
    pub perm_ids: Vec<u32>,
    pub aux_ids: Vec<u32>,
    pub nroots: Option<usize>,
    pub root_ids: Vec<i64>,
}

fn parse<T: FromStr>(line: usize, token: &str) -> Result<T, DddmpError> {
    token.parse().map_err(|_| DddmpError::Parse {
        line,
        message: format!("invalid number {:?}", token),
    })
}

fn parse_list<T: FromStr>(line: usize, rest: &str) -> Result<Vec<T>, DddmpError> {
    rest.split_whitespace().map(|t| parse(line, t)).collect()
}

fn words(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

/// Load the first root of a DDDMP file.
pub fn load(bdd: &Bdd, text: &str) -> Result<Ref, DddmpError> {
    let (_, roots) = load_roots(bdd, text)?;
    roots.first().copied().ok_or(DddmpError::Missing(".rootids"))
}

/// Load the header and every root of a DDDMP file.
pub fn load_roots(bdd: &Bdd, text: &str) -> Result<(Header, Vec<Ref>), DddmpError> {
    let mut header = Header::default();
    let mut nodes: HashMap<i64, Ref> = HashMap::new();
    let mut in_nodes = false;
    let mut finished = false;

    let resolve = |nodes: &HashMap<i64, Ref>, line: usize, node: i64| -> Result<Ref, DddmpError> {
        let f = node
            .checked_abs()
            .and_then(|id| nodes.get(&id))
            .copied()
            .ok_or(DddmpError::UndefinedNode { line, node })?;
        Ok(if node < 0 { -f } else { f })
    };

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        if !in_nodes {
            let (key, rest) = content
                .split_once(char::is_whitespace)
                .unwrap_or((content, ""));
            let rest = rest.trim();
            match key {
                ".ver" => header.version = Some(rest.to_string()),
                ".add" => header.dd_type = DdType::Add,
                ".bdd" => header.dd_type = DdType::Bdd,
                ".mode" => {
                    if rest != "A" {
                        return Err(DddmpError::UnsupportedMode(rest.to_string()));
                    }
                }
                ".varinfo" => header.varinfo = Some(parse(line, rest)?),
                ".dd" => header.name = Some(rest.to_string()),
                ".nnodes" => header.nnodes = Some(parse(line, rest)?),
                ".nvars" => header.nvars = Some(parse(line, rest)?),
                ".nsuppvars" => header.nsuppvars = Some(parse(line, rest)?),
                ".suppvarnames" => header.supp_var_names = words(rest),
                ".orderedvarnames" => header.ordered_var_names = words(rest),
                ".ids" => header.ids = parse_list(line, rest)?,
                ".permids" => header.perm_ids = parse_list(line, rest)?,
                ".auxids" => header.aux_ids = parse_list(line, rest)?,
                ".nroots" => header.nroots = Some(parse(line, rest)?),
                ".rootids" => header.root_ids = parse_list(line, rest)?,
                ".nodes" => in_nodes = true,
                _ if key.starts_with('.') => debug!("Ignoring DDDMP header key {}", key),
                _ => {
                    return Err(DddmpError::Parse {
                        line,
                        message: format!("unexpected line {:?} in header", content),
                    })
                }
            }
            continue;
        }

        if content == ".end" {
            finished = true;
            break;
        }

        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(DddmpError::Parse {
                line,
                message: format!("node line {:?} has too few fields", content),
            });
        }
        let id: i64 = parse(line, tokens[0])?;

        let f = if tokens[1] == "T" {
            let value: f64 = parse(line, tokens[2])?;
            match header.dd_type {
                DdType::Add if value == 0.0 => bdd.zero(),
                _ => bdd.one(),
            }
        } else {
            let n = tokens.len();
            let index: u32 = parse(line, tokens[n - 3])?;
            let then: i64 = parse(line, tokens[n - 2])?;
            let els: i64 = parse(line, tokens[n - 1])?;

            let file_id = if header.ids.is_empty() {
                index
            } else {
                *header
                    .ids
                    .get(index as usize)
                    .ok_or_else(|| DddmpError::Parse {
                        line,
                        message: format!("support index {} out of range", index),
                    })?
            };

            let var = Var::checked_from_index(file_id).ok_or_else(|| DddmpError::Parse {
                line,
                message: format!("variable id {} out of range", file_id),
            })?;

            let t = resolve(&nodes, line, then)?;
            let e = resolve(&nodes, line, els)?;
            let x = bdd.mk_var(var);
            bdd.apply_ite(x, t, e)
        };

        nodes.insert(id, f);
    }

    if !in_nodes {
        return Err(DddmpError::Missing(".nodes"));
    }
    if !finished {
        return Err(DddmpError::Missing(".end"));
    }
    if let Some(nnodes) = header.nnodes {
        if nnodes != nodes.len() {
            warn!(
                "DDDMP header announces {} nodes, but {} were read",
                nnodes,
                nodes.len()
            );
        }
    }
    if header.root_ids.is_empty() {
        return Err(DddmpError::Missing(".rootids"));
    }

    let roots = header
        .root_ids
        .iter()
        .map(|&r| resolve(&nodes, 0, r))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Loaded DDDMP {:?} with {} nodes and {} roots",
        header.name,
        nodes.len(),
        roots.len()
    );
    Ok((header, roots))
}

/// Write `root` as a text-mode ADD with 0/1 terminals.
///
/// `var_names[k]` names the variable `Var::from_index(k)`; missing names are generated.
pub fn store(bdd: &Bdd, root: Ref, name: &str, var_names: &[String]) -> String {
    let support = bdd.support(root);
    let position: HashMap<u32, usize> = support
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id(), i))
        .collect();
    let var_name = |index: u32| {
        var_names
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| format!("v{}", index))
    };

    let mut ids = HashMap::new();
    let mut lines = Vec::new();
    let root_id = number_nodes(bdd, root, &position, &mut ids, &mut lines);

    let nvars = support
        .iter()
        .map(|v| v.index() as usize + 1)
        .max()
        .unwrap_or(0)
        .max(var_names.len());
    let supp_ids: Vec<String> = support.iter().map(|v| v.index().to_string()).collect();
    let supp_names: Vec<String> = support.iter().map(|v| var_name(v.index())).collect();
    let ordered_names: Vec<String> = (0..nvars as u32).map(var_name).collect();

    let mut output = String::new();
    writeln!(output, ".ver DDDMP-2.0").unwrap();
    writeln!(output, ".add").unwrap();
    writeln!(output, ".mode A").unwrap();
    writeln!(output, ".varinfo 0").unwrap();
    writeln!(output, ".dd {}", name).unwrap();
    writeln!(output, ".nnodes {}", lines.len()).unwrap();
    writeln!(output, ".nvars {}", nvars).unwrap();
    writeln!(output, ".nsuppvars {}", support.len()).unwrap();
    writeln!(output, ".suppvarnames {}", supp_names.join(" ")).unwrap();
    writeln!(output, ".orderedvarnames {}", ordered_names.join(" ")).unwrap();
    writeln!(output, ".ids {}", supp_ids.join(" ")).unwrap();
    writeln!(output, ".permids {}", supp_ids.join(" ")).unwrap();
    writeln!(output, ".nroots 1").unwrap();
    writeln!(output, ".rootids {}", root_id).unwrap();
    writeln!(output, ".nodes").unwrap();
    for line in &lines {
        writeln!(output, "{}", line).unwrap();
    }
    writeln!(output, ".end").unwrap();
    output
}

// ADD nodes carry no complement flag, so `f` and `~f` are numbered separately.
fn number_nodes(
    bdd: &Bdd,
    f: Ref,
    position: &HashMap<u32, usize>,
    ids: &mut HashMap<Ref, usize>,
    lines: &mut Vec<String>,
) -> usize {
    if let Some(&id) = ids.get(&f) {
        return id;
    }

    let body = if bdd.is_terminal(f) {
        format!("T {} 0 0", if bdd.is_one(f) { 1 } else { 0 })
    } else {
        let v = bdd.variable(f.index());
        let then = number_nodes(bdd, bdd.high_node(f), position, ids, lines);
        let els = number_nodes(bdd, bdd.low_node(f), position, ids, lines);
        format!("{} {} {} {}", v - 1, position[&v], then, els)
    };

    let id = lines.len() + 1;
    lines.push(format!("{} {}", id, body));
    ids.insert(f, id);
    id
}
