use std::collections::{HashSet, VecDeque};

use super::layout::StepGraph;

// ---------------------------------------------------------------------------
// Step subset query
// ---------------------------------------------------------------------------

/// How far to walk the graph from a named step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    None,
    Levels(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause<'a> {
    name: &'a str,
    up: Reach,
    down: Reach,
}

/// Parse one clause such as `+load*`, `*report` or `++clean`.
///
/// Returns `None` for clauses without a name or with stray operators in the
/// middle.
fn parse_clause(token: &str) -> Option<Clause<'_>> {
    let mut up = Reach::None;
    let mut rest = token;
    if let Some(tail) = rest.strip_prefix('*') {
        up = Reach::All;
        rest = tail;
    } else {
        let levels = rest.len() - rest.trim_start_matches('+').len();
        if levels > 0 {
            up = Reach::Levels(levels);
            rest = &rest[levels..];
        }
    }

    let mut down = Reach::None;
    if let Some(head) = rest.strip_suffix('*') {
        down = Reach::All;
        rest = head;
    } else {
        let levels = rest.len() - rest.trim_end_matches('+').len();
        if levels > 0 {
            down = Reach::Levels(levels);
            rest = &rest[..rest.len() - levels];
        }
    }

    if rest.is_empty() || rest.contains(['*', '+']) {
        return None;
    }
    Some(Clause {
        name: rest,
        up,
        down,
    })
}

/// Breadth-first walk from `start`, at most `reach` hops away.
fn walk<'g>(
    start: usize,
    reach: Reach,
    neighbors: impl Fn(usize) -> &'g [usize],
    out: &mut HashSet<usize>,
) {
    let limit = match reach {
        Reach::None => return,
        Reach::Levels(n) => n,
        Reach::All => usize::MAX,
    };
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut seen = HashSet::from([start]);
    while let Some((node, dist)) = queue.pop_front() {
        if dist >= limit {
            continue;
        }
        for &next in neighbors(node) {
            if seen.insert(next) {
                out.insert(next);
                queue.push_back((next, dist + 1));
            }
        }
    }
}

/// Evaluate a step subset query against `graph`.
///
/// Clauses are separated by commas or whitespace and their results are
/// unioned. An empty query, or any bare `*` clause, selects every step.
/// Unknown step names and malformed clauses contribute nothing.
pub fn select_steps(graph: &StepGraph, query: &str) -> HashSet<String> {
    let tokens: Vec<&str> = query
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() || tokens.contains(&"*") {
        return graph.names().map(str::to_owned).collect();
    }

    let mut picked = HashSet::new();
    for token in tokens {
        let Some(clause) = parse_clause(token) else {
            tracing::debug!(token, "ignoring malformed step query clause");
            continue;
        };
        let Some(start) = graph.index_of(clause.name) else {
            continue;
        };
        picked.insert(start);
        walk(start, clause.up, |i| graph.upstream_of(i), &mut picked);
        walk(start, clause.down, |i| graph.downstream_of(i), &mut picked);
    }

    picked
        .into_iter()
        .map(|i| graph.name_at(i).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PipelineSnapshot, StepHandle};

    /// a -> b -> c -> d, plus e -> c.
    fn graph() -> StepGraph {
        let step = |name: &str, deps: &[&str]| StepHandle {
            name: name.to_owned(),
            depends_on: deps.iter().map(|d| (*d).to_owned()).collect(),
            depended_by: vec![],
        };
        StepGraph::from_snapshot(&PipelineSnapshot {
            steps: vec![
                step("a", &[]),
                step("b", &["a"]),
                step("c", &["b", "e"]),
                step("d", &["c"]),
                step("e", &[]),
            ],
        })
    }

    fn sorted(set: HashSet<String>) -> Vec<String> {
        let mut v: Vec<String> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn empty_and_star_select_everything() {
        let g = graph();
        assert_eq!(select_steps(&g, "").len(), 5);
        assert_eq!(select_steps(&g, "  * ").len(), 5);
        assert_eq!(select_steps(&g, "c, *").len(), 5);
        assert_eq!(select_steps(&g, "* nope").len(), 5);
    }

    #[test]
    fn plain_name_selects_only_that_step() {
        assert_eq!(sorted(select_steps(&graph(), "c")), vec!["c"]);
    }

    #[test]
    fn all_ancestors() {
        assert_eq!(sorted(select_steps(&graph(), "*c")), vec!["a", "b", "c", "e"]);
    }

    #[test]
    fn one_level_each_way() {
        assert_eq!(sorted(select_steps(&graph(), "+c+")), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn two_levels_up() {
        assert_eq!(sorted(select_steps(&graph(), "++d")), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn all_descendants_and_union() {
        assert_eq!(sorted(select_steps(&graph(), "b*, e")), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn unknown_and_malformed_select_nothing() {
        let g = graph();
        assert!(select_steps(&g, "nope").is_empty());
        assert!(select_steps(&g, "a+b").is_empty());
        assert!(select_steps(&g, "++").is_empty());
    }

    #[test]
    fn parse_clause_operators() {
        let c = parse_clause("*x++").unwrap();
        assert_eq!(c.name, "x");
        assert_eq!(c.up, Reach::All);
        assert_eq!(c.down, Reach::Levels(2));
    }
}
