//! `depends_on` ordering for bulk component registration.

use std::collections::HashSet;

use crate::error::{DiError, DiResult};

/// Orders `entries` so every entry comes after the entries it depends on.
///
/// Stable: entries without a constraint between them keep their input order.
/// Dependencies on ids that are not part of `entries` and self-dependencies
/// are ignored. Any cycle fails with [`DiError::InvalidConfig`] naming the ids
/// on it; nothing is returned in that case, so callers can reject the whole
/// batch before registering any of it.
pub(crate) fn order_by_dependencies<T>(
    entries: Vec<(String, T)>,
    depends_on: impl Fn(&T) -> Vec<String>,
) -> DiResult<Vec<(String, T)>> {
    let ids: HashSet<String> = entries.iter().map(|(id, _)| id.clone()).collect();
    let mut pending: Vec<(String, T, Vec<String>)> = entries
        .into_iter()
        .map(|(id, entry)| {
            let deps = depends_on(&entry)
                .into_iter()
                .filter(|dep| dep != &id && ids.contains(dep))
                .collect();
            (id, entry, deps)
        })
        .collect();

    let mut placed: HashSet<String> = HashSet::with_capacity(pending.len());
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|(_, _, deps)| deps.iter().all(|dep| placed.contains(dep)));
        match ready {
            Some(index) => {
                let (id, entry, _) = pending.remove(index);
                placed.insert(id.clone());
                ordered.push((id, entry));
            }
            None => {
                let edges: Vec<(&str, &[String])> =
                    pending.iter().map(|(id, _, deps)| (id.as_str(), deps.as_slice())).collect();
                return Err(DiError::invalid(format!(
                    "Circular dependency between components: {}",
                    cycle_path(&edges, &placed).join(" -> ")
                )));
            }
        }
    }
    Ok(ordered)
}

/// Follows unplaced dependencies from the first pending entry until an id repeats.
fn cycle_path(edges: &[(&str, &[String])], placed: &HashSet<String>) -> Vec<String> {
    let mut path: Vec<String> = Vec::new();
    let mut current = edges[0].0.to_string();
    loop {
        if let Some(start) = path.iter().position(|id| *id == current) {
            let mut cycle = path.split_off(start);
            cycle.push(current);
            return cycle;
        }
        path.push(current.clone());
        let next = edges
            .iter()
            .find(|(id, _)| *id == current)
            .and_then(|(_, deps)| deps.iter().find(|dep| !placed.contains(*dep)));
        match next {
            Some(dep) => current = dep.clone(),
            None => return path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn order(entries: &[(&str, &[&str])]) -> DiResult<Vec<String>> {
        let entries = entries
            .iter()
            .map(|(id, deps)| (id.to_string(), deps.iter().map(|d| d.to_string()).collect::<Vec<_>>()))
            .collect();
        order_by_dependencies(entries, |deps: &Vec<String>| deps.clone())
            .map(|ordered| ordered.into_iter().map(|(id, _)| id).collect())
    }

    #[test]
    fn test_dependency_moves_before_dependent() {
        let ordered = order(&[("mailer", &["log"]), ("cache", &[]), ("log", &[])]).unwrap();
        assert_eq!(ordered, vec!["cache", "log", "mailer"]);
    }

    #[test]
    fn test_transitive_chains_are_respected() {
        let ordered = order(&[("c", &["b"]), ("b", &["a"]), ("a", &[])]).unwrap();
        assert_eq!(ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_and_self_dependencies_are_ignored() {
        let ordered = order(&[("a", &["a", "elsewhere"]), ("b", &[])]).unwrap();
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn test_mutual_dependency_names_both_ids() {
        let err = order(&[("x", &[]), ("a", &["b"]), ("b", &["a"])]).unwrap_err();
        assert!(err.is_invalid_config());
        let msg = err.to_string();
        assert!(msg.contains("a -> b -> a"), "{}", msg);
    }

    #[test]
    fn test_longer_cycle_is_reported() {
        let err = order(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"])]).unwrap_err();
        assert!(err.to_string().contains("a -> c -> b -> a"));
    }

    proptest! {
        #[test]
        fn prop_acyclic_inputs_respect_every_edge(edges in proptest::collection::vec(proptest::collection::vec(0usize..8, 0..4), 1..8)) {
            // Only edges pointing at lower indices: always acyclic
            let entries: Vec<(String, Vec<String>)> = edges
                .iter()
                .enumerate()
                .map(|(i, deps)| {
                    let deps = deps.iter().filter(|d| **d < i).map(|d| format!("c{}", d)).collect();
                    (format!("c{}", i), deps)
                })
                .collect();
            let ordered = order_by_dependencies(entries.clone(), |deps: &Vec<String>| deps.clone()).unwrap();
            prop_assert_eq!(ordered.len(), entries.len());
            let position = |id: &str| ordered.iter().position(|(o, _)| o == id).unwrap();
            for (id, deps) in &entries {
                for dep in deps {
                    prop_assert!(position(dep) < position(id));
                }
            }
        }
    }
}
