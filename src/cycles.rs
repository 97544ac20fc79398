//! Cycle detection over the registered dependency graph.
//!
//! This is an advisory pass, meant to run once after registration
//! completes rather than on the resolution path: it repeats constructor
//! selection for every implementation in the graph, which would be wasted
//! work per request. Resolution itself stays guarded by the thread-local
//! re-entrancy check either way.

use std::collections::HashMap;

use crate::descriptors::{ImplDescriptor, ParamSpec};
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::registration::{Registry, Strategy};
use crate::selector::select_constructor;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// Names of every service involved in a dependency cycle, sorted.
///
/// Bindings backed by user factories are skipped: factories are opaque
/// and assumed self-contained. Selector strategies contribute every
/// declared candidate, so a cycle through any one of them flags the
/// service.
pub(crate) fn find_cycles(registry: &Registry) -> Vec<&'static str> {
    let mut walker = Walker {
        registry,
        colors: HashMap::new(),
        stack: Vec::new(),
        flagged: Vec::new(),
    };

    for (key, _) in registry.iter() {
        walker.visit(key);
    }

    let mut names: Vec<&'static str> =
        walker.flagged.iter().map(|key| key.display_name()).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Fail-fast validation: every constructor-strategy binding must have a
/// viable constructor, and the graph must be acyclic.
pub(crate) fn validate(registry: &Registry) -> DiResult<()> {
    for (_, entry) in registry.iter() {
        let mut records = vec![&entry.active];
        records.extend(entry.history.iter());
        for record in records {
            match &record.strategy {
                Strategy::Constructor(desc) => {
                    select_constructor(desc.as_ref(), registry)?;
                }
                Strategy::Selector { candidates, .. } => {
                    for candidate in candidates.iter() {
                        select_constructor(candidate, registry)?;
                    }
                }
                Strategy::Factory(_) | Strategy::Instance(_) => {}
            }
        }
    }

    let cycles = find_cycles(registry);
    if cycles.is_empty() {
        Ok(())
    } else {
        Err(DiError::Circular(cycles))
    }
}

struct Walker<'a> {
    registry: &'a Registry,
    colors: HashMap<ServiceKey, Color>,
    stack: Vec<ServiceKey>,
    flagged: Vec<ServiceKey>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, key: &ServiceKey) {
        match self.colors.get(key) {
            Some(Color::Black) => return,
            Some(Color::Gray) => {
                self.mark_cycle_from(key);
                return;
            }
            None => {}
        }

        self.colors.insert(key.clone(), Color::Gray);
        self.stack.push(key.clone());

        for dep in self.dependencies_of(key) {
            if self.registry.contains(&dep) {
                self.visit(&dep);
            }
        }

        self.stack.pop();
        self.colors.insert(key.clone(), Color::Black);
    }

    /// Every stack entry from the back edge's target onward sits on the
    /// cycle.
    fn mark_cycle_from(&mut self, target: &ServiceKey) {
        if let Some(start) = self.stack.iter().position(|k| k == target) {
            for key in &self.stack[start..] {
                if !self.flagged.contains(key) {
                    self.flagged.push(key.clone());
                }
            }
        }
    }

    fn dependencies_of(&self, key: &ServiceKey) -> Vec<ServiceKey> {
        let mut deps = Vec::new();
        for record in self.registry.get_all(key) {
            match &record.strategy {
                // Opaque or prebuilt: no traversable edges.
                Strategy::Factory(_) | Strategy::Instance(_) => {}
                Strategy::Constructor(desc) => {
                    self.descriptor_deps(desc.as_ref(), &mut deps);
                }
                Strategy::Selector { candidates, .. } => {
                    for candidate in candidates.iter() {
                        self.descriptor_deps(candidate, &mut deps);
                    }
                }
            }
        }
        deps
    }

    fn descriptor_deps(&self, desc: &ImplDescriptor, deps: &mut Vec<ServiceKey>) {
        let params = match select_constructor(desc, self.registry) {
            Ok(ctor) => ctor.params().iter().chain(desc.member_params().iter()),
            // Unsatisfiable constructors are validation errors, not edges.
            Err(_) => return,
        };
        for param in params {
            match param {
                ParamSpec::Service(key) | ParamSpec::Collection(key) => {
                    if !deps.contains(key) {
                        deps.push(key.clone());
                    }
                }
                ParamSpec::Resolver => {}
            }
        }
    }
}
