//! Constructor selection over registered services.
//!
//! A constructor is viable when every declared parameter is satisfiable
//! against the registry: exact identity match, family-template match for
//! parameterized identities, at least one registered provider for
//! collection parameters, and always for resolver parameters. Among
//! viable constructors the one with the most parameters wins (richest
//! injection); ties go to the earliest declared.

use crate::descriptors::{ConstructorDescriptor, ImplDescriptor, ParamSpec};
use crate::error::{DiError, DiResult};
use crate::registration::Registry;

/// Picks the best constructor for `implementation`, or fails naming it.
pub(crate) fn select_constructor<'a>(
    implementation: &'a ImplDescriptor,
    registry: &Registry,
) -> DiResult<&'a ConstructorDescriptor> {
    let mut best: Option<&'a ConstructorDescriptor> = None;
    for ctor in implementation.constructors() {
        if !ctor.params().iter().all(|p| is_satisfiable(p, registry)) {
            continue;
        }
        match best {
            Some(current) if ctor.params().len() <= current.params().len() => {}
            _ => best = Some(ctor),
        }
    }
    best.ok_or(DiError::NoSuitableConstructor(implementation.type_name()))
}

pub(crate) fn is_satisfiable(param: &ParamSpec, registry: &Registry) -> bool {
    match param {
        ParamSpec::Resolver => true,
        ParamSpec::Service(key) => registry.contains(key) || registry.has_template_for(key),
        ParamSpec::Collection(element) => registry.contains(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::ImplDescriptor;
    use crate::key::key_of;
    use crate::registration::Binding;
    use crate::traits::Resolver;

    struct Logger;
    struct Widget;

    fn widget_descriptor() -> ImplDescriptor {
        ImplDescriptor::for_type::<Widget>()
            .ctor(vec![], |_| Ok(Widget))
            .ctor(vec![ParamSpec::service::<Logger>()], |r| {
                let _ = r.get::<Logger>()?;
                Ok(Widget)
            })
            .build()
    }

    #[test]
    fn prefers_richest_viable_constructor() {
        let mut registry = Registry::new();
        registry.register(key_of::<Logger>(), Binding::instance(Logger));

        let desc = widget_descriptor();
        let selected = select_constructor(&desc, &registry).unwrap();
        assert_eq!(selected.params().len(), 1);
    }

    #[test]
    fn falls_back_when_dependency_missing() {
        let registry = Registry::new();

        let desc = widget_descriptor();
        let selected = select_constructor(&desc, &registry).unwrap();
        assert_eq!(selected.params().len(), 0);
    }

    #[test]
    fn abstract_implementation_fails() {
        let registry = Registry::new();
        let desc = ImplDescriptor::for_type::<Widget>().build();

        match select_constructor(&desc, &registry) {
            Err(DiError::NoSuitableConstructor(name)) => {
                assert!(name.contains("Widget"));
            }
            other => panic!("expected NoSuitableConstructor, got {:?}", other.map(|_| ())),
        }
    }
}
