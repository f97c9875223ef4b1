#![no_main]

use ferrous_wire::{Class, ClassCatalog, Component, Container, Definition, ServiceLocator};
use libfuzzer_sys::fuzz_target;
use std::rc::Rc;

struct Node;

fuzz_target!(|data: &[u8]| {
    let catalog = Rc::new(ClassCatalog::new());
    catalog.register(Class::<Node>::new("fuzz::Node").constructor(|_| Ok(Node)));
    let locator = ServiceLocator::new(Rc::new(Container::new(catalog)));

    // Byte `i` is the dependency bitmask of component `i`
    let count = data.len().min(8);
    let mut declared = Vec::new();
    let components: Vec<(String, Component)> = (0..count)
        .map(|i| {
            let deps: Vec<String> = (0..8)
                .filter(|bit| data[i] & (1 << bit) != 0)
                .map(|bit| format!("c{}", bit))
                .collect();
            declared.push(deps.clone());
            let id = format!("c{}", i);
            (id.clone(), Definition::new(id).class("fuzz::Node").depends_on(deps).into())
        })
        .collect();

    match locator.set_components(components) {
        Ok(()) => {
            let ids = locator.ids();
            assert_eq!(ids.len(), count);
            let position = |id: &str| ids.iter().position(|x| x == id);
            for (i, deps) in declared.iter().enumerate() {
                let own = format!("c{}", i);
                for dep in deps {
                    if let (Some(a), Some(b)) = (position(dep), position(&own)) {
                        if dep != &own {
                            assert!(a < b);
                        }
                    }
                }
            }
        }
        Err(err) => {
            assert!(err.is_invalid_config());
            assert!(locator.ids().is_empty());
        }
    }
});
