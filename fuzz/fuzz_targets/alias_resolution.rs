#![no_main]

use ferrous_wire::{Class, ClassCatalog, Container, Params};
use libfuzzer_sys::fuzz_target;
use std::rc::Rc;

struct Service;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let catalog = Rc::new(ClassCatalog::new());
    catalog.register(Class::<Service>::new("fuzz::Service").constructor(|_| Ok(Service)));
    let container = Container::new(catalog);

    // Each byte points alias `i` at another alias, or at the class when out of
    // range; a zero byte links to the next alias so long chains are common
    let count = data.len().min(4096);
    for (i, byte) in data.iter().take(count).enumerate() {
        let target = if *byte == 0 { i + 1 } else { *byte as usize % (count + 1) };
        let target = if target == count { "fuzz::Service".to_string() } else { format!("alias{}", target) };
        let singleton = byte & 0x80 != 0;
        let id = format!("alias{}", i);
        let registered = if singleton {
            container.set_singleton(&id, target, Params::new())
        } else {
            container.set(&id, target, Params::new())
        };
        assert!(registered.is_ok());
    }

    for i in (0..count).step_by(count / 16 + 1) {
        let id = format!("alias{}", i);
        match container.get(&id) {
            Ok(instance) => {
                assert!(instance.is::<Service>());
                assert_eq!(container.class_name_of(&id).unwrap().as_deref(), Some("fuzz::Service"));
            }
            Err(err) => assert!(err.is_invalid_config() || err.is_not_instantiable()),
        }
    }
});
