use ferrous_wire::{
    Binding, ChildInjector, Class, ClassCatalog, ClassDescriptor, Container, DiError, DiResult, EventHooks, HookHost,
    InjectionRules, InjectionTarget, Instance, Params, INJECT_HOOK,
};
use std::rc::Rc;

struct ExactCache;
struct OtherCache;
struct Unrelated;

fn catalog() -> Rc<ClassCatalog> {
    let catalog = Rc::new(ClassCatalog::new());
    catalog.register(ClassDescriptor::abstract_class("app::BaseCache"));
    catalog.register(
        Class::<ExactCache>::new("app::ExactCache")
            .extends("app::BaseCache")
            .constructor(|_| Ok(ExactCache)),
    );
    catalog.register(
        Class::<OtherCache>::new("app::OtherCache")
            .extends("app::BaseCache")
            .constructor(|_| Ok(OtherCache)),
    );
    catalog.register(Class::<Unrelated>::new("app::Unrelated").constructor(|_| Ok(Unrelated)));
    catalog
}

#[derive(Default)]
struct Page {
    rules: InjectionRules,
    prop_a: Option<Instance>,
    prop_b: Option<Instance>,
    via_setter: Vec<Instance>,
}

impl Page {
    fn new() -> Self {
        Page {
            rules: InjectionRules::new()
                .strict("app::ExactCache", Binding::property("prop_a"))
                .polymorphic("app::BaseCache", Binding::property("prop_b")),
            ..Default::default()
        }
    }
}

impl InjectionTarget for Page {
    fn injection_rules(&self) -> &InjectionRules {
        &self.rules
    }

    fn assign(&mut self, property: &str, object: Instance) -> DiResult<()> {
        match property {
            "prop_a" => self.prop_a = Some(object),
            "prop_b" => self.prop_b = Some(object),
            other => return Err(DiError::InvalidConfig(format!("Setting unknown property: Page::{}", other))),
        }
        Ok(())
    }

    fn call_setter(&mut self, setter: &str, object: Instance) -> DiResult<()> {
        match setter {
            "add_cache" => {
                self.via_setter.push(object);
                Ok(())
            }
            other => Err(DiError::InvalidConfig(format!("Calling unknown setter: Page::{}", other))),
        }
    }
}

#[test]
fn test_strict_rule_wins_over_polymorphic() {
    let injector = Container::new(catalog()).injector();
    let mut page = Page::new();

    let count = injector.inject(&mut page, [Instance::new(ExactCache)]).unwrap();
    assert_eq!(count, 1);
    assert!(page.prop_a.as_ref().unwrap().is::<ExactCache>());
    assert!(page.prop_b.is_none());
}

#[test]
fn test_subtype_matches_polymorphic_rule() {
    let injector = Container::new(catalog()).injector();
    let mut page = Page::new();

    injector.inject(&mut page, [Instance::new(OtherCache)]).unwrap();
    assert!(page.prop_a.is_none());
    assert!(page.prop_b.as_ref().unwrap().is::<OtherCache>());
}

#[test]
fn test_unmatched_objects_are_skipped() {
    let injector = Container::new(catalog()).injector();
    let mut page = Page::new();

    let count = injector
        .inject(&mut page, [Instance::new(Unrelated), Instance::new(String::from("no class"))])
        .unwrap();
    assert_eq!(count, 0);
    assert!(page.prop_a.is_none() && page.prop_b.is_none());
}

#[test]
fn test_objects_are_offered_in_order() {
    let injector = Container::new(catalog()).injector();
    let mut page = Page::new();
    let first = Instance::new(OtherCache);
    let second = Instance::new(OtherCache);

    injector.inject(&mut page, [first, second.clone()]).unwrap();
    // The later object overwrote the earlier one
    assert!(Instance::ptr_eq(page.prop_b.as_ref().unwrap(), &second));
}

#[test]
fn test_setter_binding_calls_method() {
    let injector = Container::new(catalog()).injector();
    let mut page = Page {
        rules: InjectionRules::new().polymorphic("app::BaseCache", Binding::setter("add_cache")),
        ..Default::default()
    };

    let count = injector
        .inject(&mut page, [Instance::new(ExactCache), Instance::new(OtherCache)])
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(page.via_setter.len(), 2);
}

#[test]
fn test_injects_container_built_objects() {
    let container = Container::new(catalog());
    container.set_singleton("cache", "app::ExactCache", Params::new()).unwrap();
    let cache = container.get("cache").unwrap();

    let mut page = Page::new();
    assert!(container.injector().inject_one(&mut page, cache.clone()).unwrap());
    assert!(Instance::ptr_eq(page.prop_a.as_ref().unwrap(), &cache));
}

#[test]
fn test_children_get_objects_through_inject_hook() {
    let container = Container::new(catalog());
    let mut hooks = EventHooks::new();
    let mut children = ChildInjector::new(container.injector());
    let shared = Instance::new(ExactCache);

    children.inject_to_children(&mut hooks, vec![shared.clone()]);

    let mut first = Page::new();
    let mut second = Page::new();
    assert_eq!(hooks.trigger(INJECT_HOOK, &mut first).unwrap(), 1);
    assert_eq!(hooks.trigger(INJECT_HOOK, &mut second).unwrap(), 1);
    assert!(Instance::ptr_eq(first.prop_a.as_ref().unwrap(), &shared));
    assert!(Instance::ptr_eq(second.prop_a.as_ref().unwrap(), &shared));
}

#[test]
fn test_rearming_replaces_offered_objects() {
    let container = Container::new(catalog());
    let mut hooks = EventHooks::new();
    let mut children = ChildInjector::new(container.injector());

    children.inject_to_children(&mut hooks, vec![Instance::new(ExactCache)]);
    children.inject_to_children(&mut hooks, vec![Instance::new(OtherCache)]);
    assert_eq!(hooks.count(INJECT_HOOK), 1);

    let mut page = Page::new();
    hooks.trigger(INJECT_HOOK, &mut page).unwrap();
    assert!(page.prop_a.is_none());
    assert!(page.prop_b.as_ref().unwrap().is::<OtherCache>());
    assert_eq!(children.objects().len(), 1);
}

#[test]
fn test_hook_host_removal() {
    let mut hooks = EventHooks::new();
    hooks.on("other", Box::new(|_| Ok(())));
    hooks.on("other", Box::new(|_| Ok(())));
    assert_eq!(hooks.count("other"), 2);
    hooks.off("other");
    let mut page = Page::new();
    assert_eq!(hooks.trigger("other", &mut page).unwrap(), 0);
}
