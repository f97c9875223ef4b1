/// Full application integration tests
///
/// These tests wire a small application the way a host would: classes in a
/// catalog, shared services in a locator, blocking startup work through
/// `load_components`, and late-bound objects pushed into child widgets.

use async_trait::async_trait;
use ferrous_wire::{
    config, BlockingInit, Binding, BoxError, ChildInjector, Class, ClassCatalog, ClassDescriptor, ComponentState,
    Container, Definition, DiError, DiResult, EventHooks, InjectionRules, InjectionTarget, Instance, Params,
    ServiceLocator, Value, INJECT_HOOK,
};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ===== Application domain =====

#[derive(Debug)]
struct Database {
    dsn: String,
    connected: AtomicBool,
}

#[async_trait(?Send)]
impl BlockingInit for Database {
    async fn init(&self) -> Result<(), BoxError> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
struct AuditLog {
    entries: Mutex<Vec<String>>,
}

impl AuditLog {
    fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }
}

#[derive(Debug)]
struct UserRepository {
    db: Arc<Database>,
    audit: Arc<AuditLog>,
    table: String,
}

impl UserRepository {
    fn find(&self, id: i64) -> String {
        self.audit.record(format!("find {} in {}", id, self.table));
        format!("user#{}@{}", id, self.db.dsn)
    }
}

#[derive(Default)]
struct ProfileWidget {
    rules: InjectionRules,
    repository: Option<Instance>,
}

impl ProfileWidget {
    fn new() -> Self {
        ProfileWidget {
            rules: InjectionRules::new().polymorphic("app::Repository", Binding::property("repository")),
            repository: None,
        }
    }

    fn render(&self, id: i64) -> DiResult<String> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| DiError::InvalidConfig("ProfileWidget has no repository".into()))?
            .downcast::<UserRepository>()?;
        Ok(format!("<profile>{}</profile>", repository.find(id)))
    }
}

impl InjectionTarget for ProfileWidget {
    fn injection_rules(&self) -> &InjectionRules {
        &self.rules
    }

    fn assign(&mut self, property: &str, object: Instance) -> DiResult<()> {
        match property {
            "repository" => {
                self.repository = Some(object);
                Ok(())
            }
            other => Err(DiError::InvalidConfig(format!("Setting unknown property: ProfileWidget::{}", other))),
        }
    }
}

fn catalog() -> Rc<ClassCatalog> {
    let catalog = Rc::new(ClassCatalog::new());
    catalog.register(ClassDescriptor::interface("app::Repository"));
    catalog.register(
        Class::<Database>::new("app::Database")
            .param("dsn")
            .blocking_init()
            .constructor(|args| Ok(Database { dsn: args.string("dsn")?, connected: AtomicBool::new(false) })),
    );
    catalog.register(
        Class::<AuditLog>::new("app::AuditLog").constructor(|_| Ok(AuditLog { entries: Mutex::new(Vec::new()) })),
    );
    catalog.register(
        Class::<UserRepository>::new("app::UserRepository")
            .implements("app::Repository")
            .dependency("db", "app::Database")
            .dependency("audit", "app::AuditLog")
            .param_default("table", "users")
            .constructor(|args| {
                Ok(UserRepository {
                    db: args.object("db")?,
                    audit: args.object("audit")?,
                    table: args.string("table")?,
                })
            }),
    );
    catalog
}

fn application() -> DiResult<ServiceLocator> {
    let container = Rc::new(Container::new(catalog()));
    container.set_singleton("app::AuditLog", "app::AuditLog", Params::new())?;

    let locator = ServiceLocator::new(container);
    let components: Vec<(&str, ferrous_wire::Component)> = vec![
        (
            "users",
            Definition::new("users")
                .class("app::UserRepository")
                .set("db", Value::reference("db"))
                .depends_on(["db"])
                .into(),
        ),
        ("db", config! { "class" => "app::Database", "dsn" => "postgres://localhost/app" }.into()),
    ];
    locator.set_components(components)?;
    Ok(locator)
}

// ===== Scenarios =====

#[tokio::test(start_paused = true)]
async fn test_application_startup_and_request() {
    let locator = application().unwrap();
    assert_eq!(locator.ids(), vec!["db", "users"]);

    assert!(locator.load_components().await.unwrap());
    let db = locator.get_as::<Database>("db").unwrap();
    assert!(db.connected.load(Ordering::SeqCst));
    assert_eq!(locator.state("db"), ComponentState::Initialized);

    // The repository received the locator's database, not a fresh one
    let users = locator.get_as::<UserRepository>("users").unwrap();
    assert!(Arc::ptr_eq(&users.db, &db));
    assert_eq!(users.find(7), "user#7@postgres://localhost/app");

    // The audit log is a container singleton shared by every consumer
    let audit = locator.container().get_as::<AuditLog>("app::AuditLog").unwrap();
    assert!(Arc::ptr_eq(&users.audit, &audit));
    assert_eq!(*audit.entries.lock().unwrap(), vec!["find 7 in users"]);
}

#[tokio::test(start_paused = true)]
async fn test_widgets_receive_shared_repository() {
    let locator = application().unwrap();
    locator.load_components().await.unwrap();

    let mut hooks = EventHooks::new();
    let mut children = ChildInjector::new(locator.container().injector());
    let users = locator.get_required("users").unwrap();
    children.inject_to_children(&mut hooks, vec![users.clone()]);

    let mut header = ProfileWidget::new();
    let mut sidebar = ProfileWidget::new();
    assert_eq!(hooks.trigger(INJECT_HOOK, &mut header).unwrap(), 1);
    assert_eq!(hooks.trigger(INJECT_HOOK, &mut sidebar).unwrap(), 1);

    assert_eq!(header.render(1).unwrap(), "<profile>user#1@postgres://localhost/app</profile>");
    assert!(Instance::ptr_eq(sidebar.repository.as_ref().unwrap(), &users));
}

#[tokio::test(start_paused = true)]
async fn test_invoking_handlers_with_resolved_services() {
    let locator = application().unwrap();
    let container = locator.container().clone();
    let handler = ferrous_wire::Callable::new("show_user", |args| {
        let audit = args.object::<AuditLog>("audit")?;
        audit.record(format!("handled {}", args.int("id")?));
        Ok(Value::from(format!("user {}", args.int("id")?)))
    })
    .dependency("audit", "app::AuditLog")
    .param("id");

    let out = container.invoke(&handler, Params::new().named("id", 42)).unwrap();
    assert_eq!(out, Value::from("user 42"));
    let audit = container.get_as::<AuditLog>("app::AuditLog").unwrap();
    assert_eq!(*audit.entries.lock().unwrap(), vec!["handled 42"]);
}

#[test]
fn test_misconfigured_application_fails_before_registration() {
    let locator = ServiceLocator::new(Rc::new(Container::new(catalog())));
    let components: Vec<(&str, ferrous_wire::Component)> = vec![
        ("a", Definition::new("a").class("app::AuditLog").depends_on(["b"]).into()),
        ("b", Definition::new("b").class("app::AuditLog").depends_on(["a"]).into()),
    ];

    let err = locator.set_components(components).unwrap_err();
    assert!(err.is_invalid_config());
    assert!(locator.ids().is_empty());
}
