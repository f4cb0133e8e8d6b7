//! Shared fixtures: a catalog describing the services used across the
//! integration tests.
#![allow(dead_code)]

use ferrous_ioc::{Dispose, DisposeResult, ParamInfo, TypeCatalog, TypeInfo, TypeToken};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ===== Plain services =====

pub trait IService: Send + Sync {
    fn name(&self) -> &'static str;
}

pub struct MyService;

impl IService for MyService {
    fn name(&self) -> &'static str {
        "MyService"
    }
}

pub struct SpecialService;

impl IService for SpecialService {
    fn name(&self) -> &'static str {
        "SpecialService"
    }
}

/// Concrete type with a single parameterless constructor.
pub struct SimpleClass;

pub struct ConcreteOnly;

/// Interface nobody implements.
pub trait INothing: Send + Sync {}

// ===== Constructor selection =====

pub trait IClassWith3Ctors: Send + Sync {
    fn ctor_used(&self) -> &'static str;
}

pub struct ClassWith3Ctors {
    pub ctor_used: &'static str,
}

impl IClassWith3Ctors for ClassWith3Ctors {
    fn ctor_used(&self) -> &'static str {
        self.ctor_used
    }
}

/// Carries the preferred-constructor marker on its leanest constructor.
pub struct Marked {
    pub ctor_used: &'static str,
}

/// Takes its service from the registration keyed "special".
pub struct NeedsSpecial {
    pub service: Arc<dyn IService>,
}

/// Depends on an interface and a concrete type.
pub struct Consumer {
    pub service: Arc<dyn IService>,
    pub simple: Arc<SimpleClass>,
}

// ===== Collections =====

pub trait ISimpleAdapter: Send + Sync {
    fn id(&self) -> &'static str;
}

macro_rules! adapters {
    ($($name:ident => $id:literal),* $(,)?) => {
        $(
            pub struct $name;

            impl ISimpleAdapter for $name {
                fn id(&self) -> &'static str {
                    $id
                }
            }
        )*

        fn describe_adapters(catalog: &TypeCatalog) {
            $(
                catalog.describe(
                    TypeInfo::concrete::<$name>()
                        .constructor([], |_| Ok($name))
                        .implements::<dyn ISimpleAdapter, _>(|a| a as Arc<dyn ISimpleAdapter>),
                );
            )*
        }
    };
}

adapters! {
    SimpleAdapterOne => "one",
    SimpleAdapterTwo => "two",
    SimpleAdapterThree => "three",
    SimpleAdapterFour => "four",
    SimpleAdapterFive => "five",
}

/// Receives every registered adapter.
pub struct AdapterHub {
    pub adapters: Vec<Arc<dyn ISimpleAdapter>>,
}

// ===== Generics =====

pub const IREPOSITORY: TypeToken = TypeToken::open("IRepository", 1);
pub const REPOSITORY: TypeToken = TypeToken::open("Repository", 1);

pub trait IRepository<T>: Send + Sync {
    fn entity(&self) -> &'static str;
}

pub struct Repository<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Repository<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: 'static> IRepository<T> for Repository<T> {
    fn entity(&self) -> &'static str {
        std::any::type_name::<T>().rsplit("::").next().unwrap_or("?")
    }
}

pub struct User;
pub struct Order;
/// Has an `IRepository` descriptor but no `Repository` instantiation.
pub struct Invoice;

pub fn describe_repository<T: 'static>(catalog: &TypeCatalog) {
    catalog
        .describe(TypeInfo::interface::<dyn IRepository<T>>().closes(IREPOSITORY, [TypeToken::of::<T>()]))
        .describe(
            TypeInfo::concrete::<Repository<T>>()
                .constructor([], |_| Ok(Repository::<T>::new()))
                .implements::<dyn IRepository<T>, _>(|r| r as Arc<dyn IRepository<T>>)
                .closes(REPOSITORY, [TypeToken::of::<T>()]),
        );
}

// ===== Disposal =====

/// Counts how often it was disposed; optionally fails.
pub struct Tracked {
    pub disposed: Arc<AtomicUsize>,
    pub fail: bool,
}

impl Tracked {
    pub fn new(disposed: &Arc<AtomicUsize>) -> Self {
        Self {
            disposed: disposed.clone(),
            fail: false,
        }
    }

    pub fn failing(disposed: &Arc<AtomicUsize>) -> Self {
        Self {
            disposed: disposed.clone(),
            fail: true,
        }
    }
}

impl Dispose for Tracked {
    fn dispose(&self) -> DisposeResult {
        self.disposed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("flush failed".into())
        } else {
            Ok(())
        }
    }
}

// ===== Catalog =====

pub fn catalog() -> TypeCatalog {
    let catalog = TypeCatalog::new();
    catalog
        .describe(TypeInfo::interface::<dyn IService>())
        .describe(
            TypeInfo::concrete::<MyService>()
                .constructor([], |_| Ok(MyService))
                .implements::<dyn IService, _>(|s| s as Arc<dyn IService>),
        )
        .describe(TypeInfo::concrete::<SimpleClass>().constructor([], |_| Ok(SimpleClass)))
        .describe(TypeInfo::concrete::<ConcreteOnly>().constructor([], |_| Ok(ConcreteOnly)))
        .describe(TypeInfo::interface::<dyn INothing>())
        .describe(TypeInfo::interface::<dyn IClassWith3Ctors>())
        .describe(
            TypeInfo::concrete::<ClassWith3Ctors>()
                .constructor([], |_| Ok(ClassWith3Ctors { ctor_used: "()" }))
                .constructor([ParamInfo::of::<dyn IService>()], |args| {
                    args.take_trait::<dyn IService>()?;
                    Ok(ClassWith3Ctors {
                        ctor_used: "(IService service)",
                    })
                })
                .non_public_constructor(
                    [ParamInfo::of::<dyn IService>(), ParamInfo::of::<ConcreteOnly>()],
                    |args| {
                        args.take_trait::<dyn IService>()?;
                        args.take::<ConcreteOnly>()?;
                        Ok(ClassWith3Ctors {
                            ctor_used: "(IService service, ConcreteOnly concrete)",
                        })
                    },
                )
                .implements::<dyn IClassWith3Ctors, _>(|c| c as Arc<dyn IClassWith3Ctors>),
        )
        .describe(
            TypeInfo::concrete::<Marked>()
                .constructor([ParamInfo::of::<SimpleClass>(), ParamInfo::of::<ConcreteOnly>()], |_| {
                    Ok(Marked { ctor_used: "wide" })
                })
                .preferred_constructor([], |_| Ok(Marked { ctor_used: "marked" })),
        )
        .describe(
            TypeInfo::concrete::<NeedsSpecial>()
                .constructor([ParamInfo::of::<dyn IService>().named("special")], |args| {
                    Ok(NeedsSpecial {
                        service: args.take_trait()?,
                    })
                }),
        )
        .describe(
            TypeInfo::concrete::<Consumer>()
                .constructor([ParamInfo::of::<dyn IService>(), ParamInfo::of::<SimpleClass>()], |args| {
                    Ok(Consumer {
                        service: args.take_trait()?,
                        simple: args.take()?,
                    })
                }),
        )
        .describe(TypeInfo::interface::<dyn ISimpleAdapter>())
        .describe(
            TypeInfo::concrete::<AdapterHub>()
                .constructor([ParamInfo::all_of::<dyn ISimpleAdapter>()], |args| {
                    Ok(AdapterHub {
                        adapters: args.take_all::<dyn ISimpleAdapter>()?,
                    })
                }),
        );
    describe_adapters(&catalog);
    describe_repository::<User>(&catalog);
    describe_repository::<Order>(&catalog);
    catalog.describe(
        TypeInfo::interface::<dyn IRepository<Invoice>>().closes(IREPOSITORY, [TypeToken::of::<Invoice>()]),
    );
    catalog
}

pub fn shared_catalog() -> Arc<TypeCatalog> {
    Arc::new(catalog())
}

/// Distinct container name per call site so parallel tests never collide.
pub fn unique_name(prefix: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("{}-{}-{}", prefix, std::process::id(), NEXT.fetch_add(1, Ordering::SeqCst))
}
