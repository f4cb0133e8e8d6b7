//! Type catalog: explicit type descriptors the engine constructs from.
//!
//! The container never inspects types at runtime. Everything it needs to know
//! about a type (its kind, constructors, the identities it can stand in for,
//! its generic shape and disposal hook) is described once in a
//! [`TypeCatalog`] shared by a container tree.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DiError, DiResult};
use crate::registration::{
    disposer_for, downcast_collection, downcast_concrete, downcast_trait, AnyArc, Disposer, Upcast,
};
use crate::traits::Dispose;
use crate::{ServiceKey, TypeToken};

pub(crate) type Invoker = Arc<dyn Fn(&mut Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// Kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A type the engine may construct.
    Concrete,
    /// A trait-object identity.
    Interface,
    /// A base identity that cannot be constructed directly.
    Abstract,
}

/// Constructor visibility. Only public constructors take part in default
/// selection; explicit selection may pick either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// One constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    token: TypeToken,
    key: Option<String>,
}

impl ParamInfo {
    /// Parameter resolved as the Rust type `T` (concrete or `dyn Trait`).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeToken::of::<T>())
    }

    /// Parameter receiving every registration of `T`.
    pub fn all_of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeToken::all_of_type::<T>())
    }

    pub fn new(token: TypeToken) -> Self {
        Self { token, key: None }
    }

    /// Resolve this parameter from the registration stored under `key`.
    pub fn named(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn token(&self) -> &TypeToken {
        &self.token
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Store key the parameter is resolved by.
    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(self.token.clone(), self.key.as_deref())
    }
}

/// Resolved constructor arguments, consumed in declaration order.
///
/// ```
/// use ferrous_ioc::{ParamInfo, TypeCatalog, TypeInfo};
/// use std::sync::Arc;
///
/// struct Config(u16);
/// struct Server { port: u16 }
///
/// let catalog = TypeCatalog::new();
/// catalog.describe(
///     TypeInfo::concrete::<Server>().constructor([ParamInfo::of::<Config>()], |args| {
///         let config: Arc<Config> = args.take()?;
///         Ok(Server { port: config.0 })
///     }),
/// );
/// ```
pub struct Arguments {
    values: std::vec::IntoIter<AnyArc>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<AnyArc>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    fn next_value(&mut self, expected: &'static str) -> DiResult<AnyArc> {
        self.values.next().ok_or_else(|| {
            DiError::Internal(format!("constructor asked for {} beyond its declared parameters", expected))
        })
    }

    /// Takes the next argument as a concrete `Arc<T>`.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        downcast_concrete::<T>(self.next_value(type_name::<T>())?)
    }

    /// Takes the next argument as a trait object.
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.next_value(type_name::<T>())?)
    }

    /// Takes the next argument as the ordered implementations of `T`.
    pub fn take_all<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<T>>> {
        let collection = downcast_collection(self.next_value(type_name::<T>())?)?;
        collection.iter().cloned().map(downcast_trait::<T>).collect()
    }

    /// Takes the next argument as the ordered registrations of the concrete `T`.
    pub fn take_all_concrete<T: Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<T>>> {
        let collection = downcast_collection(self.next_value(type_name::<T>())?)?;
        collection.iter().cloned().map(downcast_concrete::<T>).collect()
    }

    /// Arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// A described constructor.
#[derive(Clone)]
pub struct ConstructorInfo {
    params: Vec<ParamInfo>,
    visibility: Visibility,
    preferred: bool,
    invoke: Invoker,
}

impl ConstructorInfo {
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the constructor carries the preferred-constructor marker.
    pub fn is_preferred(&self) -> bool {
        self.preferred
    }

    /// Whether the parameter tokens equal `tokens`, in order.
    pub fn matches(&self, tokens: &[TypeToken]) -> bool {
        self.params.len() == tokens.len()
            && self.params.iter().zip(tokens).all(|(param, token)| param.token() == token)
    }

    /// Parameter list formatted as `(A, B)`.
    pub fn signature(&self) -> String {
        let names: Vec<String> = self.params.iter().map(|p| p.token().to_string()).collect();
        format!("({})", names.join(", "))
    }

    pub(crate) fn invoke(&self, arguments: &mut Arguments) -> DiResult<AnyArc> {
        (self.invoke)(arguments)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("preferred", &self.preferred)
            .finish()
    }
}

/// Descriptor of one type.
///
/// Built through [`TypeInfo::concrete`], [`TypeInfo::interface`] or
/// [`TypeInfo::abstract_type`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ParamInfo, TypeCatalog, TypeInfo, TypeKind};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let catalog = TypeCatalog::new();
/// catalog
///     .describe(TypeInfo::interface::<dyn Greeter>())
///     .describe(
///         TypeInfo::concrete::<English>()
///             .constructor([], |_| Ok(English))
///             .implements::<dyn Greeter, _>(|e| e as Arc<dyn Greeter>),
///     );
///
/// let english = catalog.get(&ferrous_ioc::TypeToken::of::<English>()).unwrap();
/// assert_eq!(english.kind(), TypeKind::Concrete);
/// assert!(english.is_assignable_to(&ferrous_ioc::TypeToken::of::<dyn Greeter>()));
/// ```
#[derive(Clone)]
pub struct TypeInfo {
    token: TypeToken,
    kind: TypeKind,
    constructors: Vec<ConstructorInfo>,
    implements: Vec<(TypeToken, Upcast)>,
    generic: Option<(TypeToken, Vec<TypeToken>)>,
    disposer: Option<Disposer>,
}

impl TypeInfo {
    fn empty(token: TypeToken, kind: TypeKind) -> Self {
        Self {
            token,
            kind,
            constructors: Vec::new(),
            implements: Vec::new(),
            generic: None,
            disposer: None,
        }
    }

    /// Describes a constructible type.
    pub fn concrete<T: Send + Sync + 'static>() -> TypeBuilder<T> {
        TypeBuilder::new(TypeKind::Concrete)
    }

    /// Describes a trait-object identity such as `dyn Service`.
    pub fn interface<T: ?Sized + 'static>() -> TypeBuilder<T> {
        TypeBuilder::new(TypeKind::Interface)
    }

    /// Describes a base identity that can't be constructed on its own.
    pub fn abstract_type<T: ?Sized + 'static>() -> TypeBuilder<T> {
        TypeBuilder::new(TypeKind::Abstract)
    }

    pub fn token(&self) -> &TypeToken {
        &self.token
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }

    /// Constructors in description order.
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Whether an instance of this type can stand in for `target`.
    pub fn is_assignable_to(&self, target: &TypeToken) -> bool {
        &self.token == target || self.implements.iter().any(|(token, _)| token == target)
    }

    /// Identities this type implements, in description order.
    pub fn implemented(&self) -> impl Iterator<Item = &TypeToken> {
        self.implements.iter().map(|(token, _)| token)
    }

    /// `(definition, arguments)` when this is a closed generic.
    pub fn generic_shape(&self) -> Option<(&TypeToken, &[TypeToken])> {
        self.generic
            .as_ref()
            .map(|(definition, arguments)| (definition, arguments.as_slice()))
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    pub(crate) fn upcast_to(&self, target: &TypeToken) -> Option<Upcast> {
        self.implements
            .iter()
            .find(|(token, _)| token == target)
            .map(|(_, upcast)| upcast.clone())
    }

    pub(crate) fn disposer(&self) -> Option<Disposer> {
        self.disposer.clone()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("token", &self.token)
            .field("kind", &self.kind)
            .field("constructors", &self.constructors)
            .field("implements", &self.implemented().collect::<Vec<_>>())
            .field("generic", &self.generic)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}

/// Typed builder for [`TypeInfo`]; ties constructor closures and upcasts to `T`.
pub struct TypeBuilder<T: ?Sized> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> TypeBuilder<T> {
    fn new(kind: TypeKind) -> Self {
        Self {
            info: TypeInfo::empty(TypeToken::of::<T>(), kind),
            _marker: PhantomData,
        }
    }

    /// Marks the type as the instantiation of `definition` over `arguments`.
    pub fn closes(mut self, definition: TypeToken, arguments: impl IntoIterator<Item = TypeToken>) -> Self {
        self.info.generic = Some((definition, arguments.into_iter().collect()));
        self
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }
}

impl<T: Send + Sync + 'static> TypeBuilder<T> {
    fn push_constructor<F>(
        mut self,
        params: impl IntoIterator<Item = ParamInfo>,
        visibility: Visibility,
        preferred: bool,
        construct: F,
    ) -> Self
    where
        F: Fn(&mut Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        let invoke: Invoker = Arc::new(move |arguments: &mut Arguments| {
            construct(arguments).map(|value| Arc::new(value) as AnyArc)
        });
        self.info.constructors.push(ConstructorInfo {
            params: params.into_iter().collect(),
            visibility,
            preferred,
            invoke,
        });
        self
    }

    /// Adds a public constructor.
    pub fn constructor<F>(self, params: impl IntoIterator<Item = ParamInfo>, construct: F) -> Self
    where
        F: Fn(&mut Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push_constructor(params, Visibility::Public, false, construct)
    }

    /// Adds a constructor only reachable through explicit selection.
    pub fn non_public_constructor<F>(self, params: impl IntoIterator<Item = ParamInfo>, construct: F) -> Self
    where
        F: Fn(&mut Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push_constructor(params, Visibility::NonPublic, false, construct)
    }

    /// Adds a public constructor that wins default selection.
    pub fn preferred_constructor<F>(self, params: impl IntoIterator<Item = ParamInfo>, construct: F) -> Self
    where
        F: Fn(&mut Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push_constructor(params, Visibility::Public, true, construct)
    }

    /// Declares that `T` can stand in for `I`, converting with `cast`.
    pub fn implements<I, F>(mut self, cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let upcast: Upcast = Arc::new(move |any: AnyArc| {
            let concrete = downcast_concrete::<T>(any)?;
            Ok(Arc::new(cast(concrete)) as AnyArc)
        });
        self.info.implements.push((TypeToken::of::<I>(), upcast));
        self
    }

    /// Runs [`Dispose::dispose`] when a cached instance is released.
    pub fn disposable(mut self) -> Self
    where
        T: Dispose,
    {
        self.info.disposer = Some(disposer_for::<T>());
        self
    }
}

impl<T: ?Sized + 'static> From<TypeBuilder<T>> for TypeInfo {
    fn from(builder: TypeBuilder<T>) -> Self {
        builder.build()
    }
}

#[derive(Default)]
struct CatalogTypes {
    order: Vec<TypeToken>,
    by_token: HashMap<TypeToken, Arc<TypeInfo>, ahash::RandomState>,
}

/// Registry of type descriptors.
///
/// Implementation scans are memoized per identity and invalidated whenever a
/// descriptor is added or replaced.
#[derive(Default)]
pub struct TypeCatalog {
    types: RwLock<CatalogTypes>,
    implementations: RwLock<HashMap<TypeToken, Arc<[Arc<TypeInfo>]>, ahash::RandomState>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, replacing any existing one for the same token.
    pub fn describe(&self, info: impl Into<TypeInfo>) -> &Self {
        let info = info.into();
        let mut types = self.types.write();
        let token = info.token().clone();
        if types.by_token.insert(token.clone(), Arc::new(info)).is_none() {
            types.order.push(token);
        }
        self.implementations.write().clear();
        self
    }

    pub fn get(&self, token: &TypeToken) -> Option<Arc<TypeInfo>> {
        self.types.read().by_token.get(token).cloned()
    }

    pub fn contains(&self, token: &TypeToken) -> bool {
        self.types.read().by_token.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.types.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concrete types assignable to `token`, in description order.
    pub fn implementations_of(&self, token: &TypeToken) -> Arc<[Arc<TypeInfo>]> {
        let types = self.types.read();
        if let Some(hit) = self.implementations.read().get(token) {
            return hit.clone();
        }

        let found: Arc<[Arc<TypeInfo>]> = types
            .order
            .iter()
            .filter_map(|t| types.by_token.get(t))
            .filter(|info| info.is_concrete() && info.token() != token && info.is_assignable_to(token))
            .cloned()
            .collect();
        self.implementations.write().insert(token.clone(), found.clone());
        found
    }

    /// Finds the instantiation of `definition` over `arguments`.
    pub fn close(&self, definition: &TypeToken, arguments: &[TypeToken]) -> Option<Arc<TypeInfo>> {
        let types = self.types.read();
        types
            .order
            .iter()
            .filter_map(|t| types.by_token.get(t))
            .find(|info| {
                info.generic_shape()
                    .map_or(false, |(def, args)| def == definition && args == arguments)
            })
            .cloned()
    }

    /// `(definition, arguments)` of a described closed generic.
    pub fn generic_shape(&self, token: &TypeToken) -> Option<(TypeToken, Vec<TypeToken>)> {
        self.get(token)
            .and_then(|info| info.generic_shape().map(|(def, args)| (def.clone(), args.to_vec())))
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog").field("types", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }

    struct Square;
    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    struct Triangle;
    impl Shape for Triangle {
        fn sides(&self) -> u32 {
            3
        }
    }

    struct Boxed<T>(T);

    const BOXED: TypeToken = TypeToken::open("Boxed", 1);

    fn shapes() -> TypeCatalog {
        let catalog = TypeCatalog::new();
        catalog
            .describe(TypeInfo::interface::<dyn Shape>())
            .describe(
                TypeInfo::concrete::<Square>()
                    .constructor([], |_| Ok(Square))
                    .implements::<dyn Shape, _>(|s| s as Arc<dyn Shape>),
            )
            .describe(
                TypeInfo::concrete::<Triangle>()
                    .constructor([], |_| Ok(Triangle))
                    .implements::<dyn Shape, _>(|t| t as Arc<dyn Shape>),
            );
        catalog
    }

    #[test]
    fn implementations_in_description_order() {
        let catalog = shapes();
        let found = catalog.implementations_of(&TypeToken::of::<dyn Shape>());
        let names: Vec<String> = found.iter().map(|info| info.token().short_name()).collect();
        assert_eq!(names, vec!["Square", "Triangle"]);
    }

    #[test]
    fn describe_invalidates_memoized_scan() {
        let catalog = shapes();
        let shape = TypeToken::of::<dyn Shape>();
        assert_eq!(catalog.implementations_of(&shape).len(), 2);

        catalog.describe(TypeInfo::concrete::<Triangle>().constructor([], |_| Ok(Triangle)));
        assert_eq!(catalog.implementations_of(&shape).len(), 1);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn upcast_converts_concrete_instances() {
        let catalog = shapes();
        let square = catalog.get(&TypeToken::of::<Square>()).unwrap();
        let upcast = square.upcast_to(&TypeToken::of::<dyn Shape>()).unwrap();

        let raw = square.constructors()[0].invoke(&mut Arguments::new(Vec::new())).unwrap();
        let shape = downcast_trait::<dyn Shape>(upcast(raw).unwrap()).unwrap();
        assert_eq!(shape.sides(), 4);
    }

    #[test]
    fn close_matches_definition_and_arguments() {
        let catalog = TypeCatalog::new();
        catalog
            .describe(
                TypeInfo::concrete::<Boxed<u8>>()
                    .constructor([], |_| Ok(Boxed(1u8)))
                    .closes(BOXED, [TypeToken::of::<u8>()]),
            )
            .describe(
                TypeInfo::concrete::<Boxed<u16>>()
                    .constructor([], |_| Ok(Boxed(2u16)))
                    .closes(BOXED, [TypeToken::of::<u16>()]),
            );

        let closed = catalog.close(&BOXED, &[TypeToken::of::<u16>()]).unwrap();
        assert_eq!(closed.token(), &TypeToken::of::<Boxed<u16>>());
        assert!(catalog.close(&BOXED, &[TypeToken::of::<u32>()]).is_none());
        assert_eq!(
            catalog.generic_shape(&TypeToken::of::<Boxed<u8>>()),
            Some((BOXED, vec![TypeToken::of::<u8>()]))
        );
    }

    #[test]
    fn arguments_report_overconsumption() {
        let mut arguments = Arguments::new(Vec::new());
        assert!(matches!(arguments.take::<u8>(), Err(DiError::Internal(_))));
    }
}
