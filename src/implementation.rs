//! Implementation descriptors: what a registration constructs and what it needs.
//!
//! An [`Implementation`] stands in for a constructible type. It carries the
//! implementation key plus one or more [`Constructor`]s, each with an ordered
//! parameter list of [`Dependency`] keys and a function that receives the
//! resolved [`Arguments`]. Open generic implementations are described by an
//! [`OpenImplementation`], whose generic factory produces a closed
//! [`Implementation`] for each set of type arguments.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

/// A constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// A single instance of the service key
    Service(Key),
    /// Every instance registered under the service key, in registration order
    Collection(Key),
}

impl Dependency {
    /// Single-instance dependency on a Rust type or trait object.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Dependency::Service(Key::of::<T>())
    }

    /// Sequence dependency on a Rust type or trait object.
    pub fn collection_of<T: ?Sized + 'static>() -> Self {
        Dependency::Collection(Key::of::<T>())
    }

    pub fn key(&self) -> &Key {
        match self {
            Dependency::Service(key) | Dependency::Collection(key) => key,
        }
    }
}

pub(crate) enum Argument {
    Single(AnyArc),
    Many(Vec<AnyArc>),
}

/// Resolved constructor arguments, in declared parameter order.
///
/// ```rust
/// use ferrous_container::{Dependency, Implementation, Key, Lifetime, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Config { port: u16 }
/// struct Server { config: Arc<Config> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { port: 8080 }).unwrap();
/// services.register(
///     Key::of::<Server>(),
///     Implementation::of::<Server>()
///         .constructor([Dependency::of::<Config>()], |args| {
///             Ok(Server { config: args.get::<Config>(0)? })
///         }),
///     Lifetime::Transient,
/// ).unwrap();
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<Server>().config.port, 8080);
/// ```
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type-erased instance at `index`.
    pub fn instance(&self, index: usize) -> Option<AnyArc> {
        match self.values.get(index) {
            Some(Argument::Single(any)) => Some(any.clone()),
            _ => None,
        }
    }

    /// Concrete-type argument at `index`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let any = self.instance(index).ok_or_else(mismatch::<T>)?;
        downcast::<T>(any)
    }

    /// Trait-object argument at `index`.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let any = self.instance(index).ok_or_else(mismatch::<T>)?;
        downcast_trait::<T>(any)
    }

    /// Concrete-type collection argument at `index`.
    pub fn get_all<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        match self.values.get(index) {
            Some(Argument::Many(items)) => items.iter().cloned().map(downcast::<T>).collect(),
            _ => Err(mismatch::<T>()),
        }
    }

    /// Trait-object collection argument at `index`.
    pub fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        match self.values.get(index) {
            Some(Argument::Many(items)) => items.iter().cloned().map(downcast_trait::<T>).collect(),
            _ => Err(mismatch::<T>()),
        }
    }
}

fn mismatch<T: ?Sized>() -> DiError {
    DiError::TypeMismatch(std::any::type_name::<T>())
}

/// Concrete services are stored as `Arc<T>`.
pub(crate) fn downcast<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| mismatch::<T>())
}

/// Trait-object services are stored as `Arc<Arc<dyn Trait>>`.
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| mismatch::<T>())
}

pub(crate) type ConstructFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>, &Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// One way of constructing an implementation.
#[derive(Clone)]
pub struct Constructor {
    parameters: Arc<[Dependency]>,
    invoke: ConstructFn,
}

impl Constructor {
    pub fn parameters(&self) -> &[Dependency] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, ctx: &ResolverContext<'_>, args: &Arguments) -> DiResult<AnyArc> {
        (self.invoke)(ctx, args)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Descriptor of a constructible implementation.
///
/// Constructor functions may return any `Send + Sync + 'static` value. A
/// value of type `V` is resolvable as `V`; to satisfy a trait-object
/// contract, return `Arc<dyn Trait>`.
///
/// # Constructor selection
///
/// The constructor with the most parameters whose dependencies are all
/// resolvable is used. Two such constructors with the same parameter count
/// fail with [`DiError::AmbiguousConstructor`]. When no constructor is fully
/// resolvable, the one with the most parameters is attempted so that the
/// error names the missing dependency.
///
/// ```rust
/// use ferrous_container::{Dependency, Implementation, Key, Lifetime, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct FixedClock(u64);
/// impl Clock for FixedClock { fn now(&self) -> u64 { self.0 } }
///
/// struct Greeter { clock: Option<Arc<dyn Clock>> }
///
/// let greeter = Implementation::of::<Greeter>()
///     .constructor([], |_| Ok(Greeter { clock: None }))
///     .constructor([Dependency::of::<dyn Clock>()], |args| {
///         Ok(Greeter { clock: Some(args.get_trait::<dyn Clock>(0)?) })
///     });
///
/// let mut services = ServiceCollection::new();
/// services.register(Key::of::<Greeter>(), greeter, Lifetime::Transient).unwrap();
/// services.add_singleton_trait::<dyn Clock>(Arc::new(FixedClock(7))).unwrap();
///
/// let provider = services.build();
/// let resolved = provider.get_required::<Greeter>();
/// assert_eq!(resolved.clock.as_ref().unwrap().now(), 7);
/// ```
#[derive(Clone)]
pub struct Implementation {
    key: Key,
    constructors: Vec<Constructor>,
}

impl Implementation {
    /// Descriptor with no constructors yet.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            constructors: Vec::new(),
        }
    }

    /// Descriptor keyed by the Rust type `I`.
    pub fn of<I: ?Sized + 'static>() -> Self {
        Self::new(Key::of::<I>())
    }

    /// Adds a constructor with declared parameters.
    pub fn constructor<V, F, P>(mut self, parameters: P, f: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&Arguments) -> DiResult<V> + Send + Sync + 'static,
        P: IntoIterator<Item = Dependency>,
    {
        let invoke = move |_: &ResolverContext<'_>, args: &Arguments| -> DiResult<AnyArc> {
            Ok(Arc::new(f(args)?))
        };
        self.constructors.push(Constructor {
            parameters: parameters.into_iter().collect(),
            invoke: Arc::new(invoke),
        });
        self
    }

    /// Descriptor backed by a factory function.
    ///
    /// The factory resolves what it needs through the [`ResolverContext`];
    /// those resolutions take part in cycle detection like declared
    /// parameters do.
    pub fn factory<V, F>(key: Key, f: F) -> Self
    where
        V: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<V> + Send + Sync + 'static,
    {
        let invoke = move |ctx: &ResolverContext<'_>, _: &Arguments| -> DiResult<AnyArc> {
            Ok(Arc::new(f(ctx)?))
        };
        Self {
            key,
            constructors: vec![Constructor {
                parameters: Arc::from([]),
                invoke: Arc::new(invoke),
            }],
        }
    }

    /// Descriptor that hands out an already built instance.
    pub(crate) fn shared(key: Key, instance: AnyArc) -> Self {
        let invoke = move |_: &ResolverContext<'_>, _: &Arguments| -> DiResult<AnyArc> {
            Ok(instance.clone())
        };
        Self {
            key,
            constructors: vec![Constructor {
                parameters: Arc::from([]),
                invoke: Arc::new(invoke),
            }],
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub(crate) fn select_constructor<R>(&self, resolvable: R) -> DiResult<&Constructor>
    where
        R: Fn(&Dependency) -> bool,
    {
        let greediest = self
            .constructors
            .iter()
            .fold(None::<&Constructor>, |best, c| match best {
                Some(b) if b.parameters.len() >= c.parameters.len() => Some(b),
                _ => Some(c),
            })
            .ok_or_else(|| DiError::NoConstructor(self.key.clone()))?;

        let eligible: Vec<&Constructor> = self
            .constructors
            .iter()
            .filter(|c| c.parameters.iter().all(&resolvable))
            .collect();

        let Some(parameters) = eligible.iter().map(|c| c.parameters.len()).max() else {
            return Ok(greediest);
        };

        let mut winners = eligible.into_iter().filter(|c| c.parameters.len() == parameters);
        let chosen = winners.next().unwrap_or(greediest);
        let others = winners.count();
        if others > 0 {
            return Err(DiError::AmbiguousConstructor {
                implementation: self.key.clone(),
                parameters,
                candidates: others + 1,
            });
        }
        Ok(chosen)
    }
}

impl std::fmt::Debug for Implementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementation")
            .field("key", &self.key)
            .field("constructors", &self.constructors)
            .finish()
    }
}

type SpecializeFn = Arc<dyn Fn(&Key) -> DiResult<Implementation> + Send + Sync>;

/// Open generic implementation: a generic factory over type arguments.
///
/// The factory receives the closed implementation key (for example
/// `Repository<User>`, with [`Key::type_arguments`] giving `[User]`) and
/// returns the descriptor for that specialization. It is called at most once
/// per closed service key.
///
/// ```rust
/// use ferrous_container::{Implementation, Key, OpenImplementation};
///
/// struct Named { type_name: String }
///
/// let open = OpenImplementation::new(Key::open("Named", 1), |closed| {
///     let type_name = closed.type_arguments()[0].to_string();
///     Ok(Implementation::new(closed.clone())
///         .constructor([], move |_| Ok(Named { type_name: type_name.clone() })))
/// });
///
/// let closed = open.specialize(&[Key::of::<u8>()]).unwrap();
/// assert_eq!(closed.key().to_string(), "Named<u8>");
/// ```
#[derive(Clone)]
pub struct OpenImplementation {
    key: Key,
    specialize: SpecializeFn,
}

impl OpenImplementation {
    pub fn new<F>(key: Key, f: F) -> Self
    where
        F: Fn(&Key) -> DiResult<Implementation> + Send + Sync + 'static,
    {
        Self {
            key,
            specialize: Arc::new(f),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Builds the closed implementation for `arguments`.
    pub fn specialize(&self, arguments: &[Key]) -> DiResult<Implementation> {
        let closed = self.key.close(arguments).ok_or_else(|| DiError::ArityMismatch {
            service: Key::Open(self.key.name(), arguments.len()),
            service_arity: arguments.len(),
            implementation: self.key.clone(),
            implementation_arity: self.key.arity(),
        })?;
        let mut implementation = (self.specialize)(&closed)?;
        implementation.key = closed;
        Ok(implementation)
    }
}

impl std::fmt::Debug for OpenImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenImplementation")
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ctor(first: usize, second: usize) -> Implementation {
        let deps = |n: usize| (0..n).map(|_| Dependency::of::<u8>()).collect::<Vec<_>>();
        Implementation::of::<u32>()
            .constructor(deps(first), |_| Ok(1u32))
            .constructor(deps(second), |_| Ok(2u32))
    }

    #[test]
    fn greediest_resolvable_constructor_wins() {
        let imp = two_ctor(0, 2);
        let chosen = imp.select_constructor(|_| true).unwrap();
        assert_eq!(chosen.parameters().len(), 2);
    }

    #[test]
    fn unresolvable_constructor_is_skipped() {
        let imp = Implementation::of::<u32>()
            .constructor([], |_| Ok(1u32))
            .constructor([Dependency::of::<u16>()], |_| Ok(2u32));
        let chosen = imp
            .select_constructor(|d| d.key() != &Key::of::<u16>())
            .unwrap();
        assert!(chosen.parameters().is_empty());
    }

    #[test]
    fn tie_is_ambiguous() {
        let imp = two_ctor(1, 1);
        match imp.select_constructor(|_| true) {
            Err(DiError::AmbiguousConstructor { parameters, candidates, .. }) => {
                assert_eq!(parameters, 1);
                assert_eq!(candidates, 2);
            }
            other => panic!("expected ambiguity, got {:?}", other.map(|c| c.parameters().len())),
        }
    }

    #[test]
    fn nothing_resolvable_falls_back_to_greediest() {
        let imp = two_ctor(1, 3);
        let chosen = imp.select_constructor(|_| false).unwrap();
        assert_eq!(chosen.parameters().len(), 3);
    }

    #[test]
    fn no_constructor_is_an_error() {
        let imp = Implementation::of::<u32>();
        assert!(matches!(imp.select_constructor(|_| true), Err(DiError::NoConstructor(_))));
    }

    #[test]
    fn specialize_rejects_wrong_argument_count() {
        let open = OpenImplementation::new(Key::open("Pair", 2), |k| {
            Ok(Implementation::new(k.clone()).constructor([], |_| Ok(())))
        });
        assert!(matches!(open.specialize(&[Key::of::<u8>()]), Err(DiError::ArityMismatch { .. })));
        let closed = open.specialize(&[Key::of::<u8>(), Key::of::<u16>()]).unwrap();
        assert_eq!(closed.key().arity(), 2);
    }
}
