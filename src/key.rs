//! Service identity types for the container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a service contract or an implementation.
///
/// Keys are plain data: the container never inspects the Rust type behind a
/// key, it only compares keys and asks implementation descriptors to build
/// instances for them.
///
/// # Key Types
///
/// - **Type**: any `'static` Rust type, including trait objects like `dyn Logger`
/// - **Open**: the unparametrized form of a generic contract (`Repository<_>`)
/// - **Closed**: one specialization of an open form (`Repository<User>`)
///
/// # Examples
///
/// ```rust
/// use ferrous_container::Key;
///
/// trait Logger: Send + Sync {}
///
/// let logger = Key::of::<dyn Logger>();
/// let open = Key::open("Repository", 1);
/// let closed = Key::closed("Repository", [Key::of::<String>()]);
///
/// assert_eq!(closed.open_form(), Some(open.clone()));
/// assert_eq!(closed.to_string(), "Repository<alloc::string::String>");
/// assert_ne!(logger, open);
/// ```
#[derive(Clone)]
pub enum Key {
    /// Rust type identity with its type name for diagnostics
    ///
    /// Equality and hashing only use the `TypeId`.
    Type(TypeId, &'static str),
    /// Unparametrized generic form: family name and arity
    Open(&'static str, usize),
    /// Fully parametrized specialization of `Open(name, args.len())`
    Closed(&'static str, Arc<[Key]>),
}

impl Key {
    /// Key of a Rust type. Works for unsized contracts such as `dyn Trait`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key of an open generic form.
    pub fn open(name: &'static str, arity: usize) -> Self {
        Key::Open(name, arity)
    }

    /// Key of a closed specialization.
    ///
    /// ```rust
    /// use ferrous_container::Key;
    ///
    /// let a = Key::closed("Cache", [Key::of::<u32>(), Key::of::<String>()]);
    /// let b = Key::closed("Cache", [Key::of::<u32>(), Key::of::<String>()]);
    /// let c = Key::closed("Cache", [Key::of::<String>(), Key::of::<u32>()]);
    /// assert_eq!(a, b);
    /// assert_ne!(a, c);
    /// assert_eq!(a.arity(), 2);
    /// ```
    pub fn closed<I>(name: &'static str, arguments: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Key::Closed(name, arguments.into_iter().collect())
    }

    /// Type name (for `Type`) or family name (for `Open`/`Closed`).
    pub fn name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Open(name, _) => name,
            Key::Closed(name, _) => name,
        }
    }

    /// Number of type parameters. Zero for plain types.
    pub fn arity(&self) -> usize {
        match self {
            Key::Type(..) => 0,
            Key::Open(_, arity) => *arity,
            Key::Closed(_, args) => args.len(),
        }
    }

    /// Bound type arguments of a closed key, empty otherwise.
    pub fn type_arguments(&self) -> &[Key] {
        match self {
            Key::Closed(_, args) => args,
            _ => &[],
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Key::Open(..))
    }

    /// The open form this key specializes, if it is a closed key.
    pub fn open_form(&self) -> Option<Key> {
        match self {
            Key::Closed(name, args) => Some(Key::Open(name, args.len())),
            _ => None,
        }
    }

    /// Closes an open key over `arguments`.
    ///
    /// Returns `None` when the key is not open or the argument count does not
    /// match its arity.
    pub fn close(&self, arguments: &[Key]) -> Option<Key> {
        match self {
            Key::Open(name, arity) if *arity == arguments.len() => {
                Some(Key::Closed(name, arguments.into()))
            }
            _ => None,
        }
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId only, the name is diagnostics
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Open(a, arity_a), Key::Open(b, arity_b)) => a == b && arity_a == arity_b,
            (Key::Closed(a, args_a), Key::Closed(b, args_b)) => a == b && args_a == args_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Open(name, arity) => {
                1u8.hash(state);
                name.hash(state);
                arity.hash(state);
            }
            Key::Closed(name, args) => {
                2u8.hash(state);
                name.hash(state);
                args.hash(state);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type(_, name) => f.write_str(name),
            Key::Open(name, arity) => {
                write!(f, "{}<", name)?;
                for i in 0..*arity {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("_")?;
                }
                f.write_str(">")
            }
            Key::Closed(name, args) => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

// Helper for creating type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
