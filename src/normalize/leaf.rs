//! Leaf copy capabilities.
//!
//! A leaf is any value the normalizer does not descend into. Each leaf type
//! declares through [`Leaf::copy_leaf`] how (and whether) it can be copied
//! into a form that is safe to store in a frozen container.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// The result of asking a leaf for a frozen copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafCopy<F> {
    /// A copy that is immutable by construction.
    Immutable(F),
    /// A copy made through a mutable-copy capability.
    ///
    /// The copy is independent of the original, but nothing stops its owner
    /// from mutating it later; it is treated as frozen by convention only.
    Mutable(F),
    /// The leaf cannot be copied.
    NotCopyable,
}

impl<F> LeafCopy<F> {
    /// Returns the copy, if there is one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::normalize::LeafCopy;
    ///
    /// assert_eq!(LeafCopy::Immutable(1).into_copy(), Some(1));
    /// assert_eq!(LeafCopy::Mutable(2).into_copy(), Some(2));
    /// assert_eq!(LeafCopy::<i32>::NotCopyable.into_copy(), None);
    /// ```
    pub fn into_copy(self) -> Option<F> {
        match self {
            Self::Immutable(copy) | Self::Mutable(copy) => Some(copy),
            Self::NotCopyable => None,
        }
    }
}

/// A value the normalizer copies rather than descends into.
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{Leaf, LeafCopy};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Setting {
///     Number(i64),
///     Socket(u16),
/// }
///
/// impl Leaf for Setting {
///     type Frozen = Self;
///
///     fn copy_leaf(&self) -> LeafCopy<Self> {
///         match self {
///             Self::Number(_) => LeafCopy::Immutable(self.clone()),
///             // An open socket cannot be duplicated.
///             Self::Socket(_) => LeafCopy::NotCopyable,
///         }
///     }
/// }
///
/// assert_eq!(Setting::Number(3).copy_leaf(), LeafCopy::Immutable(Setting::Number(3)));
/// assert_eq!(Setting::Socket(80).copy_leaf(), LeafCopy::NotCopyable);
/// ```
pub trait Leaf {
    /// The type of the frozen copy.
    type Frozen;

    /// Produces a frozen copy of this leaf, or reports that it has none.
    fn copy_leaf(&self) -> LeafCopy<Self::Frozen>;
}

macro_rules! impl_copy_leaf {
    ($($leaf:ty),* $(,)?) => {
        $(
            impl Leaf for $leaf {
                type Frozen = Self;

                #[inline]
                fn copy_leaf(&self) -> LeafCopy<Self> {
                    LeafCopy::Immutable(*self)
                }
            }
        )*
    };
}

macro_rules! impl_clone_leaf {
    ($($leaf:ty),* $(,)?) => {
        $(
            impl Leaf for $leaf {
                type Frozen = Self;

                #[inline]
                fn copy_leaf(&self) -> LeafCopy<Self> {
                    LeafCopy::Immutable(self.clone())
                }
            }
        )*
    };
}

impl_copy_leaf!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    &'static str,
);

impl_clone_leaf!(String, Box<str>);

/// Shared immutable data: the copy is another handle to the same value.
impl<T: ?Sized> Leaf for Arc<T> {
    type Frozen = Self;

    #[inline]
    fn copy_leaf(&self) -> LeafCopy<Self> {
        LeafCopy::Immutable(Self::clone(self))
    }
}

/// Shared mutable data: the copy is a fresh cell holding a clone of the
/// current contents. A cell that is mutably borrowed at the time of the copy
/// has no consistent contents to copy and reports
/// [`LeafCopy::NotCopyable`].
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{Leaf, LeafCopy};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let shared = Rc::new(RefCell::new(vec![1, 2]));
/// let copy = shared.copy_leaf().into_copy().unwrap();
/// shared.borrow_mut().push(3);
/// assert_eq!(*copy.borrow(), vec![1, 2]);
///
/// let _guard = shared.borrow_mut();
/// assert_eq!(shared.copy_leaf(), LeafCopy::NotCopyable);
/// ```
impl<T: Clone> Leaf for Rc<RefCell<T>> {
    type Frozen = Self;

    fn copy_leaf(&self) -> LeafCopy<Self> {
        self.try_borrow().map_or(LeafCopy::NotCopyable, |contents| {
            LeafCopy::Mutable(Rc::new(RefCell::new(contents.clone())))
        })
    }
}
