//! Property cells with change detection.
//!
//! A [`Property<T>`] wraps a value and reports whether a `set` actually changed
//! it. Owners pair a property with a [`Signal`](crate::Signal) and emit only
//! when the value changed, which is what makes repeated writes of the same
//! value free of notifications.
//!
//! # Example
//!
//! ```
//! use horizon_mvvm_core::{Property, Signal};
//!
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn set_value(&self, new_value: i32) {
//!         if self.value.set(new_value) {
//!             self.value_changed.emit(new_value);
//!         }
//!     }
//! }
//!
//! let counter = Counter { value: Property::new(0), value_changed: Signal::new() };
//! counter.set_value(3);
//! assert_eq!(counter.value.get(), 3);
//! ```

use std::cell::RefCell;
use std::fmt;

/// A value cell that tracks changes.
///
/// Uses interior mutability so it can live inside shared (`Rc`) objects.
pub struct Property<T> {
    value: RefCell<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.borrow())
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// If the new value equals the current one, nothing is stored and `false`
    /// is returned. The caller emits its notification only on `true`.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.borrow_mut();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.borrow_mut();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_set_reports_change() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);

        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
    }

    #[test]
    fn test_property_replace() {
        let prop = Property::new(String::from("a"));
        assert_eq!(prop.replace("a".into()), None);
        assert_eq!(prop.replace("b".into()), Some("a".to_string()));
        assert_eq!(prop.with(|v| v.len()), 1);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::<f64>::default();
        prop.set_silent(2.5);
        assert_eq!(prop.get(), 2.5);
    }
}
