//! The reference-counted cell backing every heap-allocated value.
//!
//! `spec.md` §3.2 describes a manual retain/release discipline with a
//! counter that may be "plain (single-thread, default) or atomic
//! (configurable)". In Rust this maps directly onto `Rc`/`Arc`: cloning a
//! `Gc<T>` *is* retain, dropping the last clone *is* release, and the
//! backing allocator is swapped by feature flag rather than by hand-rolled
//! counter arithmetic.

#[cfg(not(feature = "sync-refcount"))]
mod backing {
    use std::cell::{Ref, RefCell, RefMut};
    use std::rc::Rc;

    pub struct Gc<T>(Rc<RefCell<T>>);

    impl<T> Gc<T> {
        pub fn new(value: T) -> Self {
            Gc(Rc::new(RefCell::new(value)))
        }

        pub fn borrow(&self) -> Ref<'_, T> {
            self.0.borrow()
        }

        pub fn borrow_mut(&self) -> RefMut<'_, T> {
            self.0.borrow_mut()
        }

        pub fn ptr_eq(a: &Self, b: &Self) -> bool {
            Rc::ptr_eq(&a.0, &b.0)
        }

        pub fn strong_count(this: &Self) -> usize {
            Rc::strong_count(&this.0)
        }

        pub fn as_ptr_usize(this: &Self) -> usize {
            Rc::as_ptr(&this.0) as usize
        }
    }

    impl<T> Clone for Gc<T> {
        fn clone(&self) -> Self {
            Gc(Rc::clone(&self.0))
        }
    }
}

#[cfg(feature = "sync-refcount")]
mod backing {
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

    pub struct Gc<T>(Arc<RwLock<T>>);

    impl<T> Gc<T> {
        pub fn new(value: T) -> Self {
            Gc(Arc::new(RwLock::new(value)))
        }

        pub fn borrow(&self) -> RwLockReadGuard<'_, T> {
            self.0.read().expect("slate heap lock poisoned")
        }

        pub fn borrow_mut(&self) -> RwLockWriteGuard<'_, T> {
            self.0.write().expect("slate heap lock poisoned")
        }

        pub fn ptr_eq(a: &Self, b: &Self) -> bool {
            Arc::ptr_eq(&a.0, &b.0)
        }

        pub fn strong_count(this: &Self) -> usize {
            Arc::strong_count(&this.0)
        }

        pub fn as_ptr_usize(this: &Self) -> usize {
            Arc::as_ptr(&this.0) as usize
        }
    }

    impl<T> Clone for Gc<T> {
        fn clone(&self) -> Self {
            Gc(Arc::clone(&self.0))
        }
    }
}

pub use backing::Gc;

impl<T: std::fmt::Debug> std::fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Gc").field(&*self.borrow()).finish()
    }
}

/// Identity hash/equality for heap-unique types (Function, Closure, Class,
/// Iterator, BufferBuilder/Reader, datetime values) per spec.md §4.7.
pub fn identity_hash<T>(gc: &Gc<T>) -> u64 {
    Gc::as_ptr_usize(gc) as u64
}
