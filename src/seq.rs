//! [`Seq`]: a lazy, single-pass, cloneable sequence.
//!
//! A `Seq` is the building block every [`crate::shrink::Shrinkable`] uses to
//! hand out its children. It is a persistent (structurally shared) lazy
//! list: forcing the head of a node memoizes the result, so cloning a `Seq`
//! is a cheap pointer copy and every clone independently walks forward from
//! the point it was cloned at, without recomputing shared prefixes.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

enum Link<T> {
    Nil,
    Cons(T, Seq<T>),
}

enum Cell<T> {
    Pending(Option<Box<dyn FnOnce() -> Link<T>>>),
    Forced(Rc<Link<T>>),
}

/// A lazy, single-pass, cloneable sequence of `T`.
pub struct Seq<T>(Rc<RefCell<Cell<T>>>);

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Seq(self.0.clone())
    }
}

impl<T> Seq<T> {
    fn defer<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Link<T> + 'static,
    {
        Seq(Rc::new(RefCell::new(Cell::Pending(Some(Box::new(thunk))))))
    }

    fn cons(head: T, tail: Seq<T>) -> Self
    where
        T: 'static,
    {
        Seq(Rc::new(RefCell::new(Cell::Forced(Rc::new(Link::Cons(
            head, tail,
        ))))))
    }

    /// The empty sequence.
    pub fn empty() -> Self {
        Seq(Rc::new(RefCell::new(Cell::Forced(Rc::new(Link::Nil)))))
    }

    fn force(&self) -> Rc<Link<T>> {
        let mut slot = self.0.borrow_mut();
        if let Cell::Pending(thunk) = &mut *slot {
            let thunk = thunk.take().expect("Seq thunk forced twice");
            // A panic raised while producing the next element terminates
            // the sequence rather than poisoning or propagating.
            let link = catch_unwind(AssertUnwindSafe(thunk)).unwrap_or(Link::Nil);
            *slot = Cell::Forced(Rc::new(link));
        }
        match &*slot {
            Cell::Forced(link) => link.clone(),
            Cell::Pending(_) => unreachable!("forced above"),
        }
    }

    /// Returns the next element, or `None` when the sequence is exhausted,
    /// advancing this handle past it. Other clones made before this call
    /// are unaffected.
    pub fn next(&mut self) -> Option<T>
    where
        T: Clone,
    {
        match &*self.force() {
            Link::Nil => None,
            Link::Cons(head, tail) => {
                let head = head.clone();
                let tail = tail.clone();
                *self = tail;
                Some(head)
            }
        }
    }

    /// Drains the whole sequence into a `Vec`. Only meaningful for finite
    /// sequences.
    pub fn collect(mut self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::new();
        while let Some(value) = self.next() {
            out.push(value);
        }
        out
    }

    /// A sequence yielding a single value.
    pub fn just(value: T) -> Self
    where
        T: 'static,
    {
        Self::cons(value, Self::empty())
    }

    /// Builds a (lazily-drained) `Seq` from any container.
    pub fn from_container<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
        T: 'static,
    {
        Self::from_iterator(items.into_iter())
    }

    fn from_iterator<I>(mut iter: I) -> Self
    where
        I: Iterator<Item = T> + 'static,
        T: 'static,
    {
        Self::defer(move || match iter.next() {
            Some(value) => Link::Cons(value, Self::from_iterator(iter)),
            None => Link::Nil,
        })
    }

    /// An infinite sequence `init, f(init), f(f(init)), ...`.
    pub fn iterate<F>(init: T, f: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&T) -> T + Clone + 'static,
    {
        Self::defer(move || {
            let next = f(&init);
            Link::Cons(init, Self::iterate(next, f))
        })
    }

    /// An infinite sequence repeating `value`.
    pub fn repeat(value: T) -> Self
    where
        T: Clone + 'static,
    {
        Self::iterate(value, |v| v.clone())
    }

    /// Maps every element with `f`.
    pub fn map<U, F>(self, f: F) -> Seq<U>
    where
        T: Clone + 'static,
        U: 'static,
        F: Fn(T) -> U + Clone + 'static,
    {
        let mut this = self;
        Seq::defer(move || match this.next() {
            Some(value) => Link::Cons(f(value), this.map(f)),
            None => Link::Nil,
        })
    }

    /// Keeps only elements satisfying `predicate`.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&T) -> bool + Clone + 'static,
    {
        let mut this = self;
        Self::defer(move || loop {
            match this.next() {
                Some(value) if predicate(&value) => {
                    return Link::Cons(value, this.filter(predicate));
                }
                Some(_) => continue,
                None => return Link::Nil,
            }
        })
    }

    /// Maps every element through `f`, keeping only the `Some` results.
    pub fn map_maybe<U, F>(self, f: F) -> Seq<U>
    where
        T: Clone + 'static,
        U: 'static,
        F: Fn(T) -> Option<U> + Clone + 'static,
    {
        let mut this = self;
        Seq::defer(move || loop {
            match this.next() {
                Some(value) => match f(value) {
                    Some(mapped) => return Link::Cons(mapped, this.map_maybe(f)),
                    None => continue,
                },
                None => return Link::Nil,
            }
        })
    }

    /// Concatenates `self` followed by `other`.
    pub fn concat(self, other: Seq<T>) -> Self
    where
        T: Clone + 'static,
    {
        let mut this = self;
        Self::defer(move || match this.next() {
            Some(value) => Link::Cons(value, this.concat(other)),
            None => other.clone_link(),
        })
    }

    fn clone_link(self) -> Link<T> {
        match &*self.force() {
            Link::Nil => Link::Nil,
            Link::Cons(head, tail) => Link::Cons(head.clone(), tail.clone()),
        }
    }

    /// Maps every element to a `Seq<U>` and flattens the result, lazily.
    pub fn mapcat<U, F>(self, f: F) -> Seq<U>
    where
        T: Clone + 'static,
        U: Clone + 'static,
        F: Fn(T) -> Seq<U> + Clone + 'static,
    {
        self.map(f).join()
    }

    /// Flattens a `Seq<Seq<U>>` into a `Seq<U>`.
    pub fn join(self) -> T::Flattened
    where
        T: Flatten + 'static,
    {
        T::flatten(self)
    }

    /// Takes at most `n` elements.
    pub fn take(self, n: usize) -> Self
    where
        T: Clone + 'static,
    {
        let mut this = self;
        Self::defer(move || {
            if n == 0 {
                Link::Nil
            } else {
                match this.next() {
                    Some(value) => Link::Cons(value, this.take(n - 1)),
                    None => Link::Nil,
                }
            }
        })
    }

    /// Drops the first `n` elements.
    pub fn drop(self, n: usize) -> Self
    where
        T: Clone + 'static,
    {
        let mut this = self;
        for _ in 0..n {
            if this.next().is_none() {
                return Self::empty();
            }
        }
        this
    }

    /// Takes elements while `predicate` holds, stopping at the first miss.
    pub fn take_while<F>(self, predicate: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&T) -> bool + Clone + 'static,
    {
        let mut this = self;
        Self::defer(move || match this.next() {
            Some(value) if predicate(&value) => Link::Cons(value, this.take_while(predicate)),
            _ => Link::Nil,
        })
    }

    /// Drops elements while `predicate` holds, then yields the rest as-is.
    pub fn drop_while<F>(mut self, predicate: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&T) -> bool,
    {
        loop {
            let forced = self.force();
            match &*forced {
                Link::Cons(value, tail) if predicate(value) => {
                    self = tail.clone();
                }
                _ => return self,
            }
        }
    }

    /// Cycles `self` forever. The empty sequence cycles to the empty
    /// sequence.
    pub fn cycle(self) -> Self
    where
        T: Clone + 'static,
    {
        fn go<T: Clone + 'static>(rest: Seq<T>, whole: Seq<T>) -> Seq<T> {
            let mut rest = rest;
            Seq::defer(move || match rest.next() {
                Some(value) => Link::Cons(value, go(rest, whole)),
                None => go(whole.clone(), whole).clone_link(),
            })
        }
        go(self.clone(), self)
    }

    /// Zips two sequences together with `f`, stopping at the shorter one.
    pub fn zip_with<U, V, F>(self, other: Seq<U>, f: F) -> Seq<V>
    where
        T: Clone + 'static,
        U: Clone + 'static,
        V: 'static,
        F: Fn(T, U) -> V + Clone + 'static,
    {
        let mut left = self;
        let mut right = other;
        Seq::defer(move || match (left.next(), right.next()) {
            (Some(a), Some(b)) => Link::Cons(f(a, b), left.zip_with(right, f)),
            _ => Link::Nil,
        })
    }
}

/// Implemented for `Seq<Seq<U>>` to support [`Seq::join`]/[`Seq::mapcat`].
pub trait Flatten {
    type Flattened;
    fn flatten(outer: Seq<Self>) -> Self::Flattened
    where
        Self: Sized;
}

impl<U: Clone + 'static> Flatten for Seq<U> {
    type Flattened = Seq<U>;

    fn flatten(outer: Seq<Seq<U>>) -> Seq<U> {
        let mut outer = outer;
        Seq::defer(move || loop {
            match outer.next() {
                Some(mut inner) => {
                    let is_empty = matches!(&*inner.force(), Link::Nil);
                    if is_empty {
                        continue;
                    }
                    let head = inner.next().expect("checked non-empty above");
                    return Link::Cons(head, inner.concat(Seq::flatten(outer)));
                }
                None => return Link::Nil,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_equality_holds_after_partial_consumption() {
        let seq = Seq::from_container(0..5);
        let mut seq = seq.take(3);
        assert_eq!(seq.next(), Some(0));
        let clone_a = seq.clone();
        let clone_b = seq.clone();
        assert_eq!(clone_a.collect(), clone_b.collect());
    }

    #[test]
    fn map_composition() {
        let f = |x: i32| x + 1;
        let g = |x: i32| x * 2;
        let a = Seq::from_container(vec![1, 2, 3]).map(f).map(g).collect();
        let b = Seq::from_container(vec![1, 2, 3])
            .map(move |x| g(f(x)))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn concat_associativity() {
        let a = || Seq::from_container(vec![1, 2]);
        let b = || Seq::from_container(vec![3, 4]);
        let c = || Seq::from_container(vec![5, 6]);
        let left = a().concat(b()).concat(c()).collect();
        let right = a().concat(b().concat(c())).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn take_drop_partition() {
        let source = || Seq::from_container(0..10);
        let n = 4;
        let combined = source().take(n).concat(source().drop(n)).collect();
        assert_eq!(combined, source().collect());
    }

    #[test]
    fn filter_keeps_only_matching() {
        let evens = Seq::from_container(0..10).filter(|x| x % 2 == 0).collect();
        assert_eq!(evens, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn take_while_stops_at_first_miss() {
        let result = Seq::from_container(vec![1, 2, 3, 10, 4])
            .take_while(|&x| x < 5)
            .collect();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn mapcat_flattens_lazily() {
        let result = Seq::from_container(vec![1, 2, 3])
            .mapcat(|x| Seq::from_container(vec![x, x * 10]))
            .collect();
        assert_eq!(result, vec![1, 10, 2, 20, 3, 30]);
    }

    #[test]
    fn cycle_repeats() {
        let result = Seq::from_container(vec![1, 2]).cycle().take(5).collect();
        assert_eq!(result, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn panicking_producer_terminates_the_sequence() {
        let seq = Seq::from_container(0..10).map(|x| {
            if x == 3 {
                panic!("boom");
            }
            x
        });
        assert_eq!(seq.collect(), vec![0, 1, 2]);
    }
}
