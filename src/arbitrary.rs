//! Type-directed dispatch to a default [`Gen`]: `T::arbitrary()` instead of
//! hand-building a generator for every primitive and standard container.

use crate::generate::{container, tuple2, tuple3, tuple4, tuple5, tuple6, unique, unique_by, with_size, Gen};
use crate::shrink::Shrinkable;
use crate::strategy;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::time::{Duration, SystemTime};

pub trait Arbitrary: Sized + Clone + 'static {
    fn arbitrary() -> Gen<Self>;
}

macro_rules! arbitrary_signed {
    ($t:ty, $shrink:path) => {
        impl Arbitrary for $t {
            fn arbitrary() -> Gen<$t> {
                Gen::from_fn(|random, size| {
                    let bound = (size as $t).saturating_add(1);
                    let value = random.$t(-bound..=bound);
                    Shrinkable::shrink_recur(value, |v: &$t| $shrink(*v))
                })
            }
        }
    };
}

macro_rules! arbitrary_unsigned {
    ($t:ty, $shrink:path) => {
        impl Arbitrary for $t {
            fn arbitrary() -> Gen<$t> {
                Gen::from_fn(|random, size| {
                    let bound = (size as $t).saturating_add(1);
                    let value = random.$t(0..=bound);
                    Shrinkable::shrink_recur(value, |v: &$t| $shrink(*v))
                })
            }
        }
    };
}

arbitrary_signed!(i8, strategy::shrink_i8);
arbitrary_signed!(i16, strategy::shrink_i16);
arbitrary_signed!(i32, strategy::shrink_i32);
arbitrary_signed!(i64, strategy::shrink_i64);
arbitrary_signed!(i128, strategy::shrink_i128);
arbitrary_signed!(isize, strategy::shrink_isize);

arbitrary_unsigned!(u8, strategy::shrink_u8);
arbitrary_unsigned!(u16, strategy::shrink_u16);
arbitrary_unsigned!(u32, strategy::shrink_u32);
arbitrary_unsigned!(u64, strategy::shrink_u64);
arbitrary_unsigned!(u128, strategy::shrink_u128);
arbitrary_unsigned!(usize, strategy::shrink_usize);

impl Arbitrary for bool {
    fn arbitrary() -> Gen<bool> {
        Gen::from_fn(|random, _size| {
            let value = random.bool();
            Shrinkable::shrink_recur(value, |v: &bool| strategy::shrink_bool(*v))
        })
    }
}

impl Arbitrary for f32 {
    fn arbitrary() -> Gen<f32> {
        Gen::from_fn(|random, size| {
            let bound = size as f32 + 1.0;
            let value = (random.f32() * 2.0 - 1.0) * bound;
            Shrinkable::shrink_recur(value, |v: &f32| strategy::shrink_f32(*v))
        })
    }
}

impl Arbitrary for f64 {
    fn arbitrary() -> Gen<f64> {
        Gen::from_fn(|random, size| {
            let bound = size as f64 + 1.0;
            let value = (random.f64() * 2.0 - 1.0) * bound;
            Shrinkable::shrink_recur(value, |v: &f64| strategy::shrink_f64(*v))
        })
    }
}

/// Restricted to ASCII lowercase, scaled by size, to keep `shrink_char`'s
/// "toward `'a'`" strategy meaningful without dragging in the full
/// Unicode scalar range.
impl Arbitrary for char {
    fn arbitrary() -> Gen<char> {
        Gen::from_fn(|random, size| {
            let span = (size as usize).min(25);
            let index = random.usize(0..=span);
            let value = (b'a' + index as u8) as char;
            Shrinkable::shrink_recur(value, |v: &char| strategy::shrink_char(*v))
        })
    }
}

impl Arbitrary for String {
    fn arbitrary() -> Gen<String> {
        container(char::arbitrary())
    }
}

/// Half-chance-empty at low sizes, mostly-`Some` at high sizes.
impl<T: Arbitrary> Arbitrary for Option<T> {
    fn arbitrary() -> Gen<Option<T>> {
        with_size(|size| {
            let none_weight = 50u32.saturating_sub(size / 2).max(1);
            let some_weight = (size / 2).saturating_add(1);
            crate::generate::weighted_one_of(vec![
                (none_weight, Gen::just(None)),
                (some_weight, T::arbitrary().map(Some)),
            ])
        })
    }
}

impl Arbitrary for Duration {
    fn arbitrary() -> Gen<Duration> {
        u64::arbitrary().map(Duration::from_millis)
    }
}

impl Arbitrary for SystemTime {
    fn arbitrary() -> Gen<SystemTime> {
        Duration::arbitrary().map(|duration| SystemTime::UNIX_EPOCH + duration)
    }
}

impl<T: Arbitrary> Arbitrary for Vec<T> {
    fn arbitrary() -> Gen<Vec<T>> {
        container(T::arbitrary())
    }
}

impl<T: Arbitrary> Arbitrary for VecDeque<T> {
    fn arbitrary() -> Gen<VecDeque<T>> {
        container(T::arbitrary())
    }
}

impl<T: Arbitrary + Eq + Hash> Arbitrary for HashSet<T> {
    fn arbitrary() -> Gen<HashSet<T>> {
        unique(T::arbitrary())
    }
}

impl<T: Arbitrary + Ord> Arbitrary for BTreeSet<T> {
    fn arbitrary() -> Gen<BTreeSet<T>> {
        unique(T::arbitrary())
    }
}

impl<K: Arbitrary + Eq + Hash, V: Arbitrary> Arbitrary for HashMap<K, V> {
    fn arbitrary() -> Gen<HashMap<K, V>> {
        unique_by(tuple2(K::arbitrary(), V::arbitrary()), |pair: &(K, V)| pair.0.clone())
    }
}

impl<K: Arbitrary + Ord, V: Arbitrary> Arbitrary for BTreeMap<K, V> {
    fn arbitrary() -> Gen<BTreeMap<K, V>> {
        unique_by(tuple2(K::arbitrary(), V::arbitrary()), |pair: &(K, V)| pair.0.clone())
    }
}

impl<A: Arbitrary, B: Arbitrary> Arbitrary for (A, B) {
    fn arbitrary() -> Gen<(A, B)> {
        tuple2(A::arbitrary(), B::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary, C: Arbitrary> Arbitrary for (A, B, C) {
    fn arbitrary() -> Gen<(A, B, C)> {
        tuple3(A::arbitrary(), B::arbitrary(), C::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary, C: Arbitrary, D: Arbitrary> Arbitrary for (A, B, C, D) {
    fn arbitrary() -> Gen<(A, B, C, D)> {
        tuple4(A::arbitrary(), B::arbitrary(), C::arbitrary(), D::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary, C: Arbitrary, D: Arbitrary, E: Arbitrary> Arbitrary for (A, B, C, D, E) {
    fn arbitrary() -> Gen<(A, B, C, D, E)> {
        tuple5(A::arbitrary(), B::arbitrary(), C::arbitrary(), D::arbitrary(), E::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary, C: Arbitrary, D: Arbitrary, E: Arbitrary, F: Arbitrary> Arbitrary
    for (A, B, C, D, E, F)
{
    fn arbitrary() -> Gen<(A, B, C, D, E, F)> {
        tuple6(
            A::arbitrary(),
            B::arbitrary(),
            C::arbitrary(),
            D::arbitrary(),
            E::arbitrary(),
            F::arbitrary(),
        )
    }
}

/// Convenience free function mirroring the combinator surface: `arbitrary::<T>()`.
pub fn arbitrary<T: Arbitrary>() -> Gen<T> {
    T::arbitrary()
}
