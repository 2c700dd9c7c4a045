//! Common check predicates.
//!
//! Every predicate here rejects with a message that only describes the
//! permitted values, so all rejections are safe to show.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use crate::outcome::Rejection;

/// Values with a meaningful length. Strings count characters.
pub trait HasLength {
    fn length(&self) -> usize;
}

impl HasLength for String {
    fn length(&self) -> usize {
        self.chars().count()
    }
}

impl HasLength for str {
    fn length(&self) -> usize {
        self.chars().count()
    }
}

impl<T> HasLength for Vec<T> {
    fn length(&self) -> usize {
        self.len()
    }
}

impl<K, V, S> HasLength for HashMap<K, V, S> {
    fn length(&self) -> usize {
        self.len()
    }
}

impl<K, V> HasLength for BTreeMap<K, V> {
    fn length(&self) -> usize {
        self.len()
    }
}

/// Accepts every value. Useful for leaves that only need to be present.
pub fn always_pass<T: ?Sized>() -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone {
    |_: &T| Ok(())
}

/// Rejects every value with `message`.
pub fn always_fail<T: ?Sized>(
    message: impl Into<String>,
) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone {
    let message = message.into();
    move |_: &T| Err(Rejection::new(message.clone()))
}

pub fn greater_than<T>(bound: T) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialOrd + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if *value > bound {
            Ok(())
        } else {
            Err(Rejection::new(format!("must be greater than {bound}")))
        }
    }
}

pub fn at_least<T>(bound: T) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialOrd + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if *value >= bound {
            Ok(())
        } else {
            Err(Rejection::new(format!("must be at least {bound}")))
        }
    }
}

pub fn less_than<T>(bound: T) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialOrd + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if *value < bound {
            Ok(())
        } else {
            Err(Rejection::new(format!("must be less than {bound}")))
        }
    }
}

pub fn at_most<T>(bound: T) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialOrd + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if *value <= bound {
            Ok(())
        } else {
            Err(Rejection::new(format!("must be at most {bound}")))
        }
    }
}

/// Inclusive on both ends.
pub fn between<T>(min: T, max: T) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialOrd + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if *value >= min && *value <= max {
            Ok(())
        } else {
            Err(Rejection::new(format!("must be between {min} and {max}")))
        }
    }
}

pub fn non_empty<T>() -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: HasLength + ?Sized,
{
    |value: &T| {
        if value.length() > 0 {
            Ok(())
        } else {
            Err(Rejection::new("must not be empty"))
        }
    }
}

pub fn min_len<T>(min: usize) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: HasLength + ?Sized,
{
    move |value: &T| {
        if value.length() >= min {
            Ok(())
        } else {
            Err(Rejection::new(format!("length must be at least {min}")))
        }
    }
}

pub fn max_len<T>(max: usize) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: HasLength + ?Sized,
{
    move |value: &T| {
        if value.length() <= max {
            Ok(())
        } else {
            Err(Rejection::new(format!("length must be at most {max}")))
        }
    }
}

/// Inclusive on both ends.
pub fn len_between<T>(
    min: usize,
    max: usize,
) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: HasLength + ?Sized,
{
    move |value: &T| {
        let len = value.length();
        if len >= min && len <= max {
            Ok(())
        } else {
            Err(Rejection::new(format!(
                "length must be between {min} and {max}"
            )))
        }
    }
}

pub fn one_of<T>(allowed: Vec<T>) -> impl Fn(&T) -> Result<(), Rejection> + Send + Sync + Clone
where
    T: PartialEq + Display + Send + Sync + Clone,
{
    move |value: &T| {
        if allowed.contains(value) {
            Ok(())
        } else {
            let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            Err(Rejection::new(format!(
                "must be one of: {}",
                options.join(", ")
            )))
        }
    }
}
