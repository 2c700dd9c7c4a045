//! Two-phase construction of parameters.
//!
//! Builders are plain mutable values. `build` consumes the builder, checks
//! what it can about the schema, and hands back an immutable parameter that
//! can be shared across threads.

use std::collections::HashSet;
use std::sync::Arc;

use crate::custom::CustomParam;
use crate::error::{Result, SchemaError};
use crate::leaf::{CheckFn, FormatFn, InsertFn, LeafCheck, LeafParam, Retriever};
use crate::object::{Locate, ObjectParam};
use crate::outcome::Rejection;

/// Builder for [`LeafParam`].
pub struct LeafParamBuilder<C: ?Sized, T> {
    name: String,
    retriever: Arc<dyn Retriever<C, T>>,
    formatters: Vec<FormatFn<T>>,
    insert: Option<InsertFn<C, T>>,
    checks: Vec<CheckFn<T>>,
    can_be_null: bool,
    invalid_message: Option<String>,
}

impl<C: ?Sized, T> LeafParamBuilder<C, T> {
    pub fn new<R>(name: impl Into<String>, retriever: R) -> Self
    where
        R: Retriever<C, T> + 'static,
    {
        Self {
            name: name.into(),
            retriever: Arc::new(retriever),
            formatters: Vec::new(),
            insert: None,
            checks: Vec::new(),
            can_be_null: false,
            invalid_message: None,
        }
    }

    /// Start from an existing leaf, keeping its retriever, formatters,
    /// checks, and flags.
    pub fn from_param(param: &LeafParam<C, T>) -> Self {
        Self {
            name: param.name.clone(),
            retriever: Arc::clone(&param.retriever),
            formatters: param.formatters.clone(),
            insert: param.insert.clone(),
            checks: param.checks.clone(),
            can_be_null: param.can_be_null,
            invalid_message: param.invalid_message.clone(),
        }
    }

    /// Append a format step. Steps run in the order they were added.
    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(T) -> std::result::Result<T, Rejection> + Send + Sync + 'static,
    {
        self.formatters.push(Arc::new(format));
        self
    }

    /// Write the formatted value back into the container. Only runs when at
    /// least one format step is configured.
    pub fn insert<F>(mut self, insert: F) -> Self
    where
        F: Fn(&str, &mut C, &T) + Send + Sync + 'static,
    {
        self.insert = Some(Arc::new(insert));
        self
    }

    /// Append a check predicate. Predicates run in the order they were added.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), Rejection> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    /// Replace the message of whichever check predicate fails.
    pub fn invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    pub fn build(self) -> Result<LeafParam<C, T>> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if self.checks.is_empty() {
            return Err(SchemaError::MissingChecks(self.name));
        }
        Ok(LeafParam {
            name: self.name,
            retriever: self.retriever,
            formatters: self.formatters,
            insert: self.insert,
            checks: self.checks,
            can_be_null: self.can_be_null,
            invalid_message: self.invalid_message,
        })
    }
}

impl<C: ?Sized, T> Clone for LeafParamBuilder<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            retriever: Arc::clone(&self.retriever),
            formatters: self.formatters.clone(),
            insert: self.insert.clone(),
            checks: self.checks.clone(),
            can_be_null: self.can_be_null,
            invalid_message: self.invalid_message.clone(),
        }
    }
}

/// Builder for [`ObjectParam`].
pub struct ObjectParamBuilder<C: ?Sized> {
    name: Option<String>,
    locator: Arc<dyn Locate<C>>,
    continue_on_optional_failure: bool,
    can_be_null: bool,
    required_leaves: Vec<Arc<dyn LeafCheck<C>>>,
    optional_leaves: Vec<Arc<dyn LeafCheck<C>>>,
    required_objects: Vec<Arc<ObjectParam<C>>>,
    optional_objects: Vec<Arc<ObjectParam<C>>>,
    required_custom: Vec<CustomParam<C>>,
    optional_custom: Vec<CustomParam<C>>,
}

impl<C: ?Sized> ObjectParamBuilder<C> {
    /// Unnamed object: a schema root, or the element schema of an array.
    pub fn root<L>(locator: L) -> Self
    where
        L: Locate<C> + 'static,
    {
        Self::with_name(None, Arc::new(locator))
    }

    /// Object nested under `name` in its parent container.
    pub fn named<L>(name: impl Into<String>, locator: L) -> Self
    where
        L: Locate<C> + 'static,
    {
        Self::with_name(Some(name.into()), Arc::new(locator))
    }

    /// Start from a copy of an existing object's flags and child lists.
    /// The source is left untouched.
    pub fn from_param(param: &ObjectParam<C>) -> Self {
        Self {
            name: param.name.clone(),
            locator: Arc::clone(&param.locator),
            continue_on_optional_failure: param.continue_on_optional_failure,
            can_be_null: param.can_be_null,
            required_leaves: param.required_leaves.clone(),
            optional_leaves: param.optional_leaves.clone(),
            required_objects: param.required_objects.clone(),
            optional_objects: param.optional_objects.clone(),
            required_custom: param.required_custom.clone(),
            optional_custom: param.optional_custom.clone(),
        }
    }

    fn with_name(name: Option<String>, locator: Arc<dyn Locate<C>>) -> Self {
        Self {
            name,
            locator,
            continue_on_optional_failure: false,
            can_be_null: false,
            required_leaves: Vec::new(),
            optional_leaves: Vec::new(),
            required_objects: Vec::new(),
            optional_objects: Vec::new(),
            required_custom: Vec::new(),
            optional_custom: Vec::new(),
        }
    }

    pub fn continue_on_optional_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_optional_failure = continue_on_failure;
        self
    }

    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    pub fn required<L>(mut self, leaf: L) -> Self
    where
        L: LeafCheck<C> + 'static,
    {
        self.required_leaves.push(Arc::new(leaf));
        self
    }

    pub fn optional<L>(mut self, leaf: L) -> Self
    where
        L: LeafCheck<C> + 'static,
    {
        self.optional_leaves.push(Arc::new(leaf));
        self
    }

    pub fn required_object(mut self, object: ObjectParam<C>) -> Self {
        self.required_objects.push(Arc::new(object));
        self
    }

    pub fn optional_object(mut self, object: ObjectParam<C>) -> Self {
        self.optional_objects.push(Arc::new(object));
        self
    }

    pub fn required_custom(mut self, custom: CustomParam<C>) -> Self {
        self.required_custom.push(custom);
        self
    }

    pub fn optional_custom(mut self, custom: CustomParam<C>) -> Self {
        self.optional_custom.push(custom);
        self
    }

    pub fn build(self) -> Result<ObjectParam<C>> {
        if self.name.as_deref() == Some("") {
            return Err(SchemaError::EmptyName);
        }

        let leaves = self
            .required_leaves
            .iter()
            .chain(&self.optional_leaves)
            .map(|l| l.name());
        let objects = self
            .required_objects
            .iter()
            .chain(&self.optional_objects)
            .filter_map(|o| o.name());
        let custom = self
            .required_custom
            .iter()
            .chain(&self.optional_custom)
            .map(|c| c.name());

        let mut seen = HashSet::new();
        for name in leaves.chain(objects).chain(custom) {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateParameter {
                    object: self.name.clone().unwrap_or_else(|| "<root>".to_string()),
                    name: name.to_string(),
                });
            }
        }

        Ok(ObjectParam {
            name: self.name,
            locator: self.locator,
            continue_on_optional_failure: self.continue_on_optional_failure,
            can_be_null: self.can_be_null,
            required_leaves: self.required_leaves,
            optional_leaves: self.optional_leaves,
            required_objects: self.required_objects,
            optional_objects: self.optional_objects,
            required_custom: self.required_custom,
            optional_custom: self.optional_custom,
        })
    }
}

impl<C: ?Sized> Clone for ObjectParamBuilder<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            locator: Arc::clone(&self.locator),
            continue_on_optional_failure: self.continue_on_optional_failure,
            can_be_null: self.can_be_null,
            required_leaves: self.required_leaves.clone(),
            optional_leaves: self.optional_leaves.clone(),
            required_objects: self.required_objects.clone(),
            optional_objects: self.optional_objects.clone(),
            required_custom: self.required_custom.clone(),
            optional_custom: self.optional_custom.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::checks;
    use crate::leaf::FnRetriever;

    type Params = HashMap<String, String>;

    struct Whole;

    impl Locate<Params> for Whole {
        fn locate<'a>(
            &self,
            _name: Option<&str>,
            container: &'a mut Params,
        ) -> std::result::Result<Option<&'a mut Params>, Rejection> {
            Ok(Some(container))
        }

        fn is_present_null(&self, _name: Option<&str>, _container: &Params) -> bool {
            false
        }
    }

    fn leaf(name: &str) -> LeafParam<Params, String> {
        LeafParamBuilder::new(
            name,
            FnRetriever::new(
                |name: &str, params: &mut Params| Ok(params.get(name).cloned()),
                |_: &str, _: &Params| false,
            ),
        )
        .check(checks::always_pass())
        .build()
        .unwrap()
    }

    #[test]
    fn leaf_without_checks_is_rejected() {
        let result = LeafParamBuilder::new(
            "orphan",
            FnRetriever::new(
                |_: &str, _: &mut Params| Ok(None::<String>),
                |_: &str, _: &Params| false,
            ),
        )
        .build();
        assert_eq!(
            result.unwrap_err(),
            SchemaError::MissingChecks("orphan".to_string())
        );
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(
            LeafParamBuilder::new(
                "",
                FnRetriever::new(
                    |_: &str, _: &mut Params| Ok(None::<String>),
                    |_: &str, _: &Params| false,
                ),
            )
            .check(checks::always_pass())
            .build(),
            Err(SchemaError::EmptyName)
        ));
        assert!(matches!(
            ObjectParamBuilder::named("", Whole).build(),
            Err(SchemaError::EmptyName)
        ));
    }

    #[test]
    fn duplicate_names_across_collections_are_rejected() {
        let err = ObjectParamBuilder::root(Whole)
            .required(leaf("email"))
            .optional_custom(CustomParam::new("email", |_: &Params| Ok(())).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateParameter {
                object: "<root>".to_string(),
                name: "email".to_string(),
            }
        );
    }

    #[test]
    fn unnamed_nested_objects_do_not_collide() {
        let first = ObjectParamBuilder::root(Whole).build().unwrap();
        let second = ObjectParamBuilder::root(Whole).build().unwrap();
        assert!(ObjectParamBuilder::root(Whole)
            .optional_object(first)
            .optional_object(second)
            .build()
            .is_ok());
    }

    #[test]
    fn builders_do_not_share_state() {
        let base = ObjectParamBuilder::root(Whole).required(leaf("a"));
        let extended = base.clone().optional(leaf("b")).build().unwrap();
        let plain = base.build().unwrap();

        assert_eq!(plain.required_names(), vec!["a"]);
        assert!(plain.optional_names().is_empty());
        assert_eq!(extended.optional_names(), vec!["b"]);
    }

    #[test]
    fn from_param_leaves_source_untouched() {
        let original = ObjectParamBuilder::named("profile", Whole)
            .continue_on_optional_failure(true)
            .required(leaf("a"))
            .build()
            .unwrap();
        let copy = ObjectParamBuilder::from_param(&original)
            .required(leaf("b"))
            .build()
            .unwrap();

        assert_eq!(original.required_names(), vec!["a"]);
        assert_eq!(copy.required_names(), vec!["a", "b"]);
        assert_eq!(copy.name(), Some("profile"));
        assert!(copy.continue_on_optional_failure());
    }

    #[test]
    fn leaf_from_param_keeps_checks() {
        let strict = LeafParamBuilder::from_param(&leaf("code"))
            .check(checks::min_len(2))
            .build()
            .unwrap();
        let mut params = Params::from([("code".to_string(), "x".to_string())]);
        assert!(leaf("code").check(&mut params).is_ok());
        assert!(strict.check(&mut params).is_err());
    }
}
