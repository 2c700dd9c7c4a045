use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{DEFAULT_CAST_MESSAGE, DEFAULT_MISSING_MESSAGE};
use crate::custom::CustomParam;
use crate::leaf::LeafCheck;
use crate::outcome::{ErrorKind, ObjectCheckOutcome, ObjectChecked, ParamFailure, Rejection};

/// Finds the sub-container an [`ObjectParam`] operates on.
pub trait Locate<C: ?Sized>: Send + Sync {
    /// `name` is `None` for a root or array-slot object, which usually
    /// operates on `container` itself.
    ///
    /// Returns `Ok(None)` when the sub-container is absent or null and a
    /// [`Rejection`] when something other than a container is found.
    fn locate<'a>(
        &self,
        name: Option<&str>,
        container: &'a mut C,
    ) -> Result<Option<&'a mut C>, Rejection>;

    /// True when `name` is present in `container` with an explicit null.
    fn is_present_null(&self, name: Option<&str>, container: &C) -> bool;
}

/// Composite parameter validating a sub-container through its children.
///
/// Evaluation order is fixed: required leaves, required objects, required
/// custom params, then optional leaves, optional objects, optional custom
/// params, each in declaration order. The first required failure aborts
/// the check. An optional child that is simply absent is skipped; one that
/// fails otherwise aborts the check unless `continue_on_optional_failure`
/// is set, in which case it is dropped.
///
/// Build with [`ObjectParamBuilder`](crate::ObjectParamBuilder).
pub struct ObjectParam<C: ?Sized> {
    pub(crate) name: Option<String>,
    pub(crate) locator: Arc<dyn Locate<C>>,
    pub(crate) continue_on_optional_failure: bool,
    pub(crate) can_be_null: bool,
    pub(crate) required_leaves: Vec<Arc<dyn LeafCheck<C>>>,
    pub(crate) optional_leaves: Vec<Arc<dyn LeafCheck<C>>>,
    pub(crate) required_objects: Vec<Arc<ObjectParam<C>>>,
    pub(crate) optional_objects: Vec<Arc<ObjectParam<C>>>,
    pub(crate) required_custom: Vec<CustomParam<C>>,
    pub(crate) optional_custom: Vec<CustomParam<C>>,
}

impl<C: ?Sized> ObjectParam<C> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn continue_on_optional_failure(&self) -> bool {
        self.continue_on_optional_failure
    }

    pub fn can_be_null(&self) -> bool {
        self.can_be_null
    }

    /// Names of the required children, in evaluation order.
    pub fn required_names(&self) -> Vec<&str> {
        let leaves = self.required_leaves.iter().map(|l| l.name());
        let objects = self.required_objects.iter().filter_map(|o| o.name());
        let custom = self.required_custom.iter().map(|c| c.name());
        leaves.chain(objects).chain(custom).collect()
    }

    /// Names of the optional children, in evaluation order.
    pub fn optional_names(&self) -> Vec<&str> {
        let leaves = self.optional_leaves.iter().map(|l| l.name());
        let objects = self.optional_objects.iter().filter_map(|o| o.name());
        let custom = self.optional_custom.iter().map(|c| c.name());
        leaves.chain(objects).chain(custom).collect()
    }

    /// Check `container` against this object and all of its descendants.
    pub fn check(&self, container: &mut C) -> ObjectCheckOutcome {
        let name = self.name.as_deref();
        let located = match self.locator.locate(name, container) {
            Ok(located) => located,
            Err(rejection) => return Err(self.cast_failure(rejection)),
        };

        let target = match located {
            Some(target) => target,
            None => {
                if self.can_be_null && self.locator.is_present_null(name, container) {
                    let mut checked = ObjectChecked::named(name);
                    checked.null = true;
                    return Ok(checked);
                }
                return Err(self.missing());
            }
        };

        let mut checked = ObjectChecked::named(name);

        for leaf in &self.required_leaves {
            leaf.check(target).map_err(|f| self.scope(f))?;
            checked.provided.push(leaf.name().to_string());
        }

        for object in &self.required_objects {
            let nested = object.check(target).map_err(|f| self.scope(f))?;
            record_object(&mut checked, nested);
        }

        for custom in &self.required_custom {
            custom.check(&*target).map_err(|f| self.scope(f))?;
            checked.custom.push(custom.name().to_string());
        }

        for leaf in &self.optional_leaves {
            match leaf.check(target) {
                Ok(()) => checked.provided.push(leaf.name().to_string()),
                Err(failure) => self.optional_failed(failure, 1)?,
            }
        }

        for object in &self.optional_objects {
            match object.check(target) {
                Ok(nested) => record_object(&mut checked, nested),
                Err(failure) => self.optional_failed(failure, usize::from(object.name.is_some()))?,
            }
        }

        for custom in &self.optional_custom {
            match custom.check(&*target) {
                Ok(()) => checked.custom.push(custom.name().to_string()),
                Err(failure) => self.optional_failed(failure, 1)?,
            }
        }

        Ok(checked)
    }

    /// `depth` is the path length of a failure that belongs to the optional
    /// child itself: 1 for leaves, custom params, and named objects, 0 for
    /// an unnamed object.
    fn optional_failed(&self, failure: ParamFailure, depth: usize) -> Result<(), ParamFailure> {
        if failure.is_absent_within(depth) {
            trace!(
                object = self.display_name(),
                param = %failure.failing_path(),
                "optional parameter not provided"
            );
            return Ok(());
        }
        if self.continue_on_optional_failure {
            debug!(
                object = self.display_name(),
                param = %failure.failing_path(),
                kind = %failure.kind,
                "ignoring failed optional parameter"
            );
            return Ok(());
        }
        Err(self.scope(failure))
    }

    fn scope(&self, failure: ParamFailure) -> ParamFailure {
        match &self.name {
            Some(name) => failure.within(name.as_str()),
            None => failure,
        }
    }

    fn missing(&self) -> ParamFailure {
        match &self.name {
            Some(name) => ParamFailure::missing(name),
            None => ParamFailure::new(
                ErrorKind::MissingRequiredParameter,
                DEFAULT_MISSING_MESSAGE,
                true,
            ),
        }
    }

    fn cast_failure(&self, rejection: Rejection) -> ParamFailure {
        let message = rejection
            .message
            .unwrap_or_else(|| DEFAULT_CAST_MESSAGE.to_string());
        self.scope(ParamFailure::new(
            ErrorKind::ParameterCastFailure,
            message,
            rejection.safe_to_show,
        ))
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<root>")
    }
}

fn record_object(checked: &mut ObjectChecked, nested: ObjectChecked) {
    if let Some(name) = &nested.name {
        checked.provided.push(name.clone());
    }
    checked.objects.push(nested);
}

impl<C: ?Sized> Clone for ObjectParam<C> {
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

impl<C: ?Sized> fmt::Debug for ObjectParam<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectParam")
            .field("name", &self.name)
            .field("continue_on_optional_failure", &self.continue_on_optional_failure)
            .field("can_be_null", &self.can_be_null)
            .field("required", &self.required_names())
            .field("optional", &self.optional_names())
            .finish()
    }
}
