//! Expansion of a set of variables that reference each other
use crate::environment::{self, Environment};
use crate::graph::{Graph, Node, ResolveError};
use crate::observe::{Event, Observe};
use crate::parse::RawVariable;

/// Variables as given, identifier to raw value
pub type Variables = indexmap::IndexMap<String, String>;

/// Expanded variables, identifier to final value
pub type Expansions = indexmap::IndexMap<String, String>;

/// How escaped markers (`$$`) appear in the final values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapeMode {
    /// `$$` stays `$$`
    #[default]
    Preserve,
    /// `$$` becomes `$`
    Collapse,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub escapes: EscapeMode,
}

/// Expand `vars`
pub fn expand(vars: Variables) -> Result<Expansions, ExpandError> {
    Expander::new(vars, Options::default()).expand()
}

/// Expand `vars` layered over the process environment
pub fn expand_with_environment(vars: Variables) -> Result<Expansions, ExpandError> {
    Expander::with_environment(&environment::ProcessEnvironment, vars, Options::default()).expand()
}

/// One expansion run
///
/// Values without substitution markers are seeded as final right away. Every variable is
/// also registered as [RawVariable]. [Expander::expand] then walks the dependency order
/// and substitutes each remaining variable exactly once.
#[derive(Debug)]
pub struct Expander {
    options: Options,
    seeded: Expansions,
    raw: indexmap::IndexMap<String, RawVariable>,
}

impl Expander {
    pub fn new(vars: Variables, options: Options) -> Self {
        let mut _self = Self {
            options,
            seeded: Default::default(),
            raw: Default::default(),
        };

        for (key, value) in vars {
            let variable = RawVariable::parse(key.clone(), value);
            if variable.is_expanded() {
                let value = variable.expand(&_self.seeded, options.escapes);
                tracing::trace!(%key, %value, "adding initial expanded");
                _self.seeded.insert(key.clone(), value);
            }

            tracing::trace!(?variable, "adding raw variable");
            _self.raw.insert(key, variable);
        }

        _self
    }

    /// Layer `vars` over `environment` before expanding
    pub fn with_environment(
        environment: &dyn Environment,
        vars: Variables,
        options: Options,
    ) -> Self {
        Self::new(environment::merge(environment, vars), options)
    }

    /// One node per variable, dependency-free when it is already expanded
    pub fn graph(&self) -> Graph {
        self.raw
            .values()
            .map(|variable| {
                if self.seeded.contains_key(&variable.id) {
                    Node::leaf(variable.id.clone())
                } else {
                    Node::new(variable.id.clone(), variable.dependencies.clone())
                }
            })
            .collect()
    }

    /// Names in the order they will be expanded
    pub fn order(&self) -> Result<Vec<String>, ResolveError> {
        let graph = self.graph();
        let resolved = graph.resolve()?;
        Ok(resolved.into_iter().map(|node| node.name.clone()).collect())
    }

    pub fn expand(self) -> Result<Expansions, ExpandError> {
        self.run(None)
    }

    /// Like [Expander::expand] but reports every step to `observer`
    pub fn expand_observed(self, observer: &mut dyn Observe) -> Result<Expansions, ExpandError> {
        self.run(Some(observer))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(vars = self.raw.len()))]
    fn run(self, mut observer: Option<&mut dyn Observe>) -> Result<Expansions, ExpandError> {
        let mut emit = |event: Event<'_>| {
            if let Some(observer) = observer.as_mut() {
                observer.observe(&event);
            }
        };

        for (name, value) in &self.seeded {
            emit(Event::Seeded { name, value });
        }
        for variable in self.raw.values() {
            emit(Event::Registered { variable });
        }

        let order = match self.order() {
            Ok(order) => order,
            Err(err) => {
                tracing::debug!(%err, "unable to order variables");
                return Err(ExpandError::new(err.into(), self.seeded));
            }
        };

        tracing::debug!(?order, "resolve order");
        emit(Event::Ordered { order: &order });

        self.walk(&order, &mut emit)
    }

    /// Expand in the given `order`, every name must come after its dependencies
    fn walk(
        self,
        order: &[String],
        emit: &mut dyn FnMut(Event<'_>),
    ) -> Result<Expansions, ExpandError> {
        let Self {
            options,
            seeded: mut expansions,
            raw,
        } = self;

        for (index, name) in order.iter().enumerate() {
            if let Some(value) = expansions.get(name) {
                tracing::trace!(index, %name, %value, "already expanded");
                emit(Event::Resolved { index, name, value });
                continue;
            }

            let Some(variable) = raw.get(name) else {
                tracing::error!(%name, "unable to find variable");
                emit(Event::Failed { name });
                return Err(ExpandError::new(
                    ErrorKind::UnknownVariable(name.clone()),
                    expansions,
                ));
            };

            if variable.missing(&expansions).next().is_some() {
                tracing::error!(%name, "unable to resolve");
                emit(Event::Failed { name });
                return Err(ExpandError::new(
                    ErrorKind::Unresolvable(name.clone()),
                    expansions,
                ));
            }

            let value = variable.expand(&expansions, options.escapes);
            tracing::trace!(index, %name, %value, "resolved");
            emit(Event::Resolved {
                index,
                name,
                value: &value,
            });
            expansions.insert(name.clone(), value);
        }

        Ok(expansions)
    }
}

/// Expansion failed
///
/// `partial` holds the values that were final at the point of failure.
#[derive(thiserror::Error, Debug, Clone, derive_new::new)]
#[error("{kind}")]
pub struct ExpandError {
    pub kind: ErrorKind,
    pub partial: Expansions,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error(transparent)]
    Graph(#[from] ResolveError),
    #[error("unable to resolve '{0}'")]
    Unresolvable(String),
    #[error("unable to find variable '{0}'")]
    UnknownVariable(String),
}
