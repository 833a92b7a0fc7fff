//! Key/value sources that variables are layered over
use crate::expand::Variables;

/// A source of already known variables, e.g. the process environment
pub trait Environment {
    fn variables(&self) -> Variables;
}

/// The environment of the current process
///
/// Entries whose key or value is not valid unicode are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn variables(&self) -> Variables {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

impl Environment for Variables {
    fn variables(&self) -> Variables {
        self.clone()
    }
}

/// Layer `vars` over `environment`, `vars` wins on conflict
pub fn merge(environment: &dyn Environment, vars: Variables) -> Variables {
    let mut merged = environment.variables();
    merged.extend(vars);
    merged
}
