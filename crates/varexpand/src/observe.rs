//! Hook to follow an expansion step by step
use crate::parse::RawVariable;

/// Observer that receives each [Event] of an expansion run
pub trait Observe {
    fn observe(&mut self, event: &Event<'_>);
}

// blanket impl for FnMut
impl<F> Observe for F
where
    F: FnMut(&Event<'_>),
{
    fn observe(&mut self, event: &Event<'_>) {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// value needed no substitution
    Seeded { name: &'a str, value: &'a str },
    Registered { variable: &'a RawVariable },
    /// resolution order was found
    Ordered { order: &'a [String] },
    Resolved {
        index: usize,
        name: &'a str,
        value: &'a str,
    },
    Failed { name: &'a str },
}

impl std::fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Seeded { name, value } => write!(f, "seeded '{name}' with '{value}'"),
            Event::Registered { variable } => write!(
                f,
                "registered '{}' with raw value '{}' and deps {:?}",
                variable.id, variable.raw_value, variable.dependencies
            ),
            Event::Ordered { order } => write!(f, "resolve order: {}", order.join(", ")),
            Event::Resolved { index, name, value } => {
                write!(f, "[{index}] resolved '{name}' with value '{value}'")
            }
            Event::Failed { name } => write!(f, "unable to resolve '{name}'"),
        }
    }
}
