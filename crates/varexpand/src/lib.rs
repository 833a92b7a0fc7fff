//! # varexpand - dependency ordered variable expansion
//!
//! Expands a set of named values that reference each other with `$NAME`, much like a
//! shell expands `$HOME`, but over an arbitrary key/value mapping.
//!
//! ```
//! # use varexpand::variables;
//! let expansions = varexpand::expand(variables! {
//!     "BIN" => "$HOME/bin",
//!     "HOME" => "/home/someone",
//!     "PRICE" => "$$5",
//! })
//! .unwrap();
//!
//! assert_eq!(expansions["BIN"], "/home/someone/bin");
//! assert_eq!(expansions["PRICE"], "$$5");
//! ```
//!
//! ## Introduction for developers
//!
//! ### Syntax
//!
//! - `$NAME` substitutes the value of `NAME`, where `NAME` matches `[A-Za-z0-9_]*`.
//!   A bare `$` references the empty name, which is never defined.
//! - `$$` is an escaped marker. It never substitutes and stays `$$` unless
//!   [EscapeMode::Collapse] is chosen.
//! - Everything else is copied verbatim. There is no `${NAME}` form.
//!
//! ### Parsing
//!
//! see [parse]
//!
//! Each value is scanned once to find the distinct names it references. A value without
//! markers is final as it is and gets seeded into the output right away.
//!
//! ### Ordering
//!
//! see [graph::Graph::resolve]
//!
//! Every variable becomes a [graph::Node] with edges to the names it references. The graph
//! is resolved in rounds, each round takes every node whose dependencies are all resolved.
//! When a round finds nothing to take, the remaining nodes either form a loop
//! ([graph::ResolveError::Cycle]) or wait on a name nobody defines
//! ([graph::ResolveError::UnknownDependency]).
//!
//! ### Expansion
//!
//! see [Expander]
//!
//! Walking the order, each variable's markers are replaced with the final values of its
//! dependencies. This happens exactly once per variable: substituted text is never scanned
//! for markers again.
//!
//! ### Around the core
//!
//! The core never reads the process environment itself. [expand_with_environment] and
//! [Expander::with_environment] layer the variables over an [environment::Environment].
//! [sources] loads variables from `.env` and `.hcl` files for the `varexpand` binary, and
//! [observe] lets callers follow a run step by step.
//!
pub mod environment;
pub mod expand;
pub mod graph;
pub mod observe;
pub mod parse;
pub mod sources;

pub use expand::{
    expand, expand_with_environment, EscapeMode, ErrorKind, ExpandError, Expander, Expansions,
    Options, Variables,
};
