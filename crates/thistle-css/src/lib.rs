//! SCSS-dialect to CSS compiler for the thistle toolchain.
//!
//! # Scope
//!
//! This crate implements:
//! - **Selector model** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, universal, class, ID and attribute selectors
//!   - Pseudo-classes, pseudo-elements and wrapped pseudo-selectors
//!   - Placeholder selectors and parent references
//!   - Compound and complex selectors, selector lists
//!   - Specificity calculation
//!
//! - **Selector algebra**
//!   - Compound unification (the most specific compound matching both
//!     operands, or rejection)
//!   - Superselector predicates over compound and complex selectors
//!
//! - **Stylesheet parser**
//!   - Rulesets with SCSS nesting, declarations, comments
//!   - `@extend` (with `!optional`), `@media`, `@supports`,
//!     passthrough at-rules
//!
//! - **Nesting evaluator**
//!   - Parent-selector resolution (including `&` splicing)
//!   - `@media` bubbling
//!   - Extension subset-map population
//!
//! - **Selector extension engine**
//!   - Subset-map lookups, compound/complex/list rewriting
//!   - The combinator-aware selector weaver (`subweave`/`weave`)
//!   - Specificity-based trimming
//!   - Cross-media and unsatisfied-extend diagnostics
//!   - Placeholder removal
//!
//! - **Emitter**
//!   - `nested`, `expanded` and `echo` output styles
//!
//! # Not Implemented
//!
//! - Variables, mixins, functions and expression evaluation (declaration
//!   values pass through verbatim)
//! - `@extend` across `@media` boundaries (diagnosed, not implemented)
//! - The reference combinator (`/deep/`)

/// CSS emission.
pub mod emit;
/// Error types.
pub mod error;
/// Nesting evaluation and subset-map population.
pub mod eval;
/// The selector extension engine.
pub mod extend;
/// Stylesheet parsing.
pub mod parser;
/// Selector model, parsing and algebra.
pub mod selector;

pub use emit::OutputStyle;
pub use error::CompileError;
pub use extend::{Extension, ExtensionSubsetMap};
pub use parser::Stylesheet;
pub use selector::{
    Combinator, ComplexMember, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
    Specificity, parse_selector_list,
};

/// Compile a stylesheet: parse, evaluate nesting, apply `@extend`, strip
/// placeholders, emit.
///
/// With [`OutputStyle::Echo`] the parse tree is printed back instead and
/// no evaluation happens.
pub fn compile(source: &str, style: OutputStyle) -> Result<String, CompileError> {
    let stylesheet = parser::parse(source)?;

    if style == OutputStyle::Echo {
        return Ok(emit::echo(&stylesheet));
    }

    let (mut flattened, subset_map) = eval::evaluate(&stylesheet)?;
    extend::extend_stylesheet(&mut flattened, &subset_map)?;
    extend::remove_placeholder_rules(&mut flattened);

    Ok(emit::emit(&flattened, style))
}
