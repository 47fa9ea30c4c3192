//! Error types for parsing, evaluation and selector extension.

use std::fmt;

/// Errors that can occur while compiling a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A syntax error in the input, with its source line.
    Parse {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// The parent reference `&` was used outside any enclosing rule.
    TopLevelParentRef {
        /// 1-based source line of the offending rule.
        line: usize,
    },
    /// The argument of `@extend` was not a list of compound selectors.
    InvalidExtendTarget {
        /// The offending selector, as written.
        target: String,
        /// 1-based source line of the `@extend`.
        line: usize,
    },
    /// An `@extend` inside `@media` reached for a selector outside its
    /// media block.
    CrossMediaExtend {
        /// The extendee, as written.
        target: String,
        /// 1-based source line of the `@extend`.
        line: usize,
    },
    /// A non-optional `@extend` found no matching selector anywhere in
    /// the stylesheet.
    UnsatisfiedExtend {
        /// The extending selector.
        extender: String,
        /// The extendee that was never found.
        target: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse { line, message } => {
                write!(f, "parse error on line {line}: {message}")
            }
            CompileError::TopLevelParentRef { line } => {
                write!(
                    f,
                    "parent selector \"&\" used outside of any rule on line {line}"
                )
            }
            CompileError::InvalidExtendTarget { target, line } => {
                write!(
                    f,
                    "@extend target \"{target}\" on line {line} must be a compound selector"
                )
            }
            CompileError::CrossMediaExtend { target, line } => {
                write!(
                    f,
                    "You may not @extend an outer selector from within @media.\n\
                     You may only @extend selectors within the same directive.\n\
                     From \"@extend {target}\" on line {line}."
                )
            }
            CompileError::UnsatisfiedExtend { extender, target } => {
                write!(
                    f,
                    "\"{extender}\" failed to @extend \"{target}\".\n\
                     The selector \"{target}\" was not found.\n\
                     Use \"@extend {target} !optional\" if the extend should be able to fail."
                )
            }
        }
    }
}

impl std::error::Error for CompileError {}
