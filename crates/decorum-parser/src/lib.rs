//! Decorator attribute parsing for decorum.
//!
//! Two independent pieces:
//!
//! - [`attribute`]: finds the `GetDecorator` / `SetDecorator` / `Decorator`
//!   clause for one member kind in free-text metadata and splits it into
//!   ordered [`DecoratorSpec`](decorum_core::DecoratorSpec)s with raw
//!   argument text.
//! - [`literal`]: evaluates raw argument text into values, accepting
//!   literals only.
//!
//! # Example
//!
//! ```
//! use decorum_core::{Dynamic, MemberKind, SpecArgs};
//! use decorum_parser::{AttributeParse, evaluate_arguments, parse_attribute};
//!
//! let text = "Decorator = [@oneShot, @delayedExec(3)]";
//! let AttributeParse::Decorated(attribute) = parse_attribute(text, MemberKind::Method) else {
//!     unreachable!()
//! };
//! assert_eq!(attribute.specs.len(), 2);
//!
//! let SpecArgs::Text(text) = &attribute.specs[1].args else { unreachable!() };
//! assert_eq!(evaluate_arguments(text).unwrap(), vec![Dynamic::Int(3)]);
//! ```

pub mod attribute;
pub mod cursor;
pub mod literal;

pub use attribute::{Ambiguity, AttributeParse, parse_attribute};
pub use literal::evaluate_arguments;
