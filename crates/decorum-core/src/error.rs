//! Unified error types for decorum.
//!
//! ## Error Hierarchy
//!
//! ```text
//! DecorumError (top-level wrapper)
//! ├── LiteralError      - decorator argument text that is not a literal list
//! ├── DecorationError   - resolution, contract and registration failures
//! ├── DispatchError     - receiver-shape and default-access failures at runtime,
//! │                       plus errors raised inside decorated chains
//! └── NativeError       - failures inside callables (policies, base accessors)
//! ```
//!
//! Decoration errors are local to one `decorate` call and never touch an
//! installed chain. Dispatch errors always reach the caller.

use thiserror::Error;

use crate::runtime::Arity;
use crate::{MemberKind, Span};

// ============================================================================
// Literal Errors
// ============================================================================

/// Errors from the sandboxed evaluator for decorator argument text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    /// A character that cannot start any literal.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },

    /// An identifier that is not a literal keyword. Argument text has no
    /// access to variables or functions.
    #[error("unknown identifier '{name}' at {span}: only literal values are allowed")]
    UnknownIdentifier { name: String, span: Span },

    /// A token appeared where something else was expected.
    #[error("expected {expected} at {span}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        span: Span,
    },
}

impl LiteralError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LiteralError::UnexpectedChar { span, .. } => *span,
            LiteralError::UnterminatedString { span } => *span,
            LiteralError::InvalidNumber { span, .. } => *span,
            LiteralError::UnknownIdentifier { span, .. } => *span,
            LiteralError::Expected { span, .. } => *span,
        }
    }
}

// ============================================================================
// Conversion / Native Errors
// ============================================================================

/// Errors that can occur when converting a [`Dynamic`](crate::Dynamic) into a Rust value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: i64, target_type: &'static str },

    #[error("float conversion error: value {value} cannot be represented as {target_type}")]
    FloatConversion {
        value: f64,
        target_type: &'static str,
    },

    #[error("conversion failed: {message}")]
    Failed { message: String },
}

/// Errors raised while a callable runs: base accessors, method bodies and
/// decorator policies all report through this type.
#[derive(Debug, Error)]
pub enum NativeError {
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("argument index {index} out of bounds (call has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    #[error("'{callable}' accepts {expected} argument(s), called with {got}")]
    ArityMismatch {
        callable: String,
        expected: Arity,
        got: usize,
    },

    #[error("'{callable}' must produce {expected} output(s), produced {got}")]
    OutputMismatch {
        callable: String,
        expected: Arity,
        got: usize,
    },

    #[error("invalid receiver: {message}")]
    InvalidReceiver { message: String },

    #[error("stale object handle: object at index {index} has been freed")]
    StaleHandle { index: u32 },

    /// A call-limiting policy has used up its allowance.
    #[error("'{member}' may only be called {limit} time(s)")]
    Exhausted { member: String, limit: u64 },

    /// An immutability policy rejected a second write.
    #[error("'{member}' is immutable once set")]
    Immutable { member: String },

    /// An access-restriction policy rejected a call from outside the class.
    #[error("'{member}' is only accessible from within class '{class}'")]
    AccessDenied { member: String, class: String },

    /// A nested dispatch made by a method body failed.
    #[error(transparent)]
    Dispatch(Box<DispatchError>),

    #[error("{message}")]
    Other { message: String },
}

impl NativeError {
    pub fn invalid_receiver(message: impl Into<String>) -> Self {
        NativeError::InvalidReceiver {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }
}

impl From<DispatchError> for NativeError {
    fn from(error: DispatchError) -> Self {
        NativeError::Dispatch(Box::new(error))
    }
}

// ============================================================================
// Decoration Errors
// ============================================================================

/// Why a decorator or a partially composed chain broke the calling convention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// The decorator cannot take the wrapped callable, the context and the
    /// declared extra arguments.
    #[error("decorator accepts {params} parameter(s), needs {required} for {extra} argument(s)")]
    DecoratorParams {
        params: Arity,
        required: usize,
        extra: usize,
    },

    #[error("decorator returned {count} value(s), expected exactly one")]
    OutputCount { count: usize },

    #[error("decorator returned a {type_name}, expected a callable")]
    NotCallable { type_name: &'static str },

    #[error("{kind} chain must accept exactly {expected} parameter(s), accepts {actual}")]
    ChainParams {
        kind: MemberKind,
        expected: usize,
        actual: Arity,
    },

    #[error("{kind} chain must produce exactly {expected} output(s), produces {actual}")]
    ChainOutputs {
        kind: MemberKind,
        expected: usize,
        actual: Arity,
    },

    /// The decorator itself failed while building its wrapper.
    #[error("decorator failed while wrapping: {message}")]
    ApplyFailed { message: String },
}

/// Errors raised while installing a decoration or registering classes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecorationError {
    /// A decorator name was not found in the namespace.
    #[error("unresolved decorator '@{name}' on {kind} '{member}'")]
    Resolution {
        name: String,
        kind: MemberKind,
        member: String,
    },

    /// Decorator argument text could not be evaluated.
    #[error("invalid arguments for '@{decorator}' on {kind} '{member}': {source}")]
    InvalidArguments {
        decorator: String,
        kind: MemberKind,
        member: String,
        #[source]
        source: LiteralError,
    },

    /// A composition step broke the calling convention. `step` counts wraps
    /// from the innermost (1) outwards.
    #[error("step {step} ('@{decorator}') broke the contract for {kind} '{member}': {reason}")]
    ContractViolation {
        kind: MemberKind,
        member: String,
        step: usize,
        decorator: String,
        #[source]
        reason: ContractViolation,
    },

    #[error("class '{class}' declares no {kind} '{member}'")]
    UnknownMember {
        class: String,
        member: String,
        kind: MemberKind,
    },

    /// Attribute text matched more than once or was malformed, and strict
    /// attribute mode is on.
    #[error("ambiguous {keyword} attribute on '{member}' of class '{class}'")]
    AmbiguousAttribute {
        class: String,
        member: String,
        keyword: &'static str,
    },

    #[error("decorator '{0}' is already registered")]
    DuplicateDecorator(String),

    #[error("{args} argument list(s) given for {decorators} decorator(s)")]
    ArgumentCountMismatch { decorators: usize, args: usize },

    #[error("cannot decorate a {type_name}: not an instance")]
    NotAnInstance { type_name: &'static str },

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("class '{class}' declares '{member}' more than once")]
    DuplicateMember { class: String, member: String },

    #[error("stale object handle: object at index {index} has been freed")]
    StaleHandle { index: u32 },
}

// ============================================================================
// Dispatch Errors
// ============================================================================

/// Errors raised by the interception dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Anything raised inside a decorated chain, rewrapped with the member it
    /// was decorating.
    #[error("error in decorated {kind} '{member}': {source}")]
    DecoratedCallback {
        kind: MemberKind,
        member: String,
        #[source]
        source: NativeError,
    },

    #[error("'{member}' yields at most {available} output(s), {requested} requested")]
    TooManyOutputs {
        member: String,
        requested: usize,
        available: usize,
    },

    #[error("'{member}' is read from {count} instances and then accessed further")]
    AmbiguousIntermediateIndex { member: String, count: usize },

    #[error("cannot assign '{member}' on {count} instances at once")]
    MultiAssign { member: String, count: usize },

    #[error("cannot assign into the temporary result of '{member}'")]
    AssignmentToTemporary { member: String },

    #[error("'{type_name}' has no member '{member}'")]
    NoSuchMember { type_name: String, member: String },

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("cannot apply {segment} to a {type_name}")]
    InvalidAccess {
        segment: String,
        type_name: &'static str,
    },

    #[error("stale object handle: object at index {index} has been freed")]
    StaleHandle { index: u32 },

    /// An undecorated method body failed.
    #[error("method '{member}' failed: {source}")]
    MethodFailed {
        member: String,
        #[source]
        source: NativeError,
    },

    #[error("dispatch nested deeper than {limit} levels")]
    RecursionLimit { limit: usize },
}

impl DispatchError {
    /// The member named by this error, when there is one.
    pub fn member(&self) -> Option<&str> {
        match self {
            DispatchError::DecoratedCallback { member, .. }
            | DispatchError::TooManyOutputs { member, .. }
            | DispatchError::AmbiguousIntermediateIndex { member, .. }
            | DispatchError::MultiAssign { member, .. }
            | DispatchError::AssignmentToTemporary { member }
            | DispatchError::NoSuchMember { member, .. }
            | DispatchError::MethodFailed { member, .. } => Some(member),
            DispatchError::IndexOutOfBounds { .. }
            | DispatchError::InvalidAccess { .. }
            | DispatchError::StaleHandle { .. }
            | DispatchError::RecursionLimit { .. } => None,
        }
    }
}

// ============================================================================
// Top-level
// ============================================================================

/// Any error produced by decorum.
#[derive(Debug, Error)]
pub enum DecorumError {
    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error(transparent)]
    Decoration(#[from] DecorationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Native(#[from] NativeError),
}
