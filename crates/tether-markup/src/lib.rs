#![forbid(unsafe_code)]

//! Inline binding expressions for tether markup attributes.
//!
//! This crate provides:
//! - [`parse`] for `{Path=..., Mode=..., UpdateSourceTrigger=...}` strings
//! - [`BindingExpression`], which turns into an unbound
//!   [`Binding`](tether_core::Binding)

pub mod expression;

pub use expression::{BindingExpression, ExpressionError, parse};
