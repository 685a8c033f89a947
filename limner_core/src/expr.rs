// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expressions, filters, features and the expression oracle.
//!
//! The caches never interpret an [`Expression`] themselves. They ask an
//! [`ExpressionOracle`] two questions: *is this expression static?* and *what
//! does it evaluate to for this (optional) feature?* Evaluation never fails:
//! a missing expression, a failed evaluation or a type mismatch all collapse
//! to the caller's default through the typed helpers
//! ([`evaluate_f64`](ExpressionOracle::evaluate_f64) and friends).
//!
//! [`DefaultOracle`] is a small reference engine over the [`Expression`] and
//! [`Filter`] trees defined here. Applications with a richer expression
//! language plug in their own oracle through
//! [`CacheContext`](crate::cache::CacheContext).

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cache::AttributeSetBuilder;
use crate::geometry::Geometry;
use crate::paint::Color;

/// A dynamically typed attribute or expression value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Floating-point number.
    Number(f64),
    /// Text.
    Text(Arc<str>),
    /// Color.
    Color(Color),
}

impl Value {
    /// Converts to a number: numbers as-is, booleans as 0/1, text parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if !n.is_nan() => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(t) => t.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    /// Converts to a color: colors as-is, text parsed as hex.
    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Text(t) => Color::parse_hex(t),
            _ => None,
        }
    }

    /// Converts to text. `Null` has no text form.
    #[must_use]
    pub fn as_text(&self) -> Option<Arc<str>> {
        match self {
            Self::Null => None,
            Self::Text(t) => Some(t.clone()),
            Self::Bool(b) => Some(Arc::from(if *b { "true" } else { "false" })),
            Self::Number(n) => Some(Arc::from(format_number(*n).as_str())),
            Self::Color(c) => Some(Arc::from(
                format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b).as_str(),
            )),
        }
    }

    /// Converts to a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(t) => match t.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compares two values: numerically when both sides are numeric,
    /// otherwise by text.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self.as_text(), other.as_text()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "integral value checked to fit"
        )]
        let int = n as i64;
        format!("{int}")
    } else {
        format!("{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// `lhs + rhs`
    Add,
    /// `lhs - rhs`
    Subtract,
    /// `lhs * rhs`
    Multiply,
    /// `lhs / rhs` (division by zero yields no value)
    Divide,
}

/// Comparison operators used by [`Filter::Compare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CompareOp {
    fn test(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// A function from a feature's attributes to a [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A constant.
    Literal(Value),
    /// The named feature attribute.
    Property(Arc<str>),
    /// Numeric operation over two sub-expressions.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        lhs: Box<Expression>,
        /// Right operand.
        rhs: Box<Expression>,
    },
    /// Text concatenation of all parts (`Null` parts contribute nothing).
    Concat(Vec<Expression>),
}

impl Expression {
    /// A constant expression.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// A numeric constant.
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::Literal(Value::Number(n))
    }

    /// A text constant.
    #[must_use]
    pub fn text(s: &str) -> Self {
        Self::Literal(Value::from(s))
    }

    /// A color constant.
    #[must_use]
    pub fn color(c: Color) -> Self {
        Self::Literal(Value::Color(c))
    }

    /// A reference to the attribute `name`.
    #[must_use]
    pub fn property(name: &str) -> Self {
        Self::Property(Arc::from(name))
    }

    /// `lhs op rhs`.
    #[must_use]
    pub fn arithmetic(op: ArithmeticOp, lhs: Self, rhs: Self) -> Self {
        Self::Arithmetic {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// A boolean predicate over a feature, used as a rule's selection filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Accepts every feature.
    Include,
    /// Rejects every feature.
    Exclude,
    /// Compares two expressions.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        lhs: Expression,
        /// Right operand.
        rhs: Expression,
    },
    /// Accepts when the expression evaluates to nothing or `Null`.
    IsNull(Expression),
    /// Accepts when every child accepts.
    And(Vec<Filter>),
    /// Accepts when any child accepts.
    Or(Vec<Filter>),
    /// Inverts the child.
    Not(Box<Filter>),
}

impl Filter {
    /// `lhs op rhs`.
    #[must_use]
    pub fn compare(op: CompareOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Compare { op, lhs, rhs }
    }
}

/// A feature whose attributes style expressions read.
pub trait Feature {
    /// Returns the value of the attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Returns the display-space geometry, if any.
    fn geometry(&self) -> Option<&Geometry> {
        None
    }
}

impl fmt::Debug for dyn Feature + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature").finish_non_exhaustive()
    }
}

/// A map-backed [`Feature`].
#[derive(Clone, Debug, Default)]
pub struct SimpleFeature {
    attributes: FxHashMap<Arc<str>, Value>,
    geometry: Option<Geometry>,
}

impl SimpleFeature {
    /// Creates a feature with no attributes and no geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(Arc::from(name), value.into());
        self
    }

    /// Sets the geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Adds (or replaces) an attribute in place.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(Arc::from(name), value.into());
    }
}

impl Feature for SimpleFeature {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }
}

/// Classifies and evaluates expressions on behalf of the caches.
///
/// Implementations must be pure: the same expression and feature always
/// yield the same result, and `is_static` must be stable for a given
/// expression.
pub trait ExpressionOracle: fmt::Debug + Send + Sync {
    /// Returns `true` if the expression ignores its feature.
    fn is_static(&self, expr: &Expression) -> bool;

    /// Evaluates `expr`, returning `None` on failure.
    fn evaluate(&self, expr: &Expression, feature: Option<&dyn Feature>) -> Option<Value>;

    /// Adds every attribute name `expr` reads to `out`.
    fn collect_attributes(&self, expr: &Expression, out: &mut AttributeSetBuilder);

    /// Returns `true` if the filter ignores its feature.
    fn is_filter_static(&self, filter: &Filter) -> bool;

    /// Evaluates a filter. Evaluation failures reject.
    fn evaluate_filter(&self, filter: &Filter, feature: Option<&dyn Feature>) -> bool;

    /// Adds every attribute name `filter` reads to `out`.
    fn collect_filter_attributes(&self, filter: &Filter, out: &mut AttributeSetBuilder);

    /// Like [`is_static`](Self::is_static); a missing expression is static.
    fn is_static_opt(&self, expr: Option<&Expression>) -> bool {
        expr.is_none_or(|e| self.is_static(e))
    }

    /// Evaluates to a number, or `default`.
    fn evaluate_f64(
        &self,
        expr: Option<&Expression>,
        feature: Option<&dyn Feature>,
        default: f64,
    ) -> f64 {
        expr.and_then(|e| self.evaluate(e, feature))
            .and_then(|v| v.as_f64())
            .unwrap_or(default)
    }

    /// Evaluates to a color, or `default`.
    fn evaluate_color(
        &self,
        expr: Option<&Expression>,
        feature: Option<&dyn Feature>,
        default: Color,
    ) -> Color {
        expr.and_then(|e| self.evaluate(e, feature))
            .and_then(|v| v.as_color())
            .unwrap_or(default)
    }

    /// Evaluates to text; `None` when missing or `Null`.
    fn evaluate_text(
        &self,
        expr: Option<&Expression>,
        feature: Option<&dyn Feature>,
    ) -> Option<Arc<str>> {
        expr.and_then(|e| self.evaluate(e, feature))
            .and_then(|v| v.as_text())
    }
}

/// Reference [`ExpressionOracle`] for the [`Expression`] and [`Filter`] trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOracle;

impl ExpressionOracle for DefaultOracle {
    fn is_static(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Literal(_) => true,
            Expression::Property(_) => false,
            Expression::Arithmetic { lhs, rhs, .. } => self.is_static(lhs) && self.is_static(rhs),
            Expression::Concat(parts) => parts.iter().all(|p| self.is_static(p)),
        }
    }

    fn evaluate(&self, expr: &Expression, feature: Option<&dyn Feature>) -> Option<Value> {
        match expr {
            Expression::Literal(v) => Some(v.clone()),
            Expression::Property(name) => feature.and_then(|f| f.attribute(name)),
            Expression::Arithmetic { op, lhs, rhs } => {
                let a = self.evaluate(lhs, feature)?.as_f64()?;
                let b = self.evaluate(rhs, feature)?.as_f64()?;
                let n = match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Subtract => a - b,
                    ArithmeticOp::Multiply => a * b,
                    ArithmeticOp::Divide if b == 0.0 => return None,
                    ArithmeticOp::Divide => a / b,
                };
                Some(Value::Number(n))
            }
            Expression::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    if let Some(text) = self.evaluate(part, feature).and_then(|v| v.as_text()) {
                        out.push_str(&text);
                    }
                }
                Some(Value::from(out))
            }
        }
    }

    fn collect_attributes(&self, expr: &Expression, out: &mut AttributeSetBuilder) {
        match expr {
            Expression::Literal(_) => {}
            Expression::Property(name) => out.insert(name.clone()),
            Expression::Arithmetic { lhs, rhs, .. } => {
                self.collect_attributes(lhs, out);
                self.collect_attributes(rhs, out);
            }
            Expression::Concat(parts) => {
                for part in parts {
                    self.collect_attributes(part, out);
                }
            }
        }
    }

    fn is_filter_static(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Include | Filter::Exclude => true,
            Filter::Compare { lhs, rhs, .. } => self.is_static(lhs) && self.is_static(rhs),
            Filter::IsNull(e) => self.is_static(e),
            Filter::And(children) | Filter::Or(children) => {
                children.iter().all(|c| self.is_filter_static(c))
            }
            Filter::Not(child) => self.is_filter_static(child),
        }
    }

    fn evaluate_filter(&self, filter: &Filter, feature: Option<&dyn Feature>) -> bool {
        match filter {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::Compare { op, lhs, rhs } => {
                let (Some(a), Some(b)) = (self.evaluate(lhs, feature), self.evaluate(rhs, feature))
                else {
                    return false;
                };
                a.compare(&b).is_some_and(|ord| op.test(ord))
            }
            Filter::IsNull(e) => self.evaluate(e, feature).is_none_or(|v| v.is_null()),
            Filter::And(children) => children.iter().all(|c| self.evaluate_filter(c, feature)),
            Filter::Or(children) => children.iter().any(|c| self.evaluate_filter(c, feature)),
            Filter::Not(child) => !self.evaluate_filter(child, feature),
        }
    }

    fn collect_filter_attributes(&self, filter: &Filter, out: &mut AttributeSetBuilder) {
        match filter {
            Filter::Include | Filter::Exclude => {}
            Filter::Compare { lhs, rhs, .. } => {
                self.collect_attributes(lhs, out);
                self.collect_attributes(rhs, out);
            }
            Filter::IsNull(e) => self.collect_attributes(e, out),
            Filter::And(children) | Filter::Or(children) => {
                for child in children {
                    self.collect_filter_attributes(child, out);
                }
            }
            Filter::Not(child) => self.collect_filter_attributes(child, out),
        }
    }
}
