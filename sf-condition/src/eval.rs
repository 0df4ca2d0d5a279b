//! Evaluates a parsed [`Expr`] against a [`RuleContext`].

use crate::ast::{BinOp, Expr};
use crate::context::RuleContext;
use crate::error::{ConditionError, ConditionResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Null,
}

impl Value {
    fn as_number(&self) -> ConditionResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(ConditionError::TypeError(format!(
                "expected a number, got {other:?}"
            ))),
        }
    }

    fn as_bool(&self) -> ConditionResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::String(s) => Ok(!s.is_empty()),
            Value::List(items) => Ok(!items.is_empty()),
            Value::Null => Ok(false),
        }
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => Value::Null,
    }
}

fn lookup_data_path<'a>(data: &'a serde_json::Value, path: &[String]) -> &'a serde_json::Value {
    let mut current = data;
    for segment in path {
        current = match current.get(segment) {
            Some(v) => v,
            None => return &serde_json::Value::Null,
        };
    }
    current
}

pub fn eval(expr: &Expr, ctx: &RuleContext) -> ConditionResult<Value> {
    match expr {
        Expr::EventType => Ok(Value::String(ctx.event_type.clone())),
        Expr::Severity => Ok(Value::String(ctx.severity.clone())),
        Expr::Source => Ok(Value::String(ctx.source.clone())),
        Expr::Tags => Ok(Value::List(
            ctx.tags.iter().cloned().map(Value::String).collect(),
        )),
        Expr::DataPath(path) => {
            let json = lookup_data_path(&ctx.data, path);
            Ok(json_to_value(json))
        }
        Expr::WindowCount(name) => ctx
            .windows
            .get(name)
            .map(|count| Value::Number(*count as f64))
            .ok_or_else(|| ConditionError::UnknownWindow(name.clone())),
        Expr::Metric(name) => ctx
            .metrics
            .get(name)
            .map(|v| Value::Number(*v))
            .ok_or_else(|| ConditionError::UnknownMetric(name.clone())),
        Expr::StringLit(s) => Ok(Value::String(s.clone())),
        Expr::NumberLit(n) => Ok(Value::Number(*n)),
        Expr::BoolLit(b) => Ok(Value::Bool(*b)),
        Expr::ListLit(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(item, ctx)?);
            }
            Ok(Value::List(values))
        }
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, ctx)?.as_bool()?)),
        Expr::BinOp(left, op, right) => eval_binop(left, op, right, ctx),
    }
}

fn eval_binop(left: &Expr, op: &BinOp, right: &Expr, ctx: &RuleContext) -> ConditionResult<Value> {
    match op {
        BinOp::And => {
            let l = eval(left, ctx)?.as_bool()?;
            if !l {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, ctx)?.as_bool()?))
        }
        BinOp::Or => {
            let l = eval(left, ctx)?.as_bool()?;
            if l {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, ctx)?.as_bool()?))
        }
        BinOp::In => {
            let l = eval(left, ctx)?;
            let r = eval(right, ctx)?;
            match r {
                Value::List(items) => Ok(Value::Bool(items.contains(&l))),
                Value::String(s) => match l {
                    Value::String(needle) => Ok(Value::Bool(s.contains(&needle))),
                    other => Err(ConditionError::TypeError(format!(
                        "cannot check membership of {other:?} in a string"
                    ))),
                },
                other => Err(ConditionError::TypeError(format!(
                    "right-hand side of 'in' must be a list or string, got {other:?}"
                ))),
            }
        }
        BinOp::Eq => Ok(Value::Bool(eval(left, ctx)? == eval(right, ctx)?)),
        BinOp::Ne => Ok(Value::Bool(eval(left, ctx)? != eval(right, ctx)?)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let l = eval(left, ctx)?;
            let r = eval(right, ctx)?;
            let ordering = match (&l, &r) {
                (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                _ => l.as_number()?.partial_cmp(&r.as_number()?),
            }
            .ok_or_else(|| ConditionError::TypeError("values are not comparable".to_string()))?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
        BinOp::Add => Ok(Value::Number(eval(left, ctx)?.as_number()? + eval(right, ctx)?.as_number()?)),
        BinOp::Sub => Ok(Value::Number(eval(left, ctx)?.as_number()? - eval(right, ctx)?.as_number()?)),
        BinOp::Mul => Ok(Value::Number(eval(left, ctx)?.as_number()? * eval(right, ctx)?.as_number()?)),
        BinOp::Div => {
            let divisor = eval(right, ctx)?.as_number()?;
            if divisor == 0.0 {
                return Err(ConditionError::TypeError("division by zero".to_string()));
            }
            Ok(Value::Number(eval(left, ctx)?.as_number()? / divisor))
        }
    }
}

/// Evaluate a condition to a boolean the way the rule engine needs it:
/// a type error or unknown window/metric at evaluation time degrades to
/// `false` rather than aborting the whole processing pass, matching how
/// a single misbehaving rule must never block the rest of the pipeline.
pub fn eval_condition(expr: &Expr, ctx: &RuleContext) -> bool {
    match eval(expr, ctx).and_then(|v| v.as_bool()) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "condition evaluation failed, treating as false");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::HashSet;

    #[test]
    fn high_error_rate_fires_above_threshold() {
        let expr = parse("event_type == 'error' and windows['1min'].count() > 10").unwrap();
        let ctx = RuleContext::new("error", "critical", "api-gateway").with_window_count("1min", 11);
        assert!(eval_condition(&expr, &ctx));
    }

    #[test]
    fn high_error_rate_does_not_fire_below_threshold() {
        let expr = parse("event_type == 'error' and windows['1min'].count() > 10").unwrap();
        let ctx = RuleContext::new("error", "critical", "api-gateway").with_window_count("1min", 3);
        assert!(!eval_condition(&expr, &ctx));
    }

    #[test]
    fn activity_spike_matches_membership() {
        let expr = parse(
            "event_type in ['user.login', 'user.logout'] and windows['5min'].count() > 100",
        )
        .unwrap();
        let ctx = RuleContext::new("user.login", "low", "auth-svc").with_window_count("5min", 150);
        assert!(eval_condition(&expr, &ctx));
    }

    #[test]
    fn unknown_window_degrades_to_false() {
        let expr = parse("windows['1min'].count() > 10").unwrap();
        let ctx = RuleContext::new("error", "high", "svc");
        assert!(!eval_condition(&expr, &ctx));
    }

    #[test]
    fn data_path_reads_nested_json() {
        let expr = parse("data.status_code >= 500").unwrap();
        let ctx = RuleContext::new("error", "high", "svc")
            .with_data(serde_json::json!({"status_code": 503}));
        assert!(eval_condition(&expr, &ctx));
    }

    #[test]
    fn tags_membership_checks_the_tag_set() {
        let expr = parse("'beta' in tags").unwrap();
        let mut tags = HashSet::new();
        tags.insert("beta".to_string());
        let ctx = RuleContext::new("custom", "low", "svc").with_tags(tags);
        assert!(eval_condition(&expr, &ctx));
    }
}
