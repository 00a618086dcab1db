// crates/core/src/script/stdlib.rs

//! Builtins seeded into every tool namespace.
//!
//! Besides the core arithmetic/string/collection vocabulary, tools get a
//! fixed set of collaborators: `path/*`, `file/*`, `log/*`, `re/*`,
//! `time/*` and `json/*`. Nothing here can reach the registry or the
//! network.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{RuntimeError, RuntimeResult};
use super::eval::{dict_key, Interpreter};
use super::value::{Function, Value};

/// Upper bound on collections built by `range` and repetition.
const MAX_BUILT_LEN: usize = 10_000_000;

pub type BuiltinFn = fn(&mut Interpreter<'_>, Vec<Value>) -> RuntimeResult<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn check(&self, function: &str, actual: usize) -> RuntimeResult<()> {
        let (ok, expected) = match *self {
            Arity::Fixed(n) => (actual == n, n.to_string()),
            Arity::Range(lo, hi) => (
                (lo..=hi).contains(&actual),
                format!("{} to {}", lo, hi),
            ),
            Arity::AtLeast(n) => (actual >= n, format!("at least {}", n)),
        };
        if ok {
            Ok(())
        } else {
            Err(RuntimeError::ArityMismatch {
                function: function.to_string(),
                expected,
                actual,
            })
        }
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

const fn builtin(name: &'static str, arity: Arity, func: BuiltinFn) -> Builtin {
    Builtin { name, arity, func }
}

use Arity::{AtLeast, Fixed, Range};

static BUILTINS: &[Builtin] = &[
    // arithmetic
    builtin("+", AtLeast(0), add),
    builtin("-", AtLeast(1), sub),
    builtin("*", AtLeast(0), mul),
    builtin("/", Fixed(2), div),
    builtin("//", Fixed(2), floor_div),
    builtin("%", Fixed(2), rem),
    builtin("abs", Fixed(1), abs),
    builtin("pow", Fixed(2), pow),
    builtin("sqrt", Fixed(1), sqrt),
    builtin("round", Range(1, 2), round),
    builtin("floor", Fixed(1), floor),
    builtin("ceil", Fixed(1), ceil),
    builtin("min", AtLeast(1), min),
    builtin("max", AtLeast(1), max),
    // comparison and logic
    builtin("=", AtLeast(1), eq),
    builtin("==", AtLeast(1), eq),
    builtin("!=", Fixed(2), ne),
    builtin("<", AtLeast(1), lt),
    builtin(">", AtLeast(1), gt),
    builtin("<=", AtLeast(1), le),
    builtin(">=", AtLeast(1), ge),
    builtin("not", Fixed(1), not),
    // conversions and predicates
    builtin("int", Fixed(1), to_int),
    builtin("float", Fixed(1), to_float),
    builtin("str", AtLeast(0), to_str),
    builtin("bool", Fixed(1), to_bool),
    builtin("type", Fixed(1), type_of),
    builtin("nil?", Fixed(1), is_nil),
    builtin("bool?", Fixed(1), is_bool),
    builtin("int?", Fixed(1), is_int),
    builtin("float?", Fixed(1), is_float),
    builtin("number?", Fixed(1), is_number),
    builtin("str?", Fixed(1), is_str),
    builtin("list?", Fixed(1), is_list),
    builtin("dict?", Fixed(1), is_dict),
    builtin("fn?", Fixed(1), is_fn),
    builtin("empty?", Fixed(1), is_empty),
    // strings
    builtin("len", Fixed(1), len),
    builtin("upper", Fixed(1), upper),
    builtin("lower", Fixed(1), lower),
    builtin("capitalize", Fixed(1), capitalize),
    builtin("trim", Fixed(1), trim),
    builtin("split", Range(1, 2), split),
    builtin("join", Fixed(2), join),
    builtin("replace", Fixed(3), replace),
    builtin("format", AtLeast(1), format),
    builtin("chars", Fixed(1), chars),
    builtin("starts-with?", Fixed(2), starts_with),
    builtin("ends-with?", Fixed(2), ends_with),
    builtin("digit?", Fixed(1), is_digit),
    builtin("alpha?", Fixed(1), is_alpha),
    builtin("space?", Fixed(1), is_space),
    // sequences and collections
    builtin("contains?", Fixed(2), contains),
    builtin("index-of", Fixed(2), index_of),
    builtin("count", Fixed(2), count),
    builtin("reverse", Fixed(1), reverse),
    builtin("slice", Range(2, 3), slice),
    builtin("list", AtLeast(0), list),
    builtin("dict", AtLeast(0), dict),
    builtin("first", Fixed(1), first),
    builtin("last", Fixed(1), last),
    builtin("rest", Fixed(1), rest),
    builtin("nth", Fixed(2), nth),
    builtin("get", Range(2, 3), get),
    builtin("append", Fixed(2), append),
    builtin("concat", AtLeast(0), concat),
    builtin("range", Range(1, 3), range),
    builtin("sort", Range(1, 2), sort),
    builtin("unique", Fixed(1), unique),
    builtin("flatten", Fixed(1), flatten),
    builtin("sum", Fixed(1), sum),
    builtin("product", Fixed(1), product),
    builtin("zip", Fixed(2), zip),
    builtin("enumerate", Fixed(1), enumerate),
    builtin("keys", Fixed(1), keys),
    builtin("values", Fixed(1), values),
    builtin("items", Fixed(1), items),
    builtin("assoc", Fixed(3), assoc),
    builtin("dissoc", Fixed(2), dissoc),
    builtin("has-key?", Fixed(2), has_key),
    // higher-order
    builtin("map", Fixed(2), map),
    builtin("filter", Fixed(2), filter),
    builtin("reduce", Range(2, 3), reduce),
    builtin("sort-by", Range(2, 3), sort_by),
    builtin("apply", Fixed(2), apply),
    builtin("any?", Range(1, 2), any),
    builtin("all?", Range(1, 2), all),
    builtin("error", Fixed(1), raise),
    // collaborators
    builtin("path/exists?", Fixed(1), path_exists),
    builtin("path/is-file?", Fixed(1), path_is_file),
    builtin("path/is-dir?", Fixed(1), path_is_dir),
    builtin("path/join", AtLeast(1), path_join),
    builtin("path/basename", Fixed(1), path_basename),
    builtin("path/extension", Fixed(1), path_extension),
    builtin("file/read", Fixed(1), file_read),
    builtin("file/lines", Fixed(1), file_lines),
    builtin("file/write", Fixed(2), file_write),
    builtin("log/info", AtLeast(1), log_info),
    builtin("log/warn", AtLeast(1), log_warn),
    builtin("re/match?", Fixed(2), re_is_match),
    builtin("re/find-all", Fixed(2), re_find_all),
    builtin("re/replace", Fixed(3), re_replace),
    builtin("re/split", Fixed(2), re_split),
    builtin("time/now", Fixed(0), time_now),
    builtin("time/now-ms", Fixed(0), time_now_ms),
    builtin("json/parse", Fixed(1), json_parse),
    builtin("json/dump", Fixed(1), json_dump),
];

static INDEX: Lazy<HashMap<&'static str, &'static Builtin>> =
    Lazy::new(|| BUILTINS.iter().map(|b| (b.name, b)).collect());

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    INDEX.get(name).copied()
}

/// Every builtin name, in declaration order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

// ---------------------------------------------------------------------------
// argument helpers

fn expect_str<'a>(op: &str, v: &'a Value) -> RuntimeResult<&'a str> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(op, "str", other.type_name())),
    }
}

fn expect_int(op: &str, v: &Value) -> RuntimeResult<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(RuntimeError::type_error(op, "int", other.type_name())),
    }
}

fn expect_list<'a>(op: &str, v: &'a Value) -> RuntimeResult<&'a [Value]> {
    match v {
        Value::List(items) => Ok(items),
        other => Err(RuntimeError::type_error(op, "list", other.type_name())),
    }
}

fn expect_dict<'a>(op: &str, v: &'a Value) -> RuntimeResult<&'a BTreeMap<String, Value>> {
    match v {
        Value::Dict(map) => Ok(map),
        other => Err(RuntimeError::type_error(op, "dict", other.type_name())),
    }
}

fn expect_fn(op: &str, v: &Value) -> RuntimeResult<Function> {
    match v {
        Value::Function(f) => Ok(f.clone()),
        other => Err(RuntimeError::type_error(op, "function", other.type_name())),
    }
}

/// Iterable view: lists as-is, strings as characters, dicts as keys.
fn elements(op: &str, v: &Value) -> RuntimeResult<Vec<Value>> {
    match v {
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(map) => Ok(map.keys().cloned().map(Value::Str).collect()),
        other => Err(RuntimeError::type_error(op, "iterable", other.type_name())),
    }
}

/// Python-style index resolution; negative indices count from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

fn clamp_bound(index: i64, len: usize) -> usize {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    i.clamp(0, len) as usize
}

/// Only reachable when a builtin is invoked without its arity check.
fn arity_violation(op: &str) -> RuntimeError {
    RuntimeError::InvalidValue(format!("{}: unexpected number of arguments", op))
}

fn bounded(op: &str, len: usize) -> RuntimeResult<()> {
    if len > MAX_BUILT_LEN {
        Err(RuntimeError::InvalidValue(format!(
            "{}: result would have {} elements",
            op, len
        )))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// arithmetic

#[derive(Clone, Copy)]
enum Num {
    I(i64),
    F(f64),
}

impl Num {
    fn of(op: &str, v: &Value) -> RuntimeResult<Num> {
        match v {
            Value::Int(i) => Ok(Num::I(*i)),
            Value::Float(f) => Ok(Num::F(*f)),
            Value::Bool(b) => Ok(Num::I(*b as i64)),
            other => Err(RuntimeError::type_error(op, "number", other.type_name())),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::I(i) => i as f64,
            Num::F(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::I(i) => i == 0,
            Num::F(f) => f == 0.0,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::I(i) => Value::Int(i),
            Num::F(f) => Value::Float(f),
        }
    }
}

fn combine(
    op: &str,
    a: Num,
    b: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> RuntimeResult<Num> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => int_op(x, y)
            .map(Num::I)
            .ok_or_else(|| RuntimeError::Overflow(op.to_string())),
        _ => Ok(Num::F(float_op(a.as_f64(), b.as_f64()))),
    }
}

fn fold_numbers(
    op: &str,
    args: &[Value],
    identity: i64,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> RuntimeResult<Value> {
    let mut acc = Num::I(identity);
    for v in args {
        acc = combine(op, acc, Num::of(op, v)?, int_op, float_op)?;
    }
    Ok(acc.into_value())
}

fn add(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match args.first() {
        Some(Value::Str(_)) => {
            let mut out = String::new();
            for v in &args {
                out.push_str(expect_str("+", v)?);
            }
            Ok(Value::Str(out))
        }
        Some(Value::List(_)) => concat_lists("+", &args),
        _ => fold_numbers("+", &args, 0, i64::checked_add, |a, b| a + b),
    }
}

fn sub(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let first = Num::of("-", &args[0])?;
    if args.len() == 1 {
        return match first {
            Num::I(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::Overflow("-".into())),
            Num::F(f) => Ok(Value::Float(-f)),
        };
    }
    let mut acc = first;
    for v in &args[1..] {
        acc = combine("-", acc, Num::of("-", v)?, i64::checked_sub, |a, b| a - b)?;
    }
    Ok(acc.into_value())
}

fn mul(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match args.as_slice() {
        [Value::Str(s), Value::Int(n)] | [Value::Int(n), Value::Str(s)] => {
            let n = (*n).max(0) as usize;
            bounded("*", s.len().saturating_mul(n))?;
            Ok(Value::Str(s.repeat(n)))
        }
        [Value::List(items), Value::Int(n)] | [Value::Int(n), Value::List(items)] => {
            let n = (*n).max(0) as usize;
            bounded("*", items.len().saturating_mul(n))?;
            let mut out = Vec::with_capacity(items.len() * n);
            for _ in 0..n {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        _ => fold_numbers("*", &args, 1, i64::checked_mul, |a, b| a * b),
    }
}

fn div(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let a = Num::of("/", &args[0])?;
    let b = Num::of("/", &args[1])?;
    if b.is_zero() {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Float(a.as_f64() / b.as_f64()))
}

fn floor_div(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let a = Num::of("//", &args[0])?;
    let b = Num::of("//", &args[1])?;
    if b.is_zero() {
        return Err(RuntimeError::DivisionByZero);
    }
    match (a, b) {
        (Num::I(x), Num::I(y)) => {
            let q = x
                .checked_div(y)
                .ok_or_else(|| RuntimeError::Overflow("//".into()))?;
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        _ => Ok(Value::Float((a.as_f64() / b.as_f64()).floor())),
    }
}

fn rem(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let a = Num::of("%", &args[0])?;
    let b = Num::of("%", &args[1])?;
    if b.is_zero() {
        return Err(RuntimeError::DivisionByZero);
    }
    match (a, b) {
        (Num::I(x), Num::I(y)) => {
            let r = x
                .checked_rem(y)
                .ok_or_else(|| RuntimeError::Overflow("%".into()))?;
            Ok(Value::Int(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Ok(Value::Float(x - y * (x / y).floor()))
        }
    }
}

fn abs(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match Num::of("abs", &args[0])? {
        Num::I(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Overflow("abs".into())),
        Num::F(f) => Ok(Value::Float(f.abs())),
    }
}

fn pow(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let base = Num::of("pow", &args[0])?;
    let exp = Num::of("pow", &args[1])?;
    match (base, exp) {
        (Num::I(b), Num::I(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| RuntimeError::Overflow("pow".into()))?;
            b.checked_pow(e)
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::Overflow("pow".into()))
        }
        (Num::I(0), Num::I(_)) => Err(RuntimeError::DivisionByZero),
        _ => Ok(Value::Float(base.as_f64().powf(exp.as_f64()))),
    }
}

fn sqrt(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let x = Num::of("sqrt", &args[0])?.as_f64();
    if x < 0.0 {
        return Err(RuntimeError::InvalidValue("math domain error".into()));
    }
    Ok(Value::Float(x.sqrt()))
}

fn float_to_int(op: &str, f: f64) -> RuntimeResult<Value> {
    if !f.is_finite() || f.abs() >= 9.2e18 {
        return Err(RuntimeError::InvalidValue(format!(
            "{}: cannot convert {} to int",
            op, f
        )));
    }
    Ok(Value::Int(f as i64))
}

fn round(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let x = Num::of("round", &args[0])?;
    match args.get(1) {
        None => match x {
            Num::I(i) => Ok(Value::Int(i)),
            Num::F(f) => float_to_int("round", round_half_even(f)),
        },
        Some(digits) => {
            let digits = expect_int("round", digits)?.clamp(-300, 300) as i32;
            let scale = 10f64.powi(digits);
            Ok(Value::Float(round_half_even(x.as_f64() * scale) / scale))
        }
    }
}

fn round_half_even(f: f64) -> f64 {
    let r = f.round();
    if (f - f.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - f.signum()
    } else {
        r
    }
}

fn floor(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match Num::of("floor", &args[0])? {
        Num::I(i) => Ok(Value::Int(i)),
        Num::F(f) => float_to_int("floor", f.floor()),
    }
}

fn ceil(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match Num::of("ceil", &args[0])? {
        Num::I(i) => Ok(Value::Int(i)),
        Num::F(f) => float_to_int("ceil", f.ceil()),
    }
}

/// Accept either several arguments or a single list.
fn extremum(op: &str, args: Vec<Value>, want: Ordering) -> RuntimeResult<Value> {
    let items = match args.as_slice() {
        [Value::List(items)] => items.clone(),
        _ => args,
    };
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| RuntimeError::InvalidValue(format!("{}() arg is an empty sequence", op)))?;
    for v in iter {
        if compare(op, &v, &best)? == want {
            best = v;
        }
    }
    Ok(best)
}

fn min(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    extremum("min", args, Ordering::Less)
}

fn max(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    extremum("max", args, Ordering::Greater)
}

// ---------------------------------------------------------------------------
// comparison

fn compare(op: &str, a: &Value, b: &Value) -> RuntimeResult<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::List(xs), Value::List(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                let ord = compare(op, x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(xs.len().cmp(&ys.len()))
        }
        _ => {
            let x = Num::of(op, a)?;
            let y = Num::of(op, b)?;
            match (x, y) {
                (Num::I(x), Num::I(y)) => Ok(x.cmp(&y)),
                _ => x.as_f64().partial_cmp(&y.as_f64()).ok_or_else(|| {
                    RuntimeError::InvalidValue(format!("{}: cannot compare NaN", op))
                }),
            }
        }
    }
}

fn chain(op: &str, args: &[Value], accept: fn(Ordering) -> bool) -> RuntimeResult<Value> {
    for pair in args.windows(2) {
        if !accept(compare(op, &pair[0], &pair[1])?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn eq(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(args.windows(2).all(|p| p[0] == p[1])))
}

fn ne(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(args[0] != args[1]))
}

fn lt(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    chain("<", &args, |o| o == Ordering::Less)
}

fn gt(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    chain(">", &args, |o| o == Ordering::Greater)
}

fn le(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    chain("<=", &args, |o| o != Ordering::Greater)
}

fn ge(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    chain(">=", &args, |o| o != Ordering::Less)
}

fn not(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

// ---------------------------------------------------------------------------
// conversions and predicates

fn to_int(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) => float_to_int("int", f.trunc()),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeError::InvalidValue(format!("invalid literal for int(): {:?}", s))
        }),
        other => Err(RuntimeError::type_error("int", "number or str", other.type_name())),
    }
}

fn to_float(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match &args[0] {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::InvalidValue(format!("could not convert string to float: {:?}", s))
        }),
        other => Err(RuntimeError::type_error("float", "number or str", other.type_name())),
    }
}

fn to_str(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(args.iter().map(Value::to_text).collect()))
}

fn to_bool(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(args[0].is_truthy()))
}

fn type_of(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(args[0].type_name().to_string()))
}

fn is_nil(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Nil)))
}

fn is_bool(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn is_int(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn is_float(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Float(_))))
}

fn is_number(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_) | Value::Float(_))))
}

fn is_str(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

fn is_list(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::List(_))))
}

fn is_dict(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Dict(_))))
}

fn is_fn(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Function(_))))
}

fn is_empty(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Bool(true)),
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        Value::Dict(map) => Ok(Value::Bool(map.is_empty())),
        other => Err(RuntimeError::type_error("empty?", "collection", other.type_name())),
    }
}

// ---------------------------------------------------------------------------
// strings

fn len(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Dict(map) => map.len(),
        other => {
            return Err(RuntimeError::type_error(
                "len",
                "str, list or dict",
                other.type_name(),
            ))
        }
    };
    Ok(Value::Int(n as i64))
}

fn upper(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(expect_str("upper", &args[0])?.to_uppercase()))
}

fn lower(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(expect_str("lower", &args[0])?.to_lowercase()))
}

fn capitalize(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let s = expect_str("capitalize", &args[0])?;
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };
    Ok(Value::Str(out))
}

fn trim(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(expect_str("trim", &args[0])?.trim().to_string()))
}

fn split(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let s = expect_str("split", &args[0])?;
    let parts: Vec<Value> = match args.get(1) {
        None => s.split_whitespace().map(Value::from).collect(),
        Some(sep) => {
            let sep = expect_str("split", sep)?;
            if sep.is_empty() {
                return Err(RuntimeError::InvalidValue("split: empty separator".into()));
            }
            s.split(sep).map(Value::from).collect()
        }
    };
    Ok(Value::List(parts))
}

fn join(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let sep = expect_str("join", &args[0])?;
    let items = expect_list("join", &args[1])?;
    let parts = items
        .iter()
        .map(|v| expect_str("join", v))
        .collect::<RuntimeResult<Vec<_>>>()?;
    Ok(Value::Str(parts.join(sep)))
}

fn replace(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let s = expect_str("replace", &args[0])?;
    let from = expect_str("replace", &args[1])?;
    let to = expect_str("replace", &args[2])?;
    Ok(Value::Str(s.replace(from, to)))
}

/// `(format "{} + {}" a b)` fills `{}` placeholders left to right.
fn format(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let template = expect_str("format", &args[0])?;
    let mut values = args[1..].iter();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        let v = values.next().ok_or_else(|| {
            RuntimeError::InvalidValue("format: not enough arguments for placeholders".into())
        })?;
        out.push_str(&v.to_text());
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    Ok(Value::Str(out))
}

fn chars(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    expect_str("chars", &args[0])?;
    elements("chars", &args[0]).map(Value::List)
}

fn starts_with(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let s = expect_str("starts-with?", &args[0])?;
    Ok(Value::Bool(s.starts_with(expect_str("starts-with?", &args[1])?)))
}

fn ends_with(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let s = expect_str("ends-with?", &args[0])?;
    Ok(Value::Bool(s.ends_with(expect_str("ends-with?", &args[1])?)))
}

fn all_chars(op: &str, v: &Value, pred: fn(char) -> bool) -> RuntimeResult<Value> {
    let s = expect_str(op, v)?;
    Ok(Value::Bool(!s.is_empty() && s.chars().all(pred)))
}

fn is_digit(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    all_chars("digit?", &args[0], |c| c.is_ascii_digit())
}

fn is_alpha(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    all_chars("alpha?", &args[0], char::is_alphabetic)
}

fn is_space(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    all_chars("space?", &args[0], char::is_whitespace)
}

// ---------------------------------------------------------------------------
// sequences and collections

fn contains(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let found = match &args[0] {
        Value::Str(s) => s.contains(expect_str("contains?", &args[1])?),
        Value::List(items) => items.contains(&args[1]),
        Value::Dict(map) => map.contains_key(&dict_key(&args[1], "contains?")?),
        other => {
            return Err(RuntimeError::type_error(
                "contains?",
                "str, list or dict",
                other.type_name(),
            ))
        }
    };
    Ok(Value::Bool(found))
}

fn index_of(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let index = match &args[0] {
        Value::Str(s) => {
            let needle = expect_str("index-of", &args[1])?;
            s.find(needle).map(|byte| s[..byte].chars().count())
        }
        Value::List(items) => items.iter().position(|v| *v == args[1]),
        other => return Err(RuntimeError::type_error("index-of", "str or list", other.type_name())),
    };
    Ok(Value::Int(index.map_or(-1, |i| i as i64)))
}

fn count(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let n = match &args[0] {
        Value::Str(s) => {
            let needle = expect_str("count", &args[1])?;
            if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            }
        }
        Value::List(items) => items.iter().filter(|v| **v == args[1]).count(),
        other => return Err(RuntimeError::type_error("count", "str or list", other.type_name())),
    };
    Ok(Value::Int(n as i64))
}

fn reverse(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match &args[0] {
        Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
        Value::List(items) => Ok(Value::List(items.iter().rev().cloned().collect())),
        other => Err(RuntimeError::type_error("reverse", "str or list", other.type_name())),
    }
}

fn slice(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let start = expect_int("slice", &args[1])?;
    let end = args.get(2).map(|v| expect_int("slice", v)).transpose()?;
    match &args[0] {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (a, b) = slice_range(start, end, chars.len());
            Ok(Value::Str(chars[a..b].iter().collect()))
        }
        Value::List(items) => {
            let (a, b) = slice_range(start, end, items.len());
            Ok(Value::List(items[a..b].to_vec()))
        }
        other => Err(RuntimeError::type_error("slice", "str or list", other.type_name())),
    }
}

fn slice_range(start: i64, end: Option<i64>, len: usize) -> (usize, usize) {
    let a = clamp_bound(start, len);
    let b = end.map_or(len, |e| clamp_bound(e, len));
    (a, b.max(a))
}

fn list(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Value::List(args).within_nesting()
}

fn dict(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    if args.len() % 2 != 0 {
        return Err(RuntimeError::InvalidValue(
            "dict expects key/value pairs".into(),
        ));
    }
    let mut map = BTreeMap::new();
    for pair in args.chunks(2) {
        map.insert(dict_key(&pair[0], "dict")?, pair[1].clone());
    }
    Value::Dict(map).within_nesting()
}

fn first(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(elements("first", &args[0])?
        .into_iter()
        .next()
        .unwrap_or(Value::Nil))
}

fn last(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(elements("last", &args[0])?.pop().unwrap_or(Value::Nil))
}

fn rest(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::List(
        elements("rest", &args[0])?.into_iter().skip(1).collect(),
    ))
}

fn nth(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let index = expect_int("nth", &args[1])?;
    let items = match &args[0] {
        Value::Str(_) | Value::List(_) => elements("nth", &args[0])?,
        other => return Err(RuntimeError::type_error("nth", "str or list", other.type_name())),
    };
    resolve_index(index, items.len())
        .map(|i| items[i].clone())
        .ok_or(RuntimeError::IndexOutOfRange {
            index,
            len: items.len(),
        })
}

/// `(get coll key default?)`: missing keys and indices yield the default.
fn get(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    match &args[0] {
        Value::Dict(map) => Ok(map
            .get(&dict_key(&args[1], "get")?)
            .cloned()
            .unwrap_or(default)),
        Value::List(items) => {
            let index = expect_int("get", &args[1])?;
            Ok(resolve_index(index, items.len())
                .map(|i| items[i].clone())
                .unwrap_or(default))
        }
        Value::Nil => Ok(default),
        other => Err(RuntimeError::type_error("get", "dict or list", other.type_name())),
    }
}

fn append(_: &mut Interpreter<'_>, mut args: Vec<Value>) -> RuntimeResult<Value> {
    let item = args.pop().unwrap_or(Value::Nil);
    let mut items = expect_list("append", &args[0])?.to_vec();
    items.push(item);
    Value::List(items).within_nesting()
}

fn concat_lists(op: &str, args: &[Value]) -> RuntimeResult<Value> {
    let mut out = Vec::new();
    for v in args {
        out.extend(expect_list(op, v)?.iter().cloned());
    }
    Ok(Value::List(out))
}

fn concat(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    concat_lists("concat", &args)
}

fn range(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let ints = args
        .iter()
        .map(|v| expect_int("range", v))
        .collect::<RuntimeResult<Vec<_>>>()?;
    let (start, end, step) = match ints.as_slice() {
        [end] => (0, *end, 1),
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => return Err(arity_violation("range")),
    };
    if step == 0 {
        return Err(RuntimeError::InvalidValue("range: step must not be zero".into()));
    }
    let span = if step > 0 {
        (end as i128 - start as i128).max(0)
    } else {
        (start as i128 - end as i128).max(0)
    };
    let len = ((span + step.unsigned_abs() as i128 - 1) / step.unsigned_abs() as i128) as usize;
    bounded("range", len)?;
    Ok(Value::List(
        (0..len)
            .map(|i| Value::Int(start + (i as i64) * step))
            .collect(),
    ))
}

fn sort_values(op: &str, items: &mut [Value]) -> RuntimeResult<()> {
    let mut failure = None;
    items.sort_by(|a, b| match compare(op, a, b) {
        Ok(ord) => ord,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    failure.map_or(Ok(()), Err)
}

/// `(sort xs descending?)`
fn sort(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut items = elements("sort", &args[0])?;
    sort_values("sort", &mut items)?;
    if args.get(1).is_some_and(Value::is_truthy) {
        items.reverse();
    }
    Ok(Value::List(items))
}

fn unique(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut out: Vec<Value> = Vec::new();
    for v in elements("unique", &args[0])? {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    Ok(Value::List(out))
}

fn flatten(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut out = Vec::new();
    for v in expect_list("flatten", &args[0])? {
        match v {
            Value::List(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::List(out))
}

fn sum(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    fold_numbers(
        "sum",
        expect_list("sum", &args[0])?,
        0,
        i64::checked_add,
        |a, b| a + b,
    )
}

fn product(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    fold_numbers(
        "product",
        expect_list("product", &args[0])?,
        1,
        i64::checked_mul,
        |a, b| a * b,
    )
}

fn zip(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let xs = elements("zip", &args[0])?;
    let ys = elements("zip", &args[1])?;
    Value::List(
        xs.into_iter()
            .zip(ys)
            .map(|(x, y)| Value::List(vec![x, y]))
            .collect(),
    )
    .within_nesting()
}

fn enumerate(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Value::List(
        elements("enumerate", &args[0])?
            .into_iter()
            .enumerate()
            .map(|(i, v)| Value::List(vec![Value::Int(i as i64), v]))
            .collect(),
    )
    .within_nesting()
}

fn keys(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let map = expect_dict("keys", &args[0])?;
    Ok(Value::List(map.keys().cloned().map(Value::Str).collect()))
}

fn values(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let map = expect_dict("values", &args[0])?;
    Ok(Value::List(map.values().cloned().collect()))
}

fn items(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let map = expect_dict("items", &args[0])?;
    Value::List(
        map.iter()
            .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
            .collect(),
    )
    .within_nesting()
}

fn assoc(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut map = match &args[0] {
        Value::Nil => BTreeMap::new(),
        other => expect_dict("assoc", other)?.clone(),
    };
    map.insert(dict_key(&args[1], "assoc")?, args[2].clone());
    Value::Dict(map).within_nesting()
}

fn dissoc(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut map = expect_dict("dissoc", &args[0])?.clone();
    map.remove(&dict_key(&args[1], "dissoc")?);
    Ok(Value::Dict(map))
}

fn has_key(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let map = expect_dict("has-key?", &args[0])?;
    Ok(Value::Bool(map.contains_key(&dict_key(&args[1], "has-key?")?)))
}

// ---------------------------------------------------------------------------
// higher-order

fn map(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let f = expect_fn("map", &args[0])?;
    let out = elements("map", &args[1])?
        .into_iter()
        .map(|v| interp.call(&f, vec![v]))
        .collect::<RuntimeResult<Vec<_>>>()?;
    Value::List(out).within_nesting()
}

fn filter(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let f = expect_fn("filter", &args[0])?;
    let mut out = Vec::new();
    for v in elements("filter", &args[1])? {
        if interp.call(&f, vec![v.clone()])?.is_truthy() {
            out.push(v);
        }
    }
    Ok(Value::List(out))
}

/// `(reduce f xs)` or `(reduce f init xs)`.
fn reduce(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let f = expect_fn("reduce", &args[0])?;
    let (init, items) = match args.as_slice() {
        [_, xs] => {
            let mut items = elements("reduce", xs)?.into_iter();
            let init = items.next().ok_or_else(|| {
                RuntimeError::InvalidValue(
                    "reduce() of empty sequence with no initial value".into(),
                )
            })?;
            (init, items.collect::<Vec<_>>())
        }
        [_, init, xs] => (init.clone(), elements("reduce", xs)?),
        _ => return Err(arity_violation("reduce")),
    };
    let mut acc = init;
    for v in items {
        acc = interp.call(&f, vec![acc, v])?;
    }
    Ok(acc)
}

/// `(sort-by key-fn xs descending?)`
fn sort_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let f = expect_fn("sort-by", &args[0])?;
    let mut keyed = Vec::new();
    for v in elements("sort-by", &args[1])? {
        keyed.push((interp.call(&f, vec![v.clone()])?, v));
    }
    let mut failure = None;
    keyed.sort_by(|a, b| match compare("sort-by", &a.0, &b.0) {
        Ok(ord) => ord,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    let mut out: Vec<Value> = keyed.into_iter().map(|(_, v)| v).collect();
    if args.get(2).is_some_and(Value::is_truthy) {
        out.reverse();
    }
    Ok(Value::List(out))
}

fn apply(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let f = expect_fn("apply", &args[0])?;
    let call_args = expect_list("apply", &args[1])?.to_vec();
    interp.call(&f, call_args)
}

fn any(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match args.as_slice() {
        [xs] => Ok(Value::Bool(
            elements("any?", xs)?.iter().any(Value::is_truthy),
        )),
        [pred, xs] => {
            let f = expect_fn("any?", pred)?;
            for v in elements("any?", xs)? {
                if interp.call(&f, vec![v])?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        _ => Err(arity_violation("any?")),
    }
}

fn all(interp: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    match args.as_slice() {
        [xs] => Ok(Value::Bool(
            elements("all?", xs)?.iter().all(Value::is_truthy),
        )),
        [pred, xs] => {
            let f = expect_fn("all?", pred)?;
            for v in elements("all?", xs)? {
                if !interp.call(&f, vec![v])?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        _ => Err(arity_violation("all?")),
    }
}

fn raise(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Err(RuntimeError::Raised(args[0].to_text()))
}

// ---------------------------------------------------------------------------
// path/* and file/*

fn io_error(path: &str, err: std::io::Error) -> RuntimeError {
    RuntimeError::Io {
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn path_exists(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(Path::new(expect_str("path/exists?", &args[0])?).exists()))
}

fn path_is_file(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(Path::new(expect_str("path/is-file?", &args[0])?).is_file()))
}

fn path_is_dir(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Bool(Path::new(expect_str("path/is-dir?", &args[0])?).is_dir()))
}

fn path_join(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let mut path = PathBuf::new();
    for part in &args {
        path.push(expect_str("path/join", part)?);
    }
    Ok(Value::Str(path.to_string_lossy().into_owned()))
}

fn path_basename(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let path = Path::new(expect_str("path/basename", &args[0])?);
    Ok(Value::Str(
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    ))
}

fn path_extension(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let path = Path::new(expect_str("path/extension", &args[0])?);
    Ok(Value::Str(
        path.extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    ))
}

fn file_read(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let path = expect_str("file/read", &args[0])?;
    std::fs::read_to_string(path)
        .map(Value::Str)
        .map_err(|e| io_error(path, e))
}

fn file_lines(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let path = expect_str("file/lines", &args[0])?;
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(Value::List(text.lines().map(Value::from).collect()))
}

fn file_write(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let path = expect_str("file/write", &args[0])?;
    let content = args[1].to_text();
    std::fs::write(path, &content).map_err(|e| io_error(path, e))?;
    Ok(Value::Int(content.len() as i64))
}

// ---------------------------------------------------------------------------
// log/*, re/*, time/*, json/*

fn message(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_info(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    tracing::info!(target: "toolsmith::tool", "{}", message(&args));
    Ok(Value::Nil)
}

fn log_warn(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    tracing::warn!(target: "toolsmith::tool", "{}", message(&args));
    Ok(Value::Nil)
}

fn compile(op: &str, pattern: &Value) -> RuntimeResult<Regex> {
    let pattern = expect_str(op, pattern)?;
    Regex::new(pattern).map_err(|e| RuntimeError::Regex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn re_is_match(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let re = compile("re/match?", &args[0])?;
    Ok(Value::Bool(re.is_match(expect_str("re/match?", &args[1])?)))
}

fn re_find_all(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let re = compile("re/find-all", &args[0])?;
    let text = expect_str("re/find-all", &args[1])?;
    Ok(Value::List(
        re.find_iter(text).map(|m| Value::from(m.as_str())).collect(),
    ))
}

fn re_replace(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let re = compile("re/replace", &args[0])?;
    let text = expect_str("re/replace", &args[1])?;
    let replacement = expect_str("re/replace", &args[2])?;
    Ok(Value::Str(re.replace_all(text, replacement).into_owned()))
}

fn re_split(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let re = compile("re/split", &args[0])?;
    let text = expect_str("re/split", &args[1])?;
    Ok(Value::List(re.split(text).map(Value::from).collect()))
}

fn time_now(_: &mut Interpreter<'_>, _: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    ))
}

fn time_now_ms(_: &mut Interpreter<'_>, _: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Int(chrono::Utc::now().timestamp_millis()))
}

fn json_parse(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    let text = expect_str("json/parse", &args[0])?;
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| RuntimeError::InvalidValue(format!("invalid JSON: {}", e)))?;
    Ok(Value::from(&json))
}

fn json_dump(_: &mut Interpreter<'_>, args: Vec<Value>) -> RuntimeResult<Value> {
    Ok(Value::Str(args[0].to_json().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::eval::{ExecutionLimits, Globals};

    fn call(name: &str, args: Vec<Value>) -> RuntimeResult<Value> {
        let globals = Globals::default();
        let mut interp = Interpreter::new(&globals, ExecutionLimits::default());
        let builtin = lookup(name).expect("builtin exists");
        interp.call(&Function::Builtin(builtin), args)
    }

    fn ints(xs: &[i64]) -> Value {
        Value::List(xs.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in names() {
            assert!(seen.insert(name), "duplicate builtin {name}");
        }
    }

    #[test]
    fn division_follows_python_semantics() {
        assert_eq!(call("/", vec![Value::Int(7), Value::Int(2)]).unwrap(), Value::Float(3.5));
        assert_eq!(call("//", vec![Value::Int(-7), Value::Int(2)]).unwrap(), Value::Int(-4));
        assert_eq!(call("%", vec![Value::Int(-7), Value::Int(3)]).unwrap(), Value::Int(2));
        for op in ["/", "//", "%"] {
            assert_eq!(
                call(op, vec![Value::Int(1), Value::Int(0)]).unwrap_err(),
                RuntimeError::DivisionByZero
            );
        }
        assert_eq!(
            call("/", vec![Value::Float(1.5), Value::Float(0.0)]).unwrap_err().to_string(),
            "division by zero"
        );
    }

    #[test]
    fn integer_overflow_raises() {
        let err = call("+", vec![i64::MAX.into(), Value::Int(1)]).unwrap_err();
        assert!(matches!(err, RuntimeError::Overflow(_)));
    }

    #[test]
    fn sum_keeps_integers_integral() {
        assert_eq!(call("sum", vec![ints(&[1, 2, 3])]).unwrap(), Value::Int(6));
        assert_eq!(call("sum", vec![ints(&[])]).unwrap(), Value::Int(0));
        let mixed = Value::List(vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(call("sum", vec![mixed]).unwrap(), Value::Float(3.5));
        let err = call("sum", vec![Value::List(vec!["a".into()])]).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
    }

    #[test]
    fn strings_and_slices() {
        assert_eq!(call("reverse", vec!["abc".into()]).unwrap(), Value::from("cba"));
        assert_eq!(
            call("slice", vec!["hello".into(), Value::Int(1), Value::Int(-1)]).unwrap(),
            Value::from("ell")
        );
        assert_eq!(
            call("split", vec!["  a b\tc ".into()]).unwrap(),
            Value::from(vec!["a", "b", "c"])
        );
        assert_eq!(
            call("format", vec!["{} + {}".into(), Value::Int(1), Value::Float(2.5)]).unwrap(),
            Value::from("1 + 2.5")
        );
        assert_eq!(call("capitalize", vec!["hELLO".into()]).unwrap(), Value::from("Hello"));
    }

    #[test]
    fn range_and_sort() {
        assert_eq!(call("range", vec![Value::Int(4)]).unwrap(), ints(&[0, 1, 2, 3]));
        assert_eq!(
            call("range", vec![Value::Int(10), Value::Int(0), Value::Int(-3)]).unwrap(),
            ints(&[10, 7, 4, 1])
        );
        assert_eq!(
            call("sort", vec![ints(&[3, 1, 2]), true.into()]).unwrap(),
            ints(&[3, 2, 1])
        );
        let err = call("sort", vec![Value::List(vec![Value::Int(1), "a".into()])]).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
    }

    #[test]
    fn get_and_nth_differ_on_missing() {
        assert_eq!(call("get", vec![ints(&[1]), Value::Int(5)]).unwrap(), Value::Nil);
        assert_eq!(
            call("nth", vec![ints(&[1]), Value::Int(5)]).unwrap_err(),
            RuntimeError::IndexOutOfRange { index: 5, len: 1 }
        );
        assert_eq!(call("nth", vec![ints(&[1, 2]), Value::Int(-1)]).unwrap(), Value::Int(2));
    }

    #[test]
    fn regex_and_json_collaborators() {
        assert_eq!(
            call("re/find-all", vec![r"\d+".into(), "a1b22c333".into()]).unwrap(),
            Value::from(vec!["1", "22", "333"])
        );
        let err = call("re/match?", vec!["(".into(), "x".into()]).unwrap_err();
        assert!(matches!(err, RuntimeError::Regex { .. }));
        let parsed = call("json/parse", vec![r#"{"a": [1, 2]}"#.into()]).unwrap();
        assert_eq!(
            call("json/dump", vec![parsed]).unwrap(),
            Value::from(r#"{"a":[1,2]}"#)
        );
    }

    #[test]
    fn missing_file_reports_os_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = call("file/read", vec![Value::Str(path.to_string_lossy().into_owned())]).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("no such file"));
    }

    #[test]
    fn arity_is_enforced() {
        let err = call("upper", vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "upper() takes 1 argument(s) but 0 were given"
        );
    }
}
