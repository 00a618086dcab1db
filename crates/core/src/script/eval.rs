// crates/core/src/script/eval.rs

//! Tree-walking evaluator with a per-invocation execution budget.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ast::{Expr, LambdaDef};
use super::error::{RuntimeError, RuntimeResult};
use super::stdlib;
use super::value::{Closure, Function, Scope, Value};

/// Generic container names that only make sense as annotations.
const TYPING_GENERICS: &[&str] = &["List", "Dict", "Set", "Tuple", "Optional", "Union"];

/// How often (in steps) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Budget for a single top-level evaluation or tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_steps: u64,
    pub timeout: Duration,
    pub max_depth: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            timeout: Duration::from_secs(2),
            max_depth: 200,
        }
    }
}

/// Module-level bindings produced by evaluating a tool source.
#[derive(Debug, Default)]
pub struct Globals {
    bindings: HashMap<String, Value>,
    order: Vec<String>,
}

impl Globals {
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if self.bindings.insert(name.clone(), value).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bindings in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name).map(|v| (name.as_str(), v)))
    }
}

pub struct Interpreter<'g> {
    globals: &'g Globals,
    limits: ExecutionLimits,
    started: Instant,
    steps: u64,
    depth: usize,
}

impl<'g> Interpreter<'g> {
    pub fn new(globals: &'g Globals, limits: ExecutionLimits) -> Self {
        Self {
            globals,
            limits,
            started: Instant::now(),
            steps: 0,
            depth: 0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Evaluate a top-level expression (no local scope).
    pub fn eval_top(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        self.eval(expr, None)
    }

    /// Invoke a function value with already-evaluated arguments.
    pub fn call(&mut self, func: &Function, args: Vec<Value>) -> RuntimeResult<Value> {
        self.tick()?;
        match func {
            Function::Builtin(builtin) => {
                builtin.arity.check(builtin.name, args.len())?;
                (builtin.func)(self, args)
            }
            Function::Closure(closure) => self.call_closure(closure, args),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        let def = &closure.def;
        if def.params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                function: def.name.clone().unwrap_or_else(|| "<lambda>".to_string()),
                expected: def.params.len().to_string(),
                actual: args.len(),
            });
        }
        if self.depth >= self.limits.max_depth {
            return Err(RuntimeError::RecursionLimit {
                limit: self.limits.max_depth,
            });
        }

        let mut frame = Scope::child(closure.scope.clone());
        for (param, arg) in def.params.iter().zip(args) {
            frame.bind(param.name.clone(), arg);
        }
        let frame = Arc::new(frame);

        self.depth += 1;
        let result = self.eval_body(&def.body, Some(&frame));
        self.depth -= 1;
        result
    }

    fn tick(&mut self) -> RuntimeResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(RuntimeError::StepLimit {
                limit: self.limits.max_steps,
            });
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > self.limits.timeout {
            return Err(RuntimeError::Timeout {
                limit: self.limits.timeout,
            });
        }
        Ok(())
    }

    fn eval_body(&mut self, body: &[Expr], env: Option<&Arc<Scope>>) -> RuntimeResult<Value> {
        let mut last = Value::Nil;
        for expr in body {
            last = self.eval(expr, env)?;
        }
        Ok(last)
    }

    fn eval(&mut self, expr: &Expr, env: Option<&Arc<Scope>>) -> RuntimeResult<Value> {
        self.tick()?;
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Symbol(name) => self.lookup(name, env),
            Expr::List(items) => items
                .iter()
                .map(|e| self.eval(e, env))
                .collect::<RuntimeResult<Vec<_>>>()
                .and_then(|items| Value::List(items).within_nesting()),
            Expr::Dict(pairs) => {
                let mut map = BTreeMap::new();
                for (k, v) in pairs {
                    let key = dict_key(&self.eval(k, env)?, "dict literal")?;
                    map.insert(key, self.eval(v, env)?);
                }
                Value::Dict(map).within_nesting()
            }
            Expr::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.eval(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, env)
                } else {
                    Ok(Value::Nil)
                }
            }
            Expr::Cond(clauses) => {
                for (test, branch) in clauses {
                    if self.eval(test, env)?.is_truthy() {
                        return self.eval(branch, env);
                    }
                }
                Ok(Value::Nil)
            }
            Expr::Let { bindings, body } => {
                let mut scope = env.cloned();
                for (name, value) in bindings {
                    let value = self.eval(value, scope.as_ref())?;
                    let mut frame = Scope::child(scope.take());
                    frame.bind(name.clone(), value);
                    scope = Some(Arc::new(frame));
                }
                self.eval_body(body, scope.as_ref())
            }
            Expr::Do(body) => self.eval_body(body, env),
            Expr::And(items) => {
                let mut last = Value::Bool(true);
                for item in items {
                    last = self.eval(item, env)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Or(items) => {
                let mut last = Value::Nil;
                for item in items {
                    last = self.eval(item, env)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Fn(def) => Ok(make_closure(def, env.cloned())),
            Expr::Try {
                body,
                binding,
                handler,
            } => {
                match self.eval_body(body, env) {
                    Ok(v) => Ok(v),
                    Err(e) if e.is_limit() => Err(e),
                    Err(e) => {
                        let mut frame = Scope::child(env.cloned());
                        frame.bind(binding.clone(), Value::Str(e.to_string()));
                        self.eval_body(handler, Some(&Arc::new(frame)))
                    }
                }
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a, env))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                match callee {
                    Value::Function(func) => self.call(&func, args),
                    other => Err(RuntimeError::NotCallable(other.type_name().to_string())),
                }
            }
        }
    }

    fn lookup(&self, name: &str, env: Option<&Arc<Scope>>) -> RuntimeResult<Value> {
        if let Some(v) = env.and_then(|scope| scope.lookup(name)) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(v.clone());
        }
        if let Some(builtin) = stdlib::lookup(name) {
            return Ok(Value::Function(Function::Builtin(builtin)));
        }
        let base = name.split('[').next().unwrap_or(name);
        if TYPING_GENERICS.contains(&base) {
            return Err(RuntimeError::TypeAsValue(base.to_string()));
        }
        Err(RuntimeError::Unbound(name.to_string()))
    }
}

pub fn make_closure(def: &Arc<LambdaDef>, scope: Option<Arc<Scope>>) -> Value {
    Value::Function(Function::Closure(Arc::new(Closure {
        def: Arc::clone(def),
        scope,
    })))
}

/// Dict keys are strings; scalar keys are converted to their text form.
pub(crate) fn dict_key(key: &Value, operation: &str) -> RuntimeResult<String> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(key.to_string()),
        other => Err(RuntimeError::type_error(operation, "str key", other.type_name())),
    }
}
