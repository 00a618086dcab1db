// crates/core/src/script/ast.rs

//! Analyzed toolscript program: special forms are recognised here so the
//! evaluator only ever sees well-formed expressions.

use std::sync::Arc;

use super::error::ParseError;
use super::reader::{read_all, Form};
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// Annotation atom exactly as written, e.g. `list[int]`.
    pub annotation: Option<String>,
}

#[derive(Debug)]
pub struct LambdaDef {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub returns: Option<String>,
    pub doc: Option<String>,
    pub body: Vec<Expr>,
}

#[derive(Debug)]
pub enum Expr {
    Literal(Value),
    Symbol(String),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    If {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Cond(Vec<(Expr, Expr)>),
    Let {
        bindings: Vec<(String, Expr)>,
        body: Vec<Expr>,
    },
    Do(Vec<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Fn(Arc<LambdaDef>),
    Try {
        body: Vec<Expr>,
        binding: String,
        handler: Vec<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug)]
pub enum TopLevel {
    Defn {
        name: String,
        lambda: Arc<LambdaDef>,
        line: usize,
    },
    Def {
        name: String,
        value: Expr,
        line: usize,
    },
    Expr { expr: Expr, line: usize },
}

impl TopLevel {
    pub fn line(&self) -> usize {
        match self {
            TopLevel::Defn { line, .. } | TopLevel::Def { line, .. } | TopLevel::Expr { line, .. } => {
                *line
            }
        }
    }
}

/// Read and analyze a whole program.
pub fn parse_program(source: &str) -> Result<Vec<TopLevel>, ParseError> {
    read_all(source)?
        .into_iter()
        .map(|(line, form)| analyze_top(form).map_err(|e| e.or_line(line)).map(|t| t.at(line)))
        .collect()
}

/// Intermediate result so the line can be stamped once.
enum Top {
    Defn(String, Arc<LambdaDef>),
    Def(String, Expr),
    Expr(Expr),
}

impl Top {
    fn at(self, line: usize) -> TopLevel {
        match self {
            Top::Defn(name, lambda) => TopLevel::Defn { name, lambda, line },
            Top::Def(name, value) => TopLevel::Def { name, value, line },
            Top::Expr(expr) => TopLevel::Expr { expr, line },
        }
    }
}

fn analyze_top(form: Form) -> Result<Top, ParseError> {
    if let Form::List(items) = &form {
        match items.first().and_then(Form::as_symbol) {
            Some("defn") => {
                let mut rest = items[1..].to_vec().into_iter();
                let name = match rest.next() {
                    Some(Form::Symbol(name)) => name,
                    Some(other) => {
                        return Err(ParseError::new(format!(
                            "defn expects a name, found {}",
                            other.describe()
                        )))
                    }
                    None => return Err(ParseError::new("defn expects a name")),
                };
                let lambda = analyze_lambda(Some(name.clone()), rest.collect())?;
                return Ok(Top::Defn(name, Arc::new(lambda)));
            }
            Some("def") => {
                if items.len() != 3 {
                    return Err(ParseError::new("def expects a name and a value"));
                }
                let name = items[1]
                    .as_symbol()
                    .ok_or_else(|| ParseError::new("def expects a symbol name"))?
                    .to_string();
                let value = analyze(items[2].clone())?;
                return Ok(Top::Def(name, value));
            }
            _ => {}
        }
    }
    Ok(Top::Expr(analyze(form)?))
}

/// `[params] (-> type)? "doc"? body...`
fn analyze_lambda(name: Option<String>, forms: Vec<Form>) -> Result<LambdaDef, ParseError> {
    let mut rest = forms.into_iter().peekable();
    let params = match rest.next() {
        Some(Form::Vector(items)) => analyze_params(items)?,
        Some(other) => {
            return Err(ParseError::new(format!(
                "expected a parameter vector, found {}",
                other.describe()
            )))
        }
        None => return Err(ParseError::new("expected a parameter vector")),
    };

    let mut returns = None;
    if rest.peek().and_then(Form::as_symbol) == Some("->") {
        rest.next();
        returns = Some(
            rest.next()
                .and_then(|f| annotation_text(&f))
                .ok_or_else(|| ParseError::new("'->' must be followed by a return type"))?,
        );
    }

    let mut body: Vec<Form> = rest.collect();
    let doc = match body.first() {
        Some(Form::Str(text)) if body.len() > 1 => {
            let text = text.clone();
            body.remove(0);
            Some(text)
        }
        _ => None,
    };
    if body.is_empty() {
        return Err(ParseError::new("function body is empty"));
    }

    Ok(LambdaDef {
        name,
        params,
        returns,
        doc,
        body: analyze_body(body)?,
    })
}

fn analyze_params(items: Vec<Form>) -> Result<Vec<Param>, ParseError> {
    let mut params: Vec<Param> = Vec::new();
    let mut iter = items.into_iter();
    while let Some(form) = iter.next() {
        match form {
            Form::Symbol(name) => {
                if params.iter().any(|p| p.name == name) {
                    return Err(ParseError::new(format!("duplicate parameter '{}'", name)));
                }
                params.push(Param {
                    name,
                    annotation: None,
                });
            }
            Form::Colon => {
                let param = params
                    .last_mut()
                    .filter(|p| p.annotation.is_none())
                    .ok_or_else(|| ParseError::new("':' must follow a parameter name"))?;
                let annotation = iter
                    .next()
                    .and_then(|f| annotation_text(&f))
                    .ok_or_else(|| ParseError::new("':' must be followed by a type"))?;
                param.annotation = Some(annotation);
            }
            other => {
                return Err(ParseError::new(format!(
                    "invalid parameter: {}",
                    other.describe()
                )))
            }
        }
    }
    Ok(params)
}

fn annotation_text(form: &Form) -> Option<String> {
    match form {
        Form::Symbol(s) => Some(s.clone()),
        Form::Nil => Some("none".to_string()),
        _ => None,
    }
}

fn analyze_body(forms: Vec<Form>) -> Result<Vec<Expr>, ParseError> {
    forms.into_iter().map(analyze).collect()
}

fn analyze(form: Form) -> Result<Expr, ParseError> {
    Ok(match form {
        Form::Nil => Expr::Literal(Value::Nil),
        Form::Bool(b) => Expr::Literal(Value::Bool(b)),
        Form::Int(i) => Expr::Literal(Value::Int(i)),
        Form::Float(f) => Expr::Literal(Value::Float(f)),
        Form::Str(s) => Expr::Literal(Value::Str(s)),
        Form::Symbol(s) => Expr::Symbol(s),
        Form::Colon => return Err(ParseError::new("unexpected ':'")),
        Form::Vector(items) => Expr::List(analyze_body(items)?),
        Form::Map(items) => {
            if items.len() % 2 != 0 {
                return Err(ParseError::new("dict literal needs an even number of forms"));
            }
            let mut pairs = Vec::with_capacity(items.len() / 2);
            let mut iter = items.into_iter();
            while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                pairs.push((analyze(k)?, analyze(v)?));
            }
            Expr::Dict(pairs)
        }
        Form::List(items) => analyze_list(items)?,
    })
}

fn analyze_list(items: Vec<Form>) -> Result<Expr, ParseError> {
    let Some(head) = items.first() else {
        return Ok(Expr::Literal(Value::List(Vec::new())));
    };
    let args = &items[1..];
    match head.as_symbol() {
        Some("if") => {
            if !(2..=3).contains(&args.len()) {
                return Err(ParseError::new("if expects a test, a then branch and an optional else branch"));
            }
            Ok(Expr::If {
                test: Box::new(analyze(args[0].clone())?),
                then: Box::new(analyze(args[1].clone())?),
                otherwise: match args.get(2) {
                    Some(f) => Some(Box::new(analyze(f.clone())?)),
                    None => None,
                },
            })
        }
        Some("cond") => analyze_cond(args.to_vec()),
        Some("let") => {
            let Some(Form::Vector(binds)) = args.first() else {
                return Err(ParseError::new("let expects a binding vector"));
            };
            if binds.len() % 2 != 0 {
                return Err(ParseError::new("let bindings must be name/value pairs"));
            }
            let mut bindings = Vec::with_capacity(binds.len() / 2);
            for pair in binds.chunks(2) {
                let name = pair[0]
                    .as_symbol()
                    .ok_or_else(|| ParseError::new("let binding names must be symbols"))?;
                bindings.push((name.to_string(), analyze(pair[1].clone())?));
            }
            Ok(Expr::Let {
                bindings,
                body: analyze_body(args[1..].to_vec())?,
            })
        }
        Some("do") => Ok(Expr::Do(analyze_body(args.to_vec())?)),
        Some("and") => Ok(Expr::And(analyze_body(args.to_vec())?)),
        Some("or") => Ok(Expr::Or(analyze_body(args.to_vec())?)),
        Some("fn") => {
            let mut forms = args.to_vec();
            let name = match forms.first() {
                Some(Form::Symbol(n)) => {
                    let n = n.clone();
                    forms.remove(0);
                    Some(n)
                }
                _ => None,
            };
            Ok(Expr::Fn(Arc::new(analyze_lambda(name, forms)?)))
        }
        Some("try") => analyze_try(args.to_vec()),
        Some("defn") | Some("def") => Err(ParseError::new(format!(
            "{} is only allowed at the top level",
            head.as_symbol().unwrap_or_default()
        ))),
        Some("catch") => Err(ParseError::new("catch outside of try")),
        _ => Ok(Expr::Call {
            callee: Box::new(analyze(head.clone())?),
            args: analyze_body(args.to_vec())?,
        }),
    }
}

fn analyze_cond(args: Vec<Form>) -> Result<Expr, ParseError> {
    let mut tests = Vec::new();
    let mut iter = args.into_iter().peekable();
    while let Some(form) = iter.next() {
        let test = if form == Form::Colon {
            match iter.next() {
                Some(Form::Symbol(word)) if word == "else" => Form::Bool(true),
                _ => return Err(ParseError::new("unexpected ':' in cond")),
            }
        } else {
            form
        };
        let branch = iter
            .next()
            .ok_or_else(|| ParseError::new("cond clause is missing a branch"))?;
        tests.push(test);
        tests.push(branch);
    }
    let mut clauses = Vec::with_capacity(tests.len() / 2);
    let mut iter = tests.into_iter();
    while let (Some(t), Some(b)) = (iter.next(), iter.next()) {
        clauses.push((analyze(t)?, analyze(b)?));
    }
    Ok(Expr::Cond(clauses))
}

/// `(try body... (catch e handler...))`
fn analyze_try(mut args: Vec<Form>) -> Result<Expr, ParseError> {
    let catch = match args.pop() {
        Some(Form::List(items)) if items.first().and_then(Form::as_symbol) == Some("catch") => {
            items
        }
        _ => return Err(ParseError::new("try must end with a (catch name ...) clause")),
    };
    let binding = catch
        .get(1)
        .and_then(Form::as_symbol)
        .ok_or_else(|| ParseError::new("catch expects a binding name"))?
        .to_string();
    if args.is_empty() {
        return Err(ParseError::new("try body is empty"));
    }
    Ok(Expr::Try {
        body: analyze_body(args)?,
        binding,
        handler: analyze_body(catch[2..].to_vec())?,
    })
}
