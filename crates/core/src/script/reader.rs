// crates/core/src/script/reader.rs

//! Turns toolscript text into unanalyzed forms.
//!
//! The reader knows nothing about special forms; it only produces nested
//! lists, vectors and maps of atoms. An atom that is immediately followed by
//! `[` swallows the balanced bracket group, so annotations such as
//! `list[int]` or `dict[str, int]` read as a single symbol.

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    /// A standalone `:`, used between a parameter and its annotation.
    Colon,
    /// `( ... )`
    List(Vec<Form>),
    /// `[ ... ]`
    Vector(Vec<Form>),
    /// `{ ... }`
    Map(Vec<Form>),
}

impl Form {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Form::Nil => "nil",
            Form::Bool(_) => "boolean",
            Form::Int(_) => "integer",
            Form::Float(_) => "float",
            Form::Str(_) => "string",
            Form::Symbol(_) => "symbol",
            Form::Colon => "':'",
            Form::List(_) => "list form",
            Form::Vector(_) => "vector",
            Form::Map(_) => "map",
        }
    }
}

/// Read every top-level form, paired with the line it starts on.
pub fn read_all(source: &str) -> Result<Vec<(usize, Form)>, ParseError> {
    let mut reader = Reader::new(source);
    let mut forms = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.peek().is_none() {
            break;
        }
        let line = reader.line;
        forms.push((line, reader.read_form()?));
    }
    Ok(forms)
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Reader {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.line, message)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn read_form(&mut self) -> Result<Form, ParseError> {
        let line = self.line;
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('(') => {
                self.bump();
                Ok(Form::List(self.read_seq(')', line)?))
            }
            Some('[') => {
                self.bump();
                Ok(Form::Vector(self.read_seq(']', line)?))
            }
            Some('{') => {
                self.bump();
                Ok(Form::Map(self.read_seq('}', line)?))
            }
            Some(c @ (')' | ']' | '}')) => Err(self.error(format!("unexpected '{}'", c))),
            Some('"') => self.read_string(),
            Some(':') => {
                self.bump();
                Ok(Form::Colon)
            }
            Some(_) => self.read_atom(),
        }
    }

    fn read_seq(&mut self, close: char, open_line: usize) -> Result<Vec<Form>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    return Err(ParseError::at(
                        open_line,
                        format!("unclosed delimiter, expected '{}'", close),
                    ))
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Form, ParseError> {
        let line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::at(line, "unterminated string literal")),
                Some('"') => return Ok(Form::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(ParseError::at(line, "unterminated string literal")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn read_atom(&mut self) -> Result<Form, ParseError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '[' && !text.is_empty() {
                self.read_subscript(&mut text)?;
                continue;
            }
            if is_delimiter(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Ok(atom(text))
    }

    /// Append a balanced `[...]` group (brackets included) to `text`.
    fn read_subscript(&mut self, text: &mut String) -> Result<(), ParseError> {
        let line = self.line;
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            if !c.is_whitespace() {
                text.push(c);
            } else if c == ' ' {
                // keep `dict[str, int]` readable but collapse other whitespace
                if !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
        Err(ParseError::at(line, "unclosed '[' in type annotation"))
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';' | ',' | ':'
        )
}

fn atom(text: String) -> Form {
    match text.as_str() {
        "nil" => return Form::Nil,
        "true" => return Form::Bool(true),
        "false" => return Form::Bool(false),
        _ => {}
    }
    if looks_numeric(&text) {
        if let Ok(i) = text.parse::<i64>() {
            return Form::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Form::Float(f);
        }
    }
    Form::Symbol(text)
}

/// `parse::<f64>` accepts words like `inf` and `nan`; only treat text that
/// starts like a number as numeric.
fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    digits.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(src: &str) -> Form {
        let mut forms = read_all(src).unwrap();
        assert_eq!(forms.len(), 1);
        forms.remove(0).1
    }

    #[test]
    fn reads_nested_forms_and_literals() {
        let form = read_one(r#"(f 1 -2 3.5 "a\"b" nil true [x] {"k" 1})"#);
        let Form::List(items) = form else {
            panic!("expected list form");
        };
        assert_eq!(items[0], Form::Symbol("f".into()));
        assert_eq!(items[1], Form::Int(1));
        assert_eq!(items[2], Form::Int(-2));
        assert_eq!(items[3], Form::Float(3.5));
        assert_eq!(items[4], Form::Str("a\"b".into()));
        assert_eq!(items[5], Form::Nil);
        assert_eq!(items[6], Form::Bool(true));
        assert_eq!(items[7], Form::Vector(vec![Form::Symbol("x".into())]));
        assert_eq!(
            items[8],
            Form::Map(vec![Form::Str("k".into()), Form::Int(1)])
        );
    }

    #[test]
    fn subscripted_annotations_are_single_atoms() {
        let form = read_one("[xs: list[int], m: dict[str, list[float]]]");
        assert_eq!(
            form,
            Form::Vector(vec![
                Form::Symbol("xs".into()),
                Form::Colon,
                Form::Symbol("list[int]".into()),
                Form::Symbol("m".into()),
                Form::Colon,
                Form::Symbol("dict[str, list[float]]".into()),
            ])
        );
    }

    #[test]
    fn operators_are_symbols_not_numbers() {
        let form = read_one("(- -> + inf)");
        assert_eq!(
            form,
            Form::List(vec![
                Form::Symbol("-".into()),
                Form::Symbol("->".into()),
                Form::Symbol("+".into()),
                Form::Symbol("inf".into()),
            ])
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_tracked() {
        let forms = read_all("; header\n(a)\n\n(b) ; trailing\n").unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].0, 2);
        assert_eq!(forms[1].0, 4);
    }

    #[test]
    fn unbalanced_input_reports_the_opening_line() {
        let err = read_all("\n(defn f [x]\n  (+ x 1)").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("unclosed"));

        let err = read_all("(a))").unwrap_err();
        assert!(err.message.contains("unexpected ')'"));
    }
}
