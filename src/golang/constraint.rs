//! Build constraint lines (`//go:build` and legacy `// +build`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the expression, asking `has_tag` whether each tag is satisfied.
    pub fn eval<F: Fn(&str) -> bool>(&self, has_tag: &F) -> bool {
        match self {
            Expr::Tag(tag) => has_tag(tag),
            Expr::Not(inner) => !inner.eval(has_tag),
            Expr::And(lhs, rhs) => lhs.eval(has_tag) && rhs.eval(has_tag),
            Expr::Or(lhs, rhs) => lhs.eval(has_tag) || rhs.eval(has_tag),
        }
    }

    fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    fn or(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("unexpected end of build constraint")]
    UnexpectedEnd,
    #[error("unexpected {0:?} in build constraint")]
    Unexpected(String),
    #[error("invalid build tag {0:?}")]
    InvalidTag(String),
}

/// Build constraint lines found in a file header.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderConstraints {
    pub go_build: Option<String>,
    pub plus_build: Vec<String>,
}

impl HeaderConstraints {
    /// Collect constraint lines from the leading comment block of `src`.
    ///
    /// Only comments followed by a blank line before the first
    /// non-comment line are considered, so package documentation is never
    /// mistaken for a constraint. `/* */` comments count as part of the
    /// header, but constraint lines inside them are ignored.
    pub fn scan(src: &str) -> Self {
        let lines: Vec<&str> = src.trim_start_matches('\u{feff}').lines().collect();
        let mut eligible = 0;
        let mut in_block = false;
        let mut line_comments = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let mut rest = line.trim();
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        in_block = false;
                        rest = rest[end + 2..].trim();
                    }
                    None => continue,
                }
            } else if rest.is_empty() {
                eligible = i;
                continue;
            }

            while let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(end) => rest = body[end + 2..].trim(),
                    None => {
                        in_block = true;
                        rest = "";
                    }
                }
            }

            if rest.is_empty() {
                continue;
            }
            if rest.starts_with("//") {
                line_comments.push((i, rest));
                continue;
            }
            break;
        }

        let mut found = HeaderConstraints::default();
        for (_, comment) in line_comments.into_iter().filter(|&(i, _)| i < eligible) {
            if let Some(rest) = comment.strip_prefix("//go:build") {
                if (rest.is_empty() || rest.starts_with([' ', '\t'])) && found.go_build.is_none() {
                    found.go_build = Some(rest.trim().to_string());
                }
                continue;
            }
            if let Some(rest) = comment[2..].trim_start().strip_prefix("+build") {
                if rest.is_empty() || rest.starts_with([' ', '\t']) {
                    found.plus_build.push(rest.trim().to_string());
                }
            }
        }
        found
    }

    /// Whether the file should be built. `//go:build` takes precedence over
    /// `// +build` lines.
    pub fn satisfied<F: Fn(&str) -> bool>(&self, has_tag: &F) -> Result<bool, ConstraintError> {
        if let Some(expr) = &self.go_build {
            return Ok(parse_go_build(expr)?.eval(has_tag));
        }
        for line in &self.plus_build {
            if !parse_plus_build(line)?.eval(has_tag) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Parse the expression of a `//go:build` line.
pub fn parse_go_build(text: &str) -> Result<Expr, ConstraintError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(ConstraintError::Unexpected(tok.to_string())),
    }
}

/// Parse the options of a `// +build` line: space-separated alternatives,
/// each a comma-separated conjunction of possibly negated tags.
pub fn parse_plus_build(text: &str) -> Result<Expr, ConstraintError> {
    let mut result: Option<Expr> = None;
    for option in text.split_whitespace() {
        let mut conjunction: Option<Expr> = None;
        for term in option.split(',') {
            let (negated, tag) = match term.strip_prefix('!') {
                Some(tag) => (true, tag),
                None => (false, term),
            };
            if !is_valid_tag(tag) {
                return Err(ConstraintError::InvalidTag(term.to_string()));
            }
            let mut expr = Expr::Tag(tag.to_string());
            if negated {
                expr = Expr::Not(Box::new(expr));
            }
            conjunction = Some(match conjunction {
                Some(prev) => Expr::and(prev, expr),
                None => expr,
            });
        }
        if let Some(conjunction) = conjunction {
            result = Some(match result {
                Some(prev) => Expr::or(prev, conjunction),
                None => conjunction,
            });
        }
    }
    result.ok_or(ConstraintError::UnexpectedEnd)
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn tokenize(text: &str) -> Result<Vec<String>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(ConstraintError::Unexpected(c.to_string()));
                }
                tokens.push(format!("{c}{c}"));
            }
            _ if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_' || c == '.') {
                        break;
                    }
                    tag.push(c);
                    chars.next();
                }
                tokens.push(tag);
            }
            _ => return Err(ConstraintError::Unexpected(c.to_string())),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn or(&mut self) -> Result<Expr, ConstraintError> {
        let mut expr = self.and()?;
        while self.peek() == Some("||") {
            self.pos += 1;
            expr = Expr::or(expr, self.and()?);
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ConstraintError> {
        let mut expr = self.not()?;
        while self.peek() == Some("&&") {
            self.pos += 1;
            expr = Expr::and(expr, self.not()?);
        }
        Ok(expr)
    }

    fn not(&mut self) -> Result<Expr, ConstraintError> {
        if self.peek() == Some("!") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, ConstraintError> {
        match self.next() {
            None => Err(ConstraintError::UnexpectedEnd),
            Some(tok) if tok == "(" => {
                let expr = self.or()?;
                match self.next() {
                    Some(close) if close == ")" => Ok(expr),
                    Some(other) => Err(ConstraintError::Unexpected(other)),
                    None => Err(ConstraintError::UnexpectedEnd),
                }
            }
            Some(tok) if is_valid_tag(&tok) => Ok(Expr::Tag(tok)),
            Some(tok) => Err(ConstraintError::Unexpected(tok)),
        }
    }
}
