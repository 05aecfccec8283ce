//! Minimal reader for pkgsrc package Makefiles.
//!
//! Only what is needed to recover `GO_SRCPATH` is understood: variable
//! assignments, `${VAR}` / `$(VAR)` expansion and `.include` directives.
//! Conditionals are not evaluated; assignments in every branch apply.

use std::collections::HashMap;

const MAX_EXPANSION_DEPTH: usize = 16;

/// A directive recognized in a Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Assign {
        name: String,
        op: AssignOp,
        value: String,
    },
    Include(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `?=`
    Default,
    /// `+=`
    Append,
    /// `:=`
    Immediate,
    /// `!=` (the command is recorded, never run)
    Shell,
}

/// Parse Makefile text into the directives relevant for variable evaluation.
pub fn parse_makefile(text: &str) -> Vec<Directive> {
    logical_lines(text)
        .iter()
        .filter_map(|line| parse_line(line))
        .collect()
}

/// Join backslash-continued lines and drop comments and recipe lines.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continued = false;

    for raw in text.lines() {
        // Recipe lines belong to targets, not to variable definitions.
        if !continued && raw.starts_with('\t') {
            continue;
        }
        let line = strip_comment(raw);
        if let Some(head) = line.strip_suffix('\\') {
            current.push_str(head);
            current.push(' ');
            continued = true;
            continue;
        }
        current.push_str(&line);
        continued = false;
        lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('#') => out.push('#'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '#' => break,
            _ => out.push(c),
        }
    }
    out.trim_end().to_string()
}

fn parse_line(line: &str) -> Option<Directive> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('.') {
        let rest = rest.trim_start();
        let target = rest.strip_prefix("include")?.trim();
        let path = target
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .or_else(|| target.strip_prefix('<').and_then(|t| t.strip_suffix('>')))?;
        return Some(Directive::Include(path.to_string()));
    }

    let eq = trimmed.find('=')?;
    let (name, op) = match trimmed[..eq].chars().last() {
        Some('?') => (&trimmed[..eq - 1], AssignOp::Default),
        Some('+') => (&trimmed[..eq - 1], AssignOp::Append),
        Some(':') => (&trimmed[..eq - 1], AssignOp::Immediate),
        Some('!') => (&trimmed[..eq - 1], AssignOp::Shell),
        _ => (&trimmed[..eq], AssignOp::Set),
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_variable_char) {
        return None;
    }

    Some(Directive::Assign {
        name: name.to_string(),
        op,
        value: trimmed[eq + 1..].trim().to_string(),
    })
}

fn is_variable_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Variable table accumulated while reading one package's Makefiles.
#[derive(Debug, Default, Clone)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, name: &str, op: AssignOp, value: &str) {
        match op {
            AssignOp::Set | AssignOp::Shell => {
                self.values.insert(name.to_string(), value.to_string());
            }
            AssignOp::Default => {
                self.values
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
            AssignOp::Append => {
                let entry = self.values.entry(name.to_string()).or_default();
                if !entry.is_empty() && !value.is_empty() {
                    entry.push(' ');
                }
                entry.push_str(value);
            }
            AssignOp::Immediate => {
                let expanded = self.expand(value);
                self.values.insert(name.to_string(), expanded);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name` with all known references expanded.
    pub fn expanded(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| self.expand(value))
    }

    /// Expand `${VAR}` and `$(VAR)` references in `text`.
    ///
    /// References to undefined variables and references with modifiers
    /// (`${VAR:S/a/b/}`) are left verbatim.
    pub fn expand(&self, text: &str) -> String {
        self.expand_depth(text, 0)
    }

    fn expand_depth(&self, text: &str, depth: usize) -> String {
        if depth >= MAX_EXPANSION_DEPTH {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let (open, close) = match after.chars().next() {
                Some('{') => ('{', '}'),
                Some('(') => ('(', ')'),
                Some('$') => {
                    out.push('$');
                    rest = &after[1..];
                    continue;
                }
                _ => {
                    out.push('$');
                    rest = after;
                    continue;
                }
            };

            let Some(end) = matching_close(after, close) else {
                out.push_str(&rest[pos..]);
                return out;
            };
            let reference = &after[1..end];
            let name = self.expand_depth(reference, depth + 1);
            match self.values.get(&name) {
                Some(value) if !name.contains(':') => {
                    out.push_str(&self.expand_depth(value, depth + 1));
                }
                _ => {
                    out.push('$');
                    out.push(open);
                    out.push_str(&name);
                    out.push(close);
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Byte offset of the bracket closing the one at the start of `s`.
fn matching_close(s: &str, close: char) -> Option<usize> {
    let open = s.chars().next()?;
    let mut level = 0usize;
    for (i, c) in s.char_indices() {
        if c == open {
            level += 1;
        } else if c == close {
            level -= 1;
            if level == 0 {
                return Some(i);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(text: &str) -> Variables {
        let mut vars = Variables::new();
        for directive in parse_makefile(text) {
            if let Directive::Assign { name, op, value } = directive {
                vars.assign(&name, op, &value);
            }
        }
        vars
    }

    #[test]
    fn test_parse_assignments_and_includes() {
        let text = "\
# $NetBSD: Makefile,v 1.1 2020/01/01 00:00:00 bsiegert Exp $

DISTNAME=\tnet-0.0.20200301
PKGNAME=\tgo-${DISTNAME}
CATEGORIES=\twww
GO_SRCPATH=\tgolang.org/x/net
GO_DIST_BASE=\t${DISTNAME}

do-install:
\t${INSTALL_DATA} foo=bar ${DESTDIR}

.include \"../../lang/go/go-package.mk\"
.include \"../../mk/bsd.pkg.mk\"
";
        let directives = parse_makefile(text);

        assert!(directives.contains(&Directive::Assign {
            name: "GO_SRCPATH".into(),
            op: AssignOp::Set,
            value: "golang.org/x/net".into(),
        }));
        assert!(directives.contains(&Directive::Include("../../mk/bsd.pkg.mk".into())));
        assert!(!directives.iter().any(|d| matches!(
            d,
            Directive::Assign { name, .. } if name == "foo"
        )));
    }

    #[test]
    fn test_operators() {
        let vars = evaluate(
            "A=\tone\nA?=\tignored\nB?=\tdefault\nA+=\ttwo\nC:=\t${A}\nA=\treset\nD!=\techo hi\n",
        );

        assert_eq!(vars.get("A"), Some("reset"));
        assert_eq!(vars.get("B"), Some("default"));
        assert_eq!(vars.get("C"), Some("one two"));
        assert_eq!(vars.get("D"), Some("echo hi"));
    }

    #[test]
    fn test_continuation_lines_and_comments() {
        let vars = evaluate("GO_SRCPATH=\tgithub.com/a/one \\\n\t\tgithub.com/a/two # both\nX=\\#y\n");

        assert_eq!(
            vars.get("GO_SRCPATH").map(|v| v.split_whitespace().collect::<Vec<_>>()),
            Some(vec!["github.com/a/one", "github.com/a/two"])
        );
        assert_eq!(vars.get("X"), Some("#y"));
    }

    #[test]
    fn test_expand_references() {
        let vars = evaluate(
            "GH_ACCOUNT=\tbsiegert\nGH_PROJECT=\tranges\nBASE=\tgithub.com/${GH_ACCOUNT}\nGO_SRCPATH=\t$(BASE)/${GH_PROJECT}\n",
        );

        assert_eq!(
            vars.expanded("GO_SRCPATH").as_deref(),
            Some("github.com/bsiegert/ranges")
        );
    }

    #[test]
    fn test_expand_leaves_unknown_and_modifiers_verbatim() {
        let vars = evaluate("NAME=\tfoo\nA=\t${UNDEFINED}/x\nB=\t${NAME:S/f/g/}\nC=\t$$HOME\n");

        assert_eq!(vars.expanded("A").as_deref(), Some("${UNDEFINED}/x"));
        assert_eq!(vars.expanded("B").as_deref(), Some("${NAME:S/f/g/}"));
        assert_eq!(vars.expanded("C").as_deref(), Some("$HOME"));
    }

    #[test]
    fn test_expand_self_reference_terminates() {
        let vars = evaluate("LOOP=\t${LOOP}x\n");
        let expanded = vars.expanded("LOOP").unwrap();
        assert!(expanded.contains("${LOOP}"));
    }
}
