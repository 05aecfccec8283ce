//! Lexer for the header of a Go source file: the package clause and the
//! import declarations that follow it.

use std::iter::Peekable;
use std::str::CharIndices;

/// Package clause and imports of one Go source file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub package: String,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Punct(char),
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let src = src.trim_start_matches('\u{feff}');
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn skip_space_and_comments(&mut self) -> Result<(), String> {
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            if c != '/' {
                break;
            }
            match self.src[i + 1..].chars().next() {
                Some('/') => {
                    while let Some((_, c)) = self.chars.next() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    let Some(end) = self.src[i + 2..].find("*/") else {
                        return Err("comment not terminated".to_string());
                    };
                    let resume = i + 2 + end + 2;
                    while self.chars.peek().is_some_and(|&(j, _)| j < resume) {
                        self.chars.next();
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        self.skip_space_and_comments()?;
        let Some((_, c)) = self.chars.next() else {
            return Ok(None);
        };

        match c {
            '"' => self.interpreted_string().map(|s| Some(Token::Str(s))),
            '`' => {
                let mut value = String::new();
                for (_, c) in self.chars.by_ref() {
                    if c == '`' {
                        return Ok(Some(Token::Str(value.replace('\r', ""))));
                    }
                    value.push(c);
                }
                Err("raw string literal not terminated".to_string())
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut ident = c.to_string();
                while let Some(&(_, c)) = self.chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    self.chars.next();
                }
                Ok(Some(Token::Ident(ident)))
            }
            _ => Ok(Some(Token::Punct(c))),
        }
    }

    fn interpreted_string(&mut self) -> Result<String, String> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(value),
                '\n' => break,
                '\\' => {
                    let Some((_, esc)) = self.chars.next() else {
                        break;
                    };
                    match esc {
                        '\\' | '"' | '\'' => value.push(esc),
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'a' => value.push('\u{7}'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        'x' => value.push(self.hex_escape(2)?),
                        'u' => value.push(self.hex_escape(4)?),
                        'U' => value.push(self.hex_escape(8)?),
                        other => return Err(format!("unknown escape sequence \\{}", other)),
                    }
                }
                _ => value.push(c),
            }
        }
        Err("string literal not terminated".to_string())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, String> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| "invalid hex escape".to_string())?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| "escape is not a valid character".to_string())
    }
}

/// Read the package clause and every import declaration of `src`.
///
/// Scanning stops at the first declaration that is not an import.
pub fn scan_header(src: &str) -> Result<FileHeader, String> {
    let mut lexer = Lexer::new(src);

    match lexer.next_token()? {
        Some(Token::Ident(kw)) if kw == "package" => {}
        _ => return Err("expected 'package'".to_string()),
    }
    let package = match lexer.next_token()? {
        Some(Token::Ident(name)) if name != "_" => name,
        _ => return Err("expected package name".to_string()),
    };

    let mut imports = Vec::new();
    let mut token = lexer.next_token()?;
    loop {
        match token {
            Some(Token::Punct(';')) => {}
            Some(Token::Ident(kw)) if kw == "import" => match lexer.next_token()? {
                Some(Token::Punct('(')) => loop {
                    match lexer.next_token()? {
                        Some(Token::Punct(')')) => break,
                        Some(Token::Punct(';')) => {}
                        Some(tok) => imports.push(import_spec(&mut lexer, tok)?),
                        None => return Err("import group not terminated".to_string()),
                    }
                },
                Some(tok) => imports.push(import_spec(&mut lexer, tok)?),
                None => return Err("expected import spec".to_string()),
            },
            _ => break,
        }
        token = lexer.next_token()?;
    }

    Ok(FileHeader { package, imports })
}

/// Finish an import spec whose first token is `first`: `"path"`,
/// `name "path"`, `_ "path"` or `. "path"`.
fn import_spec(lexer: &mut Lexer<'_>, first: Token) -> Result<String, String> {
    let path = match first {
        Token::Str(path) => path,
        Token::Ident(_) | Token::Punct('.') => match lexer.next_token()? {
            Some(Token::Str(path)) => path,
            _ => return Err("expected import path".to_string()),
        },
        Token::Punct(c) => return Err(format!("unexpected {:?} in import declaration", c)),
    };
    if path.is_empty() {
        return Err("empty import path".to_string());
    }
    Ok(path)
}
