use crate::template::functions::{Functions, Value};
use crate::template::{Arg, Node, TemplateError};

enum Token {
    Field(String),
    Ident(String),
    Literal(Value),
}

struct Parser<'a> {
    name: &'a str,
    src: &'a str,
    nodes: Vec<Node>,
}

pub(crate) fn parse(name: &str, src: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        name,
        src,
        nodes: Vec::new(),
    };
    parser.run()?;
    Ok(parser.nodes)
}

impl<'a> Parser<'a> {
    fn error(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            template: self.name.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn run(&mut self) -> Result<(), TemplateError> {
        let src = self.src;
        let mut pos = 0;
        let mut trim_next = false;

        while pos < src.len() {
            let Some(rel) = src[pos..].find("{{") else {
                self.push_text(&src[pos..], trim_next, false);
                break;
            };
            let open = pos + rel;
            let mut body_start = open + 2;
            let trim_left = src[body_start..]
                .strip_prefix('-')
                .is_some_and(|rest| rest.starts_with(char::is_whitespace));
            if trim_left {
                body_start += 1;
            }
            self.push_text(&src[pos..open], trim_next, trim_left);

            let rest = &src[body_start..];
            let lead = rest.len() - rest.trim_start().len();
            if rest[lead..].starts_with("/*") {
                let comment = body_start + lead;
                let Some(end) = src[comment + 2..].find("*/") else {
                    return Err(self.error(comment, "unclosed comment"));
                };
                let after = comment + 2 + end + 2;
                let (body_end, close_end, trim_right) = self.find_close(after)?;
                if !src[after..body_end].trim().is_empty() {
                    return Err(self.error(after, "comment ends before closing delimiter"));
                }
                trim_next = trim_right;
                pos = close_end;
                continue;
            }

            let (body_end, close_end, trim_right) = self.find_close(body_start)?;
            let node = self.parse_action(&src[body_start..body_end], body_start)?;
            self.nodes.push(node);
            trim_next = trim_right;
            pos = close_end;
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str, trim_start: bool, trim_end: bool) {
        let mut text = text;
        if trim_start {
            text = text.trim_start();
        }
        if trim_end {
            text = text.trim_end();
        }
        if !text.is_empty() {
            self.nodes.push(Node::Text(text.to_string()));
        }
    }

    /// Locate `}}` outside of string literals, starting at `from`.
    /// Returns (end of action body, end of delimiter, right trim marker).
    fn find_close(&self, from: usize) -> Result<(usize, usize, bool), TemplateError> {
        let bytes = self.src.as_bytes();
        let mut quote: Option<u8> = None;
        let mut i = from;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(b'"') if b == b'\\' => {
                    i += 2;
                    continue;
                }
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'`' => quote = Some(b),
                None if bytes[i..].starts_with(b"}}") => {
                    let body = &self.src[from..i];
                    let trim_right = body
                        .strip_suffix('-')
                        .is_some_and(|rest| rest.ends_with(char::is_whitespace));
                    let body_end = if trim_right { i - 1 } else { i };
                    return Ok((body_end, i + 2, trim_right));
                }
                None => {}
            }
            i += 1;
        }
        Err(self.error(from, "unclosed action"))
    }

    fn parse_action(&self, body: &str, offset: usize) -> Result<Node, TemplateError> {
        let tokens = self.tokenize(body, offset)?;
        let mut tokens = tokens.into_iter();
        match tokens.next() {
            None => Err(self.error(offset, "missing value for command")),
            Some(Token::Field(field)) => match tokens.next() {
                None => Ok(Node::Field(field)),
                Some(_) => Err(self.error(offset, format!("field .{field} takes no arguments"))),
            },
            Some(Token::Literal(value)) => match tokens.next() {
                None => Ok(Node::Literal(value)),
                Some(_) => Err(self.error(offset, "literal takes no arguments")),
            },
            Some(Token::Ident(name)) => {
                if !Functions::is_known(&name) {
                    return Err(TemplateError::UnknownFunction {
                        template: self.name.to_string(),
                        function: name,
                    });
                }
                let args = tokens
                    .map(|token| match token {
                        Token::Field(f) => Ok(Arg::Field(f)),
                        Token::Literal(v) => Ok(Arg::Literal(v)),
                        Token::Ident(word) => {
                            Err(self.error(offset, format!("unexpected word {word:?} in arguments")))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Call { name, args })
            }
        }
    }

    fn tokenize(&self, body: &str, offset: usize) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        let mut chars = body.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            let at = offset + start;
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            match c {
                '"' => {
                    chars.next();
                    let mut text = String::new();
                    loop {
                        match chars.next() {
                            None => return Err(self.error(at, "unterminated string")),
                            Some((_, '"')) => break,
                            Some((_, '\\')) => match chars.next() {
                                Some((_, '"')) => text.push('"'),
                                Some((_, '\\')) => text.push('\\'),
                                Some((_, 'n')) => text.push('\n'),
                                Some((_, 't')) => text.push('\t'),
                                Some((_, other)) => {
                                    return Err(self.error(at, format!("unknown escape \\{other}")));
                                }
                                None => return Err(self.error(at, "unterminated string")),
                            },
                            Some((_, ch)) => text.push(ch),
                        }
                    }
                    tokens.push(Token::Literal(Value::Str(text)));
                }
                '`' => {
                    chars.next();
                    let mut text = String::new();
                    loop {
                        match chars.next() {
                            None => return Err(self.error(at, "unterminated raw string")),
                            Some((_, '`')) => break,
                            Some((_, ch)) => text.push(ch),
                        }
                    }
                    tokens.push(Token::Literal(Value::Str(text)));
                }
                '.' => {
                    chars.next();
                    let field = take_word(&mut chars, |ch| ch.is_alphanumeric() || ch == '_');
                    if field.is_empty() {
                        return Err(self.error(at, "bare dot is not supported, name a field"));
                    }
                    tokens.push(Token::Field(field));
                }
                '|' => return Err(self.error(at, "pipelines are not supported")),
                '(' | ')' => return Err(self.error(at, "parenthesized commands are not supported")),
                c if c.is_ascii_digit() || c == '-' || c == '+' => {
                    let word = take_word(&mut chars, |ch| {
                        ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '+' | '_')
                    });
                    let value = if let Ok(i) = word.parse::<i64>() {
                        Value::Int(i)
                    } else if let Ok(f) = word.parse::<f64>() {
                        Value::Float(f)
                    } else {
                        return Err(self.error(at, format!("bad number syntax: {word:?}")));
                    };
                    tokens.push(Token::Literal(value));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let word = take_word(&mut chars, |ch| ch.is_alphanumeric() || ch == '_');
                    tokens.push(Token::Ident(word));
                }
                other => {
                    return Err(self.error(at, format!("unexpected {other:?} in action")));
                }
            }
        }
        Ok(tokens)
    }
}

fn take_word(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    accept: impl Fn(char) -> bool,
) -> String {
    let mut word = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !accept(ch) {
            break;
        }
        word.push(ch);
        chars.next();
    }
    word
}
