//! Message templates
//!
//! A small subset of Go `text/template` syntax, enough to keep configs written
//! for the old toggl2slack tool working:
//!
//! ```text
//! started {{.Description}}
//! {{- .Description | default "(no description)" | upper }}
//! {{ trunc 20 .Description }} ({{.UserId}})
//! ```
//!
//! Field names match case-insensitively with underscores ignored, so
//! `{{.UserId}}` reads the `user_id` field.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::activity::{Activity, EventKind};
use crate::config::Templates;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {template}: unclosed action at byte {offset}")]
    Unclosed { template: String, offset: usize },

    #[error("template {template}: empty action")]
    EmptyAction { template: String },

    #[error("template {template}: unexpected `{token}`")]
    UnexpectedToken { template: String, token: String },

    #[error("template {template}: unknown function `{function}`")]
    UnknownFunction { template: String, function: String },

    #[error("template {template}: field `{field}` not found")]
    UnknownField { template: String, field: String },

    #[error("template {template}: {function}: {reason}")]
    BadArguments {
        template: String,
        function: &'static str,
        reason: String,
    },

    #[error("cannot build template context: {0}")]
    Context(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    /// Field path, empty for `.`
    Field(Vec<String>),
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Upper,
    Lower,
    Title,
    Trim,
    Quote,
    Squote,
    Default,
    Trunc,
    Replace,
    Repeat,
    Cat,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "title" => Self::Title,
            "trim" => Self::Trim,
            "quote" => Self::Quote,
            "squote" => Self::Squote,
            "default" => Self::Default,
            "trunc" => Self::Trunc,
            "replace" => Self::Replace,
            "repeat" => Self::Repeat,
            "cat" => Self::Cat,
            _ => return None,
        };
        Some(function)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Title => "title",
            Self::Trim => "trim",
            Self::Quote => "quote",
            Self::Squote => "squote",
            Self::Default => "default",
            Self::Trunc => "trunc",
            Self::Replace => "replace",
            Self::Repeat => "repeat",
            Self::Cat => "cat",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Value(Arg),
    Call(Function, Vec<Arg>),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Action(Vec<Command>),
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

/// Upper bound on the output of `repeat`
const MAX_REPEAT_LEN: usize = 64 * 1024;

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r#""(?:[^"\\]|\\.)*"|\||[^\s|]+"#).unwrap())
}

impl Template {
    /// Parse a template source
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let nodes = parse_nodes(&name, source)?;
        Ok(Self { name, nodes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against an activity
    pub fn render(&self, activity: &Activity) -> Result<String, TemplateError> {
        let context = serde_json::to_value(activity)?;
        self.render_value(&context)
    }

    /// Render against an arbitrary JSON context
    pub fn render_value(&self, context: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.eval_pipeline(pipeline, context)?;
                    out.push_str(&display(&value));
                }
            }
        }
        Ok(out)
    }

    fn eval_pipeline(&self, pipeline: &[Command], context: &Value) -> Result<Value, TemplateError> {
        let mut piped: Option<Value> = None;
        for command in pipeline {
            let value = match command {
                Command::Value(arg) => self.eval_arg(arg, context)?,
                Command::Call(function, args) => {
                    let mut values = args
                        .iter()
                        .map(|arg| self.eval_arg(arg, context))
                        .collect::<Result<Vec<_>, _>>()?;
                    if let Some(previous) = piped.take() {
                        values.push(previous);
                    }
                    self.call(*function, values)?
                }
            };
            piped = Some(value);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn eval_arg(&self, arg: &Arg, context: &Value) -> Result<Value, TemplateError> {
        match arg {
            Arg::Str(s) => Ok(Value::String(s.clone())),
            Arg::Int(n) => Ok(Value::from(*n)),
            Arg::Field(path) => {
                let mut current = context;
                for segment in path {
                    current = lookup_field(current, segment).ok_or_else(|| {
                        TemplateError::UnknownField {
                            template: self.name.clone(),
                            field: path.join("."),
                        }
                    })?;
                }
                Ok(current.clone())
            }
        }
    }

    fn call(&self, function: Function, mut args: Vec<Value>) -> Result<Value, TemplateError> {
        let bad = |reason: String| TemplateError::BadArguments {
            template: self.name.clone(),
            function: function.name(),
            reason,
        };
        let arity = |args: &Vec<Value>, n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(bad(format!("expected {} argument(s), got {}", n, args.len())))
            }
        };

        let result = match function {
            Function::Upper => {
                arity(&args, 1)?;
                display(&args[0]).to_uppercase()
            }
            Function::Lower => {
                arity(&args, 1)?;
                display(&args[0]).to_lowercase()
            }
            Function::Title => {
                arity(&args, 1)?;
                title_case(&display(&args[0]))
            }
            Function::Trim => {
                arity(&args, 1)?;
                display(&args[0]).trim().to_string()
            }
            Function::Quote => {
                arity(&args, 1)?;
                serde_json::to_string(&display(&args[0]))?
            }
            Function::Squote => {
                arity(&args, 1)?;
                format!("'{}'", display(&args[0]))
            }
            Function::Default => {
                arity(&args, 2)?;
                let given = args.pop().unwrap_or(Value::Null);
                let fallback = args.pop().unwrap_or(Value::Null);
                return Ok(if is_empty(&given) { fallback } else { given });
            }
            Function::Trunc => {
                arity(&args, 2)?;
                let n = as_int(&args[0])
                    .ok_or_else(|| bad(format!("`{}` is not an integer", display(&args[0]))))?;
                truncate(&display(&args[1]), n)
            }
            Function::Replace => {
                arity(&args, 3)?;
                display(&args[2]).replace(&display(&args[0]), &display(&args[1]))
            }
            Function::Repeat => {
                arity(&args, 2)?;
                let n = as_int(&args[0])
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| bad(format!("`{}` is not a count", display(&args[0]))))?;
                let unit = display(&args[1]);
                unit.len()
                    .checked_mul(n)
                    .filter(|len| *len <= MAX_REPEAT_LEN)
                    .ok_or_else(|| bad(format!("output longer than {} bytes", MAX_REPEAT_LEN)))?;
                unit.repeat(n)
            }
            Function::Cat => args
                .iter()
                .filter(|v| !v.is_null())
                .map(display)
                .collect::<Vec<_>>()
                .join(" "),
        };
        Ok(Value::String(result))
    }
}

/// The compiled `started` / `finished` pair
#[derive(Debug, Clone)]
pub struct TemplateSet {
    started: Template,
    finished: Template,
}

impl TemplateSet {
    pub fn compile(templates: &Templates) -> Result<Self, TemplateError> {
        Ok(Self {
            started: Template::parse("started", templates.started.as_str())?,
            finished: Template::parse("finished", templates.finished.as_str())?,
        })
    }

    pub fn get(&self, kind: EventKind) -> &Template {
        match kind {
            EventKind::Started => &self.started,
            EventKind::Finished => &self.finished,
        }
    }
}

fn parse_nodes(name: &str, source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();
    let mut rest = source;
    let mut offset = 0;
    let mut trim_next = false;

    while let Some(open) = rest.find("{{") {
        let mut text = &rest[..open];
        if trim_next {
            text = text.trim_start();
        }

        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or(TemplateError::Unclosed {
            template: name.to_string(),
            offset: offset + open,
        })?;
        let mut inner = &after_open[..close];

        // `{{-` and `-}}` followed/preceded by whitespace trim the surrounding text
        if let Some(stripped) = inner
            .strip_prefix('-')
            .filter(|s| s.starts_with(char::is_whitespace))
        {
            inner = stripped;
            text = text.trim_end();
        }
        trim_next = false;
        if let Some(stripped) = inner
            .strip_suffix('-')
            .filter(|s| s.ends_with(char::is_whitespace))
        {
            inner = stripped;
            trim_next = true;
        }

        if !text.is_empty() {
            nodes.push(Node::Text(text.to_string()));
        }
        nodes.push(Node::Action(parse_pipeline(name, inner)?));

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        nodes.push(Node::Text(tail.to_string()));
    }
    Ok(nodes)
}

fn parse_pipeline(name: &str, inner: &str) -> Result<Vec<Command>, TemplateError> {
    let tokens: Vec<&str> = token_regex().find_iter(inner).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return Err(TemplateError::EmptyAction {
            template: name.to_string(),
        });
    }

    let mut pipeline = Vec::new();
    for (index, segment) in tokens.split(|t| *t == "|").enumerate() {
        let Some((head, rest)) = segment.split_first() else {
            return Err(TemplateError::EmptyAction {
                template: name.to_string(),
            });
        };

        let command = match parse_arg(head) {
            Some(arg) => {
                // a bare value can only start a pipeline and takes no arguments
                if index > 0 || !rest.is_empty() {
                    return Err(TemplateError::UnexpectedToken {
                        template: name.to_string(),
                        token: rest.first().unwrap_or(head).to_string(),
                    });
                }
                Command::Value(arg)
            }
            None => {
                let function = Function::lookup(head).ok_or_else(|| TemplateError::UnknownFunction {
                    template: name.to_string(),
                    function: head.to_string(),
                })?;
                let args = rest
                    .iter()
                    .map(|token| {
                        parse_arg(token).ok_or_else(|| TemplateError::UnexpectedToken {
                            template: name.to_string(),
                            token: token.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Command::Call(function, args)
            }
        };
        pipeline.push(command);
    }
    Ok(pipeline)
}

fn parse_arg(token: &str) -> Option<Arg> {
    if token == "." {
        return Some(Arg::Field(Vec::new()));
    }
    if let Some(path) = token.strip_prefix('.') {
        return Some(Arg::Field(path.split('.').map(str::to_string).collect()));
    }
    if token.starts_with('"') {
        return serde_json::from_str::<String>(token).ok().map(Arg::Str);
    }
    token.parse::<i64>().ok().map(Arg::Int)
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup_field<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    if let Some(exact) = object.get(segment) {
        return Some(exact);
    }
    let wanted = normalize(segment);
    object
        .iter()
        .find(|(key, _)| normalize(key) == wanted)
        .map(|(_, v)| v)
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// Keep the first `n` characters, or the last `-n` when negative
fn truncate(s: &str, n: i64) -> String {
    let len = s.chars().count();
    let keep = n.unsigned_abs() as usize;
    if keep >= len {
        return s.to_string();
    }
    if n >= 0 {
        s.chars().take(keep).collect()
    } else {
        s.chars().skip(len - keep).collect()
    }
}
