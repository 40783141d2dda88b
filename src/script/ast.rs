//! AST for session scripts

use std::fmt;

use super::lexer::Span;

/// A node with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed script: commands in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub commands: Vec<Spanned<Command>>,
}

/// Right-hand side of a `key: value` argument
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Ident(String),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Ident(s) => write!(f, "{s}"),
            Value::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// One `key: value` entry of a `[...]` block
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: Spanned<String>,
    pub value: Spanned<Value>,
}

/// `element id type ["name"] [x:, y:, width:, height:, rotation:]`
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub id: String,
    pub element_type: String,
    pub name: Option<String>,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `container W D`
    Container { width: f64, depth: f64 },
    /// `zone [id] [x:, y:, width:, height:, orientation:, name:]`
    Zone { id: Option<String>, args: Vec<Arg> },
    /// `template id type ["name"] [width:, height:, depth:]`
    Template {
        id: String,
        template_type: String,
        name: Option<String>,
        args: Vec<Arg>,
    },
    /// `plan id ["name"] { element ... }`
    Plan {
        id: String,
        name: Option<String>,
        elements: Vec<Spanned<ElementDecl>>,
    },
    /// `close`
    ClosePlan,
    /// `assign T [to E]`
    Assign {
        template_id: String,
        element_id: Option<String>,
    },
    Choose(String),
    Cancel,
    /// `unassign T`
    Unassign(String),
    /// `unassign element E`
    UnassignElement(String),
    Place(String),
    /// `drop T [px:, py:, left:, top:, vw:, vh:]`
    Drop { template_id: String, args: Vec<Arg> },
    Preview(String),
    /// `hover [px:, py:, left:, top:, vw:, vh:]`
    Hover { args: Vec<Arg> },
    Commit,
    Abort,
    Auto,
    /// `structure wall|window|door [x:, z:, rotation:, width:, height:, depth:]`
    Structure { kind: String, args: Vec<Arg> },
    Move { id: String, args: Vec<Arg> },
    Rotate { id: String, degrees: f64 },
    Resize { id: String, args: Vec<Arg> },
    Remove(String),
    Select(String),
    Fit,
    /// `pan up|down|left|right|reset`
    Pan(String),
    Zoom(f64),
}

impl Command {
    /// Leading keyword, used in run reports
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Container { .. } => "container",
            Command::Zone { .. } => "zone",
            Command::Template { .. } => "template",
            Command::Plan { .. } => "plan",
            Command::ClosePlan => "close",
            Command::Assign { .. } => "assign",
            Command::Choose(_) => "choose",
            Command::Cancel => "cancel",
            Command::Unassign(_) | Command::UnassignElement(_) => "unassign",
            Command::Place(_) => "place",
            Command::Drop { .. } => "drop",
            Command::Preview(_) => "preview",
            Command::Hover { .. } => "hover",
            Command::Commit => "commit",
            Command::Abort => "abort",
            Command::Auto => "auto",
            Command::Structure { .. } => "structure",
            Command::Move { .. } => "move",
            Command::Rotate { .. } => "rotate",
            Command::Resize { .. } => "resize",
            Command::Remove(_) => "remove",
            Command::Select(_) => "select",
            Command::Fit => "fit",
            Command::Pan(_) => "pan",
            Command::Zoom(_) => "zoom",
        }
    }
}
