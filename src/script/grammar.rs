//! Script parser using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::*;
use super::error::ScriptError;
use super::lexer::{lex, Token};

/// Parse a session script
pub fn parse(input: &str) -> Result<Script, Vec<ScriptError>> {
    let len = input.len();

    let token_iter = lex(input).map(|(tok, span)| (tok, span.into()));

    // Split (Token, SimpleSpan) into token and span parts
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    script_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(ScriptError::from).collect())
}

fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn script_parser<'a, I>() -> impl Parser<'a, I, Script, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let ident = select! {
        Token::Ident(s) => s,
    };

    // Ids can be quoted when they clash with a keyword
    let id = select! {
        Token::Ident(s) => s,
        Token::String(s) => s,
    };

    let string = select! {
        Token::String(s) => s,
    };

    let number = select! {
        Token::Number(n) => n,
    };

    let value = select! {
        Token::Number(n) => Value::Number(n),
        Token::Ident(s) => Value::Ident(s),
        Token::String(s) => Value::String(s),
    }
    .map_with(|v, e| Spanned::new(v, span_range(&e.span())));

    let arg = ident
        .clone()
        .map_with(|k, e| Spanned::new(k, span_range(&e.span())))
        .then_ignore(just(Token::Colon))
        .then(value)
        .map(|(key, value)| Arg { key, value });

    let args = arg
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

    let opt_args = args.clone().or_not().map(|a| a.unwrap_or_default());

    // --- room, catalog, plan ---

    let container = just(Token::Container)
        .ignore_then(number.clone())
        .then(number.clone())
        .map(|(width, depth)| Command::Container { width, depth });

    let zone = just(Token::Zone)
        .ignore_then(id.clone().or_not())
        .then(opt_args.clone())
        .map(|(id, args)| Command::Zone { id, args });

    let template = just(Token::Template)
        .ignore_then(id.clone())
        .then(ident.clone())
        .then(string.clone().or_not())
        .then(opt_args.clone())
        .map(|(((id, template_type), name), args)| Command::Template {
            id,
            template_type,
            name,
            args,
        });

    let element = just(Token::Element)
        .ignore_then(id.clone())
        .then(ident.clone())
        .then(string.clone().or_not())
        .then(opt_args.clone())
        .map_with(|(((id, element_type), name), args), e| {
            Spanned::new(
                ElementDecl {
                    id,
                    element_type,
                    name,
                    args,
                },
                span_range(&e.span()),
            )
        });

    let plan = just(Token::Plan)
        .ignore_then(id.clone())
        .then(string.clone().or_not())
        .then(
            element
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
        )
        .map(|((id, name), elements)| Command::Plan { id, name, elements });

    let close = just(Token::Close).to(Command::ClosePlan);

    // --- matching ---

    let assign = just(Token::Assign)
        .ignore_then(id.clone())
        .then(just(Token::To).ignore_then(id.clone()).or_not())
        .map(|(template_id, element_id)| Command::Assign {
            template_id,
            element_id,
        });

    let choose = just(Token::Choose).ignore_then(id.clone()).map(Command::Choose);
    let cancel = just(Token::Cancel).to(Command::Cancel);

    let unassign = just(Token::Unassign).ignore_then(choice((
        just(Token::Element)
            .ignore_then(id.clone())
            .map(Command::UnassignElement),
        id.clone().map(Command::Unassign),
    )));

    // --- placement ---

    let place = just(Token::Place).ignore_then(id.clone()).map(Command::Place);

    let drop = just(Token::Drop)
        .ignore_then(id.clone())
        .then(args.clone())
        .map(|(template_id, args)| Command::Drop { template_id, args });

    let preview = just(Token::Preview).ignore_then(id.clone()).map(Command::Preview);

    let hover = just(Token::Hover)
        .ignore_then(args.clone())
        .map(|args| Command::Hover { args });

    let commit = just(Token::Commit).to(Command::Commit);
    let abort = just(Token::Abort).to(Command::Abort);
    let auto = just(Token::Auto).to(Command::Auto);

    let structure = just(Token::Structure)
        .ignore_then(ident.clone())
        .then(opt_args.clone())
        .map(|(kind, args)| Command::Structure { kind, args });

    // --- entity edits ---

    let move_cmd = just(Token::Move)
        .ignore_then(id.clone())
        .then(args.clone())
        .map(|(id, args)| Command::Move { id, args });

    let rotate = just(Token::Rotate)
        .ignore_then(id.clone())
        .then(number.clone())
        .map(|(id, degrees)| Command::Rotate { id, degrees });

    let resize = just(Token::Resize)
        .ignore_then(id.clone())
        .then(args)
        .map(|(id, args)| Command::Resize { id, args });

    let remove = just(Token::Remove).ignore_then(id.clone()).map(Command::Remove);
    let select = just(Token::Select).ignore_then(id.clone()).map(Command::Select);

    // --- camera ---

    let fit = just(Token::Fit).to(Command::Fit);
    let pan = just(Token::Pan).ignore_then(ident.clone()).map(Command::Pan);
    let zoom = just(Token::Zoom).ignore_then(number.clone()).map(Command::Zoom);

    let setup = choice((container, zone, template, plan, close)).boxed();
    let matching = choice((assign, choose, cancel, unassign)).boxed();
    let placement = choice((place, drop, preview, hover, commit, abort, auto, structure)).boxed();
    let edits = choice((move_cmd, rotate, resize, remove, select, fit, pan, zoom)).boxed();

    choice((setup, matching, placement, edits))
        .map_with(|c, e| Spanned::new(c, span_range(&e.span())))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|commands| Script { commands })
}
