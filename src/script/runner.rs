//! Executes parsed scripts against a session.
//!
//! Every command goes through the same [`Session`] method an interactive
//! caller would use. A failing command is recorded in the report and the
//! run continues with the next one.
//!
//! Pointer commands (`drop`, `hover`) take `px`/`py` in viewport pixels. The
//! viewport defaults to the container itself (`left: 0, top: 0`, one pixel
//! per meter), so without `vw`/`vh` the pointer is in container meters.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use super::ast::{Arg, Command, Script, Value};
use super::error::{CommandError, ScriptError};
use super::grammar::parse;
use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::{Dimensions, Point, Point3, Rect, Viewport};
use crate::plan::{FloorPlan, PlaceableTemplate, PlanElement};
use crate::scene::{Framing, PanDirection, SceneError};
use crate::session::{AutoPlacementReport, Session, SessionError};
use crate::zone::Orientation;

/// Result of one command
#[derive(Debug)]
pub struct CommandOutcome {
    /// 1-based source line of the command
    pub line: usize,
    pub verb: &'static str,
    pub result: Result<String, CommandError>,
}

impl CommandOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a whole run, in command order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<CommandOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(message) => writeln!(f, "{:>3} {}: {}", outcome.line, outcome.verb, message)?,
                Err(err) => writeln!(f, "{:>3} {}: error: {}", outcome.line, outcome.verb, err)?,
            }
        }
        write!(
            f,
            "{} commands, {} failed",
            self.outcomes.len(),
            self.failed()
        )
    }
}

/// Parse and run a script. Syntax errors stop the run before any command executes.
pub fn run(session: &mut Session, source: &str) -> Result<RunReport, Vec<ScriptError>> {
    let script = parse(source)?;
    Ok(execute(session, &script, source))
}

/// Run an already parsed script; `source` is only used for line numbers.
pub fn execute(session: &mut Session, script: &Script, source: &str) -> RunReport {
    let mut report = RunReport::default();
    for command in &script.commands {
        let line = line_of(source, command.span.start);
        let verb = command.node.verb();
        let result = execute_command(session, &command.node);
        match &result {
            Ok(message) => debug!(line, verb, %message, "command done"),
            Err(err) => warn!(line, verb, error = %err, "command failed"),
        }
        report.outcomes.push(CommandOutcome { line, verb, result });
    }
    report
}

fn line_of(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .map_or(1, |prefix| prefix.matches('\n').count() + 1)
}

/// Validated `key: value` arguments of one command
struct Args<'s> {
    command: &'static str,
    args: &'s [Arg],
}

impl<'s> Args<'s> {
    fn new(command: &'static str, args: &'s [Arg], allowed: &[&str]) -> Result<Self, CommandError> {
        for (i, arg) in args.iter().enumerate() {
            let key = arg.key.node.as_str();
            if !allowed.contains(&key) {
                return Err(CommandError::UnknownArgument {
                    command,
                    key: key.to_string(),
                });
            }
            if args[..i].iter().any(|a| a.key.node == key) {
                return Err(CommandError::DuplicateArgument(key.to_string()));
            }
        }
        Ok(Self { command, args })
    }

    fn get(&self, key: &str) -> Option<&'s Value> {
        self.args
            .iter()
            .find(|a| a.key.node == key)
            .map(|a| &a.value.node)
    }

    fn number(&self, key: &str) -> Result<Option<f64>, CommandError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(_) => Err(CommandError::InvalidArgument {
                key: key.to_string(),
                expected: "a number",
            }),
        }
    }

    fn number_or(&self, key: &str, default: f64) -> Result<f64, CommandError> {
        Ok(self.number(key)?.unwrap_or(default))
    }

    fn require(&self, key: &'static str) -> Result<f64, CommandError> {
        self.number(key)?.ok_or(CommandError::MissingArgument {
            command: self.command,
            key,
        })
    }

    fn text(&self, key: &str) -> Result<Option<&'s str>, CommandError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Ident(s)) | Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(Value::Number(_)) => Err(CommandError::InvalidArgument {
                key: key.to_string(),
                expected: "a name",
            }),
        }
    }
}

const POINTER_ARGS: &[&str] = &["px", "py", "left", "top", "vw", "vh"];

fn pointer_args(
    session: &Session,
    command: &'static str,
    args: &[Arg],
) -> Result<(Point, Viewport), CommandError> {
    let args = Args::new(command, args, POINTER_ARGS)?;
    let container = session.container();
    let pointer = Point::new(args.require("px")?, args.require("py")?);
    let viewport = Viewport::new(
        args.number_or("left", 0.0)?,
        args.number_or("top", 0.0)?,
        args.number_or("vw", container.width)?,
        args.number_or("vh", container.height)?,
    );
    Ok((pointer, viewport))
}

fn describe(entity: &PlacedEntity) -> String {
    format!("{} at ({:.2}, {:.2})", entity.id, entity.x, entity.z)
}

fn describe_framing(framing: &Framing) -> String {
    format!(
        "camera on ({:.2}, {:.2}) at distance {:.2}",
        framing.target.x, framing.target.z, framing.distance
    )
}

fn describe_auto(report: &AutoPlacementReport) -> String {
    format!(
        "{} placed, {} ambiguous, {} unmatched",
        report.placed.len(),
        report.ambiguous.len(),
        report.unmatched.len()
    )
}

fn structure_kind(name: &str) -> Result<EntityKind, CommandError> {
    match name {
        "wall" => Ok(EntityKind::Wall),
        "window" => Ok(EntityKind::Window),
        "door" => Ok(EntityKind::Door),
        other => Err(CommandError::UnknownStructure(other.to_string())),
    }
}

fn pan_direction(name: &str) -> Result<PanDirection, CommandError> {
    match name {
        "up" => Ok(PanDirection::Up),
        "down" => Ok(PanDirection::Down),
        "left" => Ok(PanDirection::Left),
        "right" => Ok(PanDirection::Right),
        "reset" => Ok(PanDirection::Reset),
        other => Err(CommandError::UnknownDirection(other.to_string())),
    }
}

fn unknown_entity(id: &str) -> CommandError {
    SessionError::from(SceneError::UnknownEntity(id.to_string())).into()
}

/// Current size of an entity as drawn in the scene
fn current_dimensions(session: &Session, id: &str) -> Result<Dimensions, CommandError> {
    session
        .scene()
        .node(id)
        .map(|node| node.dimensions())
        .ok_or_else(|| unknown_entity(id))
}

fn execute_command(session: &mut Session, command: &Command) -> Result<String, CommandError> {
    let verb = command.verb();
    match command {
        Command::Container { width, depth } => {
            session.set_container(*width, *depth)?;
            Ok(format!("container {} x {}", width, depth))
        }

        Command::Zone { id, args } => {
            let args = Args::new(verb, args, &["x", "y", "width", "height", "orientation", "name"])?;
            let rect = Rect::new(
                args.number_or("x", 0.0)?,
                args.number_or("y", 0.0)?,
                args.require("width")?,
                args.require("height")?,
            );
            let orientation = match args.text("orientation")? {
                Some(text) => {
                    Orientation::from_str(text).map_err(|_| CommandError::InvalidArgument {
                        key: "orientation".to_string(),
                        expected: "north, east, south or west",
                    })?
                }
                None => Orientation::default(),
            };
            let name = args.text("name")?.map(str::to_string);
            let zone = session.add_zone(id.clone(), name, rect, orientation)?;
            Ok(format!("zone {} \"{}\" added", zone.zone_id, zone.name))
        }

        Command::Template {
            id,
            template_type,
            name,
            args,
        } => {
            let args = Args::new(verb, args, &["width", "height", "depth"])?;
            let dimensions = Dimensions::new(
                args.require("width")?,
                args.require("height")?,
                args.require("depth")?,
            );
            let name = name.clone().unwrap_or_else(|| id.clone());
            session.register_template(PlaceableTemplate::new(
                id.clone(),
                template_type.clone(),
                name,
                dimensions,
            ))?;
            Ok(format!("template {} registered", id))
        }

        Command::Plan { id, name, elements } => {
            let mut plan = FloorPlan::new(id.clone(), name.clone().unwrap_or_else(|| id.clone()));
            for decl in elements {
                let decl = &decl.node;
                let args = Args::new("element", &decl.args, &["x", "y", "width", "height", "rotation"])?;
                let rect = Rect::new(
                    args.require("x")?,
                    args.require("y")?,
                    args.require("width")?,
                    args.require("height")?,
                );
                let mut element = PlanElement::new(decl.id.clone(), decl.element_type.clone(), rect)
                    .with_rotation(args.number_or("rotation", 0.0)?);
                if let Some(name) = &decl.name {
                    element = element.with_name(name.clone());
                }
                plan = plan.with_element(element);
            }
            let count = plan.elements.len();
            session.load_plan(plan)?;
            Ok(format!("plan {} loaded with {} elements", id, count))
        }

        Command::ClosePlan => {
            session.close_plan()?;
            Ok("plan closed".to_string())
        }

        Command::Assign {
            template_id,
            element_id,
        } => {
            let assignment = session.request_assign(template_id, element_id.as_deref())?;
            Ok(format!(
                "{} assigned to {}",
                assignment.template_id, assignment.element_id
            ))
        }

        Command::Choose(element_id) => {
            let assignment = session.choose_candidate(element_id)?;
            Ok(format!(
                "{} assigned to {}",
                assignment.template_id, assignment.element_id
            ))
        }

        Command::Cancel => {
            session.cancel_disambiguation()?;
            Ok("choice cancelled".to_string())
        }

        Command::Unassign(template_id) => {
            let assignment = session.unassign_template(template_id)?;
            Ok(format!(
                "{} released from {}",
                assignment.template_id, assignment.element_id
            ))
        }

        Command::UnassignElement(element_id) => {
            let assignment = session.unassign_element(element_id)?;
            Ok(format!(
                "{} released from {}",
                assignment.template_id, assignment.element_id
            ))
        }

        Command::Place(template_id) => {
            let entity = session.place_template(template_id)?;
            Ok(format!("{} placed as {}", template_id, describe(&entity)))
        }

        Command::Drop { template_id, args } => {
            let (pointer, viewport) = pointer_args(session, verb, args)?;
            let entity = session.drop_template(template_id, pointer, &viewport)?;
            Ok(format!("{} placed as {}", template_id, describe(&entity)))
        }

        Command::Preview(template_id) => {
            session.begin_preview(template_id)?;
            Ok(format!("previewing {}", template_id))
        }

        Command::Hover { args } => {
            let (pointer, viewport) = pointer_args(session, verb, args)?;
            let at = session.hover(pointer, &viewport)?;
            Ok(format!("preview at ({:.2}, {:.2})", at.x, at.z))
        }

        Command::Commit => {
            let entity = session.commit_preview()?;
            let template = entity.template_id.as_deref().unwrap_or_default();
            Ok(format!("{} placed as {}", template, describe(&entity)))
        }

        Command::Abort => {
            session.abort_preview()?;
            Ok("preview aborted".to_string())
        }

        Command::Auto => {
            let report = session.auto_place()?;
            Ok(describe_auto(&report))
        }

        Command::Structure { kind, args } => {
            let kind = structure_kind(kind)?;
            let args = Args::new(
                verb,
                args,
                &["x", "z", "rotation", "width", "height", "depth"],
            )?;
            let position = Point3::new(args.number_or("x", 0.0)?, 0.0, args.number_or("z", 0.0)?);
            let (width, height, depth) = (
                args.number("width")?,
                args.number("height")?,
                args.number("depth")?,
            );
            let dimensions = if width.is_some() || height.is_some() || depth.is_some() {
                let base = kind
                    .default_dimensions()
                    .unwrap_or(Dimensions::new(1.0, 1.0, 1.0));
                Some(Dimensions::new(
                    width.unwrap_or(base.width),
                    height.unwrap_or(base.height),
                    depth.unwrap_or(base.depth),
                ))
            } else {
                None
            };
            let entity = session.add_structure(
                kind,
                position,
                args.number_or("rotation", 0.0)?,
                dimensions,
            )?;
            Ok(format!("{} added as {}", kind, describe(&entity)))
        }

        Command::Move { id, args } => {
            let args = Args::new(verb, args, &["x", "y", "z"])?;
            let current = session
                .entity(id)
                .map(|e| e.position())
                .ok_or_else(|| unknown_entity(id))?;
            let position = Point3::new(
                args.number_or("x", current.x)?,
                args.number_or("y", current.y)?,
                args.number_or("z", current.z)?,
            );
            session.move_entity(id, position)?;
            let moved = session.entity(id).map(describe).unwrap_or_else(|| id.clone());
            Ok(format!("moved {}", moved))
        }

        Command::Rotate { id, degrees } => {
            let angle = session.rotate_entity(id, *degrees)?;
            Ok(format!("{} rotated to {}", id, angle))
        }

        Command::Resize { id, args } => {
            let args = Args::new(verb, args, &["width", "height", "depth"])?;
            let current = current_dimensions(session, id)?;
            let dimensions = Dimensions::new(
                args.number_or("width", current.width)?,
                args.number_or("height", current.height)?,
                args.number_or("depth", current.depth)?,
            );
            session.resize_entity(id, dimensions)?;
            Ok(format!(
                "{} resized to {} x {} x {}",
                id, dimensions.width, dimensions.height, dimensions.depth
            ))
        }

        Command::Remove(id) => {
            session.remove_entity(id)?;
            Ok(format!("{} removed", id))
        }

        Command::Select(id) => {
            session.select(id)?;
            Ok(format!("{} selected", id))
        }

        Command::Fit => Ok(describe_framing(&session.fit())),

        Command::Pan(direction) => {
            let direction = pan_direction(direction)?;
            Ok(describe_framing(&session.pan(direction)))
        }

        Command::Zoom(scale) => Ok(describe_framing(&session.zoom(*scale))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::plan::Catalog;
    use crate::session::MatchState;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(EngineConfig::new().with_room(50.0, 30.0), Catalog::new())
    }

    #[test]
    fn test_line_of() {
        let source = "fit\n\nauto";
        assert_eq!(line_of(source, 0), 1);
        assert_eq!(line_of(source, 5), 3);
    }

    #[test]
    fn test_zone_conflict_is_recoverable() {
        let mut s = session();
        let report = run(
            &mut s,
            r#"
zone [x: 0, y: 0, width: 20, height: 15]
zone [x: 10, y: 0, width: 20, height: 15]
zone [x: 25, y: 0, width: 20, height: 15]
"#,
        )
        .expect("Should parse");

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].is_ok());
        assert!(!report.outcomes[1].is_ok());
        assert!(report.outcomes[2].is_ok());
        assert_eq!(report.outcomes[1].line, 3);
        let ids: Vec<_> = s.zones().zones().iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["Z001", "Z002"]);
    }

    #[test]
    fn test_argument_errors() {
        let mut s = session();
        let report = run(
            &mut s,
            r#"
zone [x: 0, width: 5]
zone [x: 0, y: 0, width: 5, height: 5, colour: red]
zone [x: 0, x: 1, width: 5, height: 5]
zone [x: "left", y: 0, width: 5, height: 5]
zone [width: 5, height: 5, orientation: sideways]
"#,
        )
        .expect("Should parse");

        let messages: Vec<String> = report
            .outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap_err().to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "missing argument 'height' for zone",
                "unknown argument 'colour' for zone",
                "argument 'x' is given twice",
                "argument 'x' must be a number",
                "argument 'orientation' must be north, east, south or west",
            ]
        );
        assert!(s.zones().zones().is_empty());
    }

    #[test]
    fn test_ambiguous_assignment_then_choice() {
        let mut s = session();
        let report = run(
            &mut s,
            r#"
template T1 shelf "Étagère" [width: 2, height: 1.8, depth: 0.6]
plan shop {
    element E1 shelf [x: 0, y: 0, width: 200, height: 60]
    element E2 shelf [x: 400, y: 0, width: 200, height: 60]
}
assign T1
"#,
        )
        .expect("Should parse");
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            s.match_state(),
            MatchState::AwaitingDisambiguation { .. }
        ));

        let report = run(&mut s, "choose E2\nplace T1").expect("Should parse");
        assert!(report.is_clean(), "{report}");
        assert_eq!(s.matcher().template_for("E2"), Some("T1"));
    }

    #[test]
    fn test_structure_and_edits() {
        let mut s = session();
        let report = run(
            &mut s,
            r#"
structure wall [x: 1, z: 2, width: 6]
rotate P001 370
move P001 [x: 3]
resize P001 [height: 2.5]
select P001
structure stairs
"#,
        )
        .expect("Should parse");
        assert_eq!(report.failed(), 1);

        let wall = s.entity("P001").expect("wall exists");
        assert_eq!(wall.kind, EntityKind::Wall);
        assert_eq!(wall.rotation, 10.0);
        assert_eq!(wall.x, 3.0);
        assert_eq!(wall.z, 2.0);
        assert_eq!(wall.dimensions, Some(Dimensions::new(6.0, 2.5, 0.2)));
        assert_eq!(s.selection(), Some("P001"));
    }

    #[test]
    fn test_report_display() {
        let mut s = session();
        let report = run(&mut s, "zone [width: 5, height: 4, name: \"Caisse\"]\nchoose E1").expect("Should parse");
        assert_eq!(
            report.to_string(),
            "  1 zone: zone Z001 \"Caisse\" added\n  2 choose: error: no assignment is waiting for a choice\n2 commands, 1 failed"
        );
    }
}
