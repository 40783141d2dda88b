//! Top-down SVG view of a layout session
//!
//! The drawing is in world space seen from above: world `x` maps to SVG `x`
//! and world `z` maps to SVG `y`, both scaled by `pixels_per_meter`. Layers
//! are drawn bottom to top: container, zones, plan overlay, scene nodes,
//! drag preview.

use crate::entity::EntityKind;
use crate::geometry::{container_to_world, Point, Rect};
use crate::palette::Palette;
use crate::scene::SceneNode;
use crate::session::Session;

use super::SvgConfig;

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    /// Base rules for the layer classes
    pub fn add_base_styles(&mut self) {
        let p = self.prefix();
        self.styles.push(format!(
            ".{p}container {{ fill: none; stroke: #333333; stroke-width: 2; }}\n    \
             .{p}zone {{ fill-opacity: 0.6; stroke: #2E7D32; }}\n    \
             .{p}plan-element {{ fill-opacity: 0.25; stroke-dasharray: 4 2; stroke: #666666; }}\n    \
             .{p}node {{ stroke: #222222; stroke-width: 0.5; }}\n    \
             .{p}ghost {{ fill-opacity: 0.4; stroke-dasharray: 2 2; }}\n    \
             .{p}selected {{ stroke: #FF5722; stroke-width: 2; }}\n    \
             .{p}label {{ font-family: sans-serif; font-size: 10px; }}"
        ));
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// World meters to drawing units, rounded to 1/100
    fn px(&self, meters: f64) -> f64 {
        (meters * self.config.pixels_per_meter * 100.0).round() / 100.0 + 0.0
    }

    /// Add a world-space rectangle, optionally rotated about its center
    pub fn add_rect(
        &mut self,
        id: Option<&str>,
        rect: &Rect,
        rotation: f64,
        classes: &[String],
        styles: &str,
    ) {
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        let class_list = classes.join(" ");
        let center = rect.center();
        let transform = if rotation != 0.0 {
            format!(
                r#" transform="rotate({} {} {})""#,
                rotation,
                self.px(center.x),
                self.px(center.y)
            )
        } else {
            String::new()
        };

        self.elements.push(format!(
            r#"{}<rect{} class="{}" x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
            self.indent_str(),
            id_attr,
            class_list,
            self.px(rect.x),
            self.px(rect.y),
            self.px(rect.width),
            self.px(rect.height),
            styles,
            transform
        ));
    }

    /// Add a centered label at a world point
    pub fn add_label(&mut self, text: &str, at: Point) {
        let prefix = self.prefix();
        self.elements.push(format!(
            r#"{}<text class="{}label" x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            self.indent_str(),
            prefix,
            self.px(at.x),
            self.px(at.y),
            escape_xml(text)
        ));
    }

    /// Add a group element with optional ID and classes
    pub fn start_group(&mut self, id: Option<&str>, classes: &[String]) {
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        self.elements
            .push(format!("{}<g{}{}>", self.indent_str(), id_attr, class_attr));
        self.indent += 1;
    }

    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Build the final SVG string. `viewbox` is in world meters.
    pub fn build(self, viewbox: Rect) -> String {
        let padding = self.config.viewbox_padding;
        let vb_x = self.px(viewbox.x) - padding;
        let vb_y = self.px(viewbox.y) - padding;
        let vb_w = self.px(viewbox.width) + 2.0 * padding;
        let vb_h = self.px(viewbox.height) + 2.0 * padding;

        let nl = self.newline();
        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            vb_x, vb_y, vb_w, vb_h
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str("  <style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str("    ");
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str("  </style>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Render a session to an SVG string.
///
/// Read-only: nothing in the session or its scene is touched.
pub fn render_svg(session: &Session, config: &SvgConfig, palette: &Palette) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    let prefix = builder.prefix();
    let class = |name: &str| format!("{prefix}{name}");

    builder.add_base_styles();

    let container = session.container();
    let room = container.world_rect();
    builder.add_rect(None, &room, 0.0, &[class("container")], "");

    // Zones
    builder.start_group(Some("zones"), &[class("zones")]);
    for zone in session.zones().zones() {
        let origin = container_to_world(Point::new(zone.rect.x, zone.rect.y), container);
        let rect = Rect::new(origin.x, origin.y, zone.rect.width, zone.rect.height);
        builder.add_rect(
            Some(&zone.zone_id),
            &rect,
            0.0,
            &[class("zone")],
            &fill(palette.color_for("zone")),
        );
        builder.add_label(&zone.name, rect.center());
    }
    builder.end_group();

    // Plan overlay
    if config.show_plan {
        if let (Some(plan), Some(anchor)) = (session.plan(), session.anchor()) {
            builder.start_group(Some(&format!("plan-{}", plan.id)), &[class("plan")]);
            for element in &plan.elements {
                let rect = anchor.rect_to_world(&element.rect());
                builder.add_rect(
                    None,
                    &rect,
                    element.rotation,
                    &[class("plan-element"), class(&element.element_type)],
                    &fill(palette.color_for(&element.element_type)),
                );
            }
            builder.end_group();
        }
    }

    // Scene nodes; zones were drawn from the layout above
    let scene = session.scene();
    builder.start_group(Some("scene"), &[class("scene")]);
    for node in scene.nodes() {
        if node.blueprint.kind == EntityKind::Zone {
            continue;
        }
        let mut classes = vec![class("node"), class(node.blueprint.type_name())];
        if session.selection() == Some(node.entity_id.as_str()) {
            classes.push(class("selected"));
        }
        render_node(&mut builder, session, node, classes, palette);
    }
    if let Some(ghost) = scene.preview() {
        let classes = vec![class("node"), class("ghost")];
        render_node(&mut builder, session, ghost, classes, palette);
    }
    builder.end_group();

    let scene_bounds = scene.world_bounds().unwrap_or(room);
    builder.build(room.union(&scene_bounds))
}

/// Unrotated footprint rect plus a rotate transform
fn render_node(
    builder: &mut SvgBuilder,
    session: &Session,
    node: &SceneNode,
    classes: Vec<String>,
    palette: &Palette,
) {
    let center = session.scene().units().scene_to_world(node.position);
    let dims = node.dimensions();
    let rect = Rect::centered(center.floor(), dims.width, dims.depth);
    let id = (!node.ghost).then_some(node.entity_id.as_str());
    builder.add_rect(
        id,
        &rect,
        node.rotation,
        &classes,
        &fill(palette.color_for(node.blueprint.type_name())),
    );
}

fn fill(color: &str) -> String {
    format!(r#" fill="{}""#, color)
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geometry::{Dimensions, Point3};
    use crate::plan::{Catalog, FloorPlan, PlaceableTemplate};
    use crate::zone::Orientation;

    fn session() -> Session {
        let mut catalog = Catalog::new();
        catalog
            .register(PlaceableTemplate::new(
                "T1",
                "gondola",
                "Gondole",
                Dimensions::new(2.0, 1.5, 1.0),
            ))
            .unwrap();
        Session::new(EngineConfig::new().with_room(10.0, 10.0), catalog)
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b"), "a &lt; b");
        assert_eq!(escape_xml("Fruits & légumes"), "Fruits &amp; légumes");
    }

    #[test]
    fn test_empty_room() {
        let svg = render_svg(&session(), &SvgConfig::default(), &Palette::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="-120 -120 240 240""#));
        assert!(svg.contains(
            r#"<rect class="sl-container" x="-100" y="-100" width="200" height="200"/>"#
        ));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_zone_is_drawn_in_world_space() {
        let mut s = session();
        s.add_zone(
            None,
            Some("Fruits & légumes".to_string()),
            Rect::new(0.0, 0.0, 4.0, 3.0),
            Orientation::North,
        )
        .unwrap();
        let svg = render_svg(&s, &SvgConfig::default(), &Palette::default());
        assert!(svg.contains(
            r##"<rect id="Z001" class="sl-zone" x="-100" y="-100" width="80" height="60" fill="#E8F4EA"/>"##
        ));
        assert!(svg.contains("Fruits &amp; légumes"));
        // Zone slabs are not drawn a second time as scene nodes
        assert_eq!(svg.matches(r#"id="Z001""#).count(), 1);
    }

    #[test]
    fn test_rotated_node_and_selection() {
        let mut s = session();
        let wall = s
            .add_structure(
                EntityKind::Wall,
                Point3::new(1.0, 0.0, 1.0),
                90.0,
                Some(Dimensions::new(4.0, 3.0, 0.2)),
            )
            .unwrap();
        s.select(&wall.id).unwrap();
        let svg = render_svg(&s, &SvgConfig::default(), &Palette::default());
        assert!(svg.contains(r#"class="sl-node sl-wall sl-selected""#));
        assert!(svg.contains(r#"transform="rotate(90 20 20)""#));
        assert!(svg.contains(r##"fill="#555555""##));
    }

    #[test]
    fn test_preview_ghost() {
        let mut s = session();
        s.begin_preview("T1").unwrap();
        let svg = render_svg(&s, &SvgConfig::default(), &Palette::default());
        assert!(svg.contains(
            r##"<rect class="sl-node sl-ghost" x="-20" y="-10" width="40" height="20" fill="#20B2AA"/>"##
        ));

        s.abort_preview().unwrap();
        let svg = render_svg(&s, &SvgConfig::default(), &Palette::default());
        assert!(!svg.contains("sl-ghost\""));
    }

    #[test]
    fn test_plan_group_id_is_escaped() {
        let mut s = session();
        s.load_plan(FloorPlan::new(r#"rdc "A"&B"#, "Ground")).unwrap();
        let svg = render_svg(&s, &SvgConfig::default(), &Palette::default());
        assert!(svg.contains(r#"<g id="plan-rdc &quot;A&quot;&amp;B" class="sl-plan">"#));
    }

    #[test]
    fn test_compact_output() {
        let config = SvgConfig::new().with_pretty_print(false).with_standalone(false);
        let svg = render_svg(&session(), &config, &Palette::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("</style><rect class=\"sl-container\""));
    }
}
