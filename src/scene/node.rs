//! Scene nodes and the composite meshes they are built from

use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::{Dimensions, Point3};
use crate::plan::PlaceableTemplate;

/// Size used for furniture that carries no dimensions at all
const FALLBACK_SIZE: Dimensions = Dimensions {
    width: 1.0,
    height: 1.0,
    depth: 1.0,
};

/// A box mesh inside a node, in node-local meters.
///
/// `offset` is the center of the box relative to the node origin, which sits
/// on the floor in the middle of the footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub offset: Point3,
    pub size: Dimensions,
}

impl MeshPart {
    fn new(name: impl Into<String>, offset: Point3, size: Dimensions) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
        }
    }

    /// Box resting on `base` height, centered horizontally
    fn resting(name: impl Into<String>, x: f64, base: f64, z: f64, size: Dimensions) -> Self {
        Self::new(name, Point3::new(x, base + size.height / 2.0, z), size)
    }
}

/// What a node is built from; a changed blueprint means a rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBlueprint {
    pub kind: EntityKind,
    pub template_type: Option<String>,
    pub dimensions: Dimensions,
}

impl NodeBlueprint {
    /// Entity dimensions win over template dimensions, which win over kind defaults.
    pub fn resolve(entity: &PlacedEntity, template: Option<&PlaceableTemplate>) -> Self {
        let dimensions = entity
            .dimensions
            .or_else(|| template.map(|t| t.dimensions()))
            .or_else(|| entity.kind.default_dimensions())
            .unwrap_or(FALLBACK_SIZE);
        Self {
            kind: entity.kind,
            template_type: template.map(|t| t.template_type.clone()),
            dimensions,
        }
    }

    /// Element type used for coloring
    pub fn type_name(&self) -> &str {
        self.template_type
            .as_deref()
            .unwrap_or_else(|| self.kind.type_name())
    }

    /// Build the composite mesh
    pub fn build_parts(&self) -> Vec<MeshPart> {
        let d = self.dimensions;
        match self.kind {
            EntityKind::Zone => vec![MeshPart::resting("floor", 0.0, 0.0, 0.0, d)],
            EntityKind::Wall => vec![MeshPart::resting("wall", 0.0, 0.0, 0.0, d)],
            EntityKind::Door => vec![MeshPart::resting("panel", 0.0, 0.0, 0.0, d)],
            EntityKind::Window => window_parts(d),
            EntityKind::Furniture => match self.template_type.as_deref() {
                Some("gondola") => gondola_parts(d),
                Some("table") => table_parts(d),
                Some("cashier") | Some("counter") => counter_parts(d),
                Some("shelf") | Some("rack") | Some("display") | Some("planogram") => {
                    shelf_parts(d, 4)
                }
                _ => vec![MeshPart::resting("body", 0.0, 0.0, 0.0, d)],
            },
        }
    }
}

fn window_parts(d: Dimensions) -> Vec<MeshPart> {
    let frame = 0.05_f64.min(d.width / 4.0).min(d.height / 4.0);
    let sill = 1.0;
    vec![
        MeshPart::resting(
            "frame",
            0.0,
            sill,
            0.0,
            Dimensions::new(d.width, d.height, d.depth),
        ),
        MeshPart::resting(
            "glass",
            0.0,
            sill + frame,
            0.0,
            Dimensions::new(d.width - 2.0 * frame, d.height - 2.0 * frame, d.depth / 2.0),
        ),
    ]
}

fn gondola_parts(d: Dimensions) -> Vec<MeshPart> {
    let base_h = 0.1_f64.min(d.height / 4.0);
    let spine = 0.05_f64.min(d.depth / 4.0);
    let mut parts = vec![
        MeshPart::resting("base", 0.0, 0.0, 0.0, Dimensions::new(d.width, base_h, d.depth)),
        MeshPart::resting(
            "spine",
            0.0,
            base_h,
            0.0,
            Dimensions::new(d.width, d.height - base_h, spine),
        ),
    ];
    let levels = 3;
    let step = (d.height - base_h) / f64::from(levels + 1);
    for i in 1..=levels {
        parts.push(MeshPart::resting(
            format!("shelf-{i}"),
            0.0,
            base_h + step * f64::from(i),
            0.0,
            Dimensions::new(d.width, 0.02, d.depth),
        ));
    }
    parts
}

fn table_parts(d: Dimensions) -> Vec<MeshPart> {
    let top = 0.05_f64.min(d.height / 4.0);
    let leg = 0.05_f64.min(d.width / 4.0).min(d.depth / 4.0);
    let leg_size = Dimensions::new(leg, d.height - top, leg);
    let lx = d.width / 2.0 - leg / 2.0;
    let lz = d.depth / 2.0 - leg / 2.0;
    vec![
        MeshPart::resting("top", 0.0, d.height - top, 0.0, Dimensions::new(d.width, top, d.depth)),
        MeshPart::resting("leg-1", -lx, 0.0, -lz, leg_size),
        MeshPart::resting("leg-2", lx, 0.0, -lz, leg_size),
        MeshPart::resting("leg-3", -lx, 0.0, lz, leg_size),
        MeshPart::resting("leg-4", lx, 0.0, lz, leg_size),
    ]
}

fn counter_parts(d: Dimensions) -> Vec<MeshPart> {
    let body_h = d.height * 0.9;
    vec![
        MeshPart::resting("counter", 0.0, 0.0, 0.0, Dimensions::new(d.width, body_h, d.depth)),
        MeshPart::resting(
            "register",
            d.width / 4.0,
            body_h,
            0.0,
            Dimensions::new(d.width / 4.0, d.height - body_h, d.depth / 2.0),
        ),
    ]
}

fn shelf_parts(d: Dimensions, levels: u32) -> Vec<MeshPart> {
    let back = 0.03_f64.min(d.depth / 4.0);
    let mut parts = vec![MeshPart::resting(
        "back",
        0.0,
        0.0,
        -d.depth / 2.0 + back / 2.0,
        Dimensions::new(d.width, d.height, back),
    )];
    let step = d.height / f64::from(levels);
    for i in 0..levels {
        parts.push(MeshPart::resting(
            format!("shelf-{}", i + 1),
            0.0,
            step * f64::from(i),
            0.0,
            Dimensions::new(d.width, 0.02, d.depth),
        ));
    }
    parts
}

/// A node in the scene graph. Position is in scene units.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub entity_id: String,
    pub blueprint: NodeBlueprint,
    pub parts: Vec<MeshPart>,
    pub position: Point3,
    /// Degrees in `[0, 360)`
    pub rotation: f64,
    /// Preview nodes are drawn translucent and never belong to an entity
    pub ghost: bool,
}

impl SceneNode {
    pub fn build(entity_id: impl Into<String>, blueprint: NodeBlueprint, position: Point3, rotation: f64) -> Self {
        let parts = blueprint.build_parts();
        Self {
            entity_id: entity_id.into(),
            blueprint,
            parts,
            position,
            rotation,
            ghost: false,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.blueprint.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn furniture(ty: &str, d: Dimensions) -> NodeBlueprint {
        NodeBlueprint {
            kind: EntityKind::Furniture,
            template_type: Some(ty.to_string()),
            dimensions: d,
        }
    }

    #[test]
    fn test_composite_part_counts() {
        let d = Dimensions::new(2.0, 1.6, 0.9);
        assert_eq!(furniture("gondola", d).build_parts().len(), 5);
        assert_eq!(furniture("table", d).build_parts().len(), 5);
        assert_eq!(furniture("cashier", d).build_parts().len(), 2);
        assert_eq!(furniture("shelf", d).build_parts().len(), 5);
        assert_eq!(furniture("cube", d).build_parts().len(), 1);
    }

    #[test]
    fn test_parts_stay_within_height() {
        let d = Dimensions::new(1.2, 1.0, 0.8);
        for ty in ["gondola", "table", "cashier", "shelf", "plant"] {
            for part in furniture(ty, d).build_parts() {
                let top = part.offset.y + part.size.height / 2.0;
                assert!(top <= d.height + 1e-9, "{ty}/{} reaches {top}", part.name);
            }
        }
    }

    #[test]
    fn test_resolve_dimension_precedence() {
        let entity = PlacedEntity::new("P001", EntityKind::Furniture, Point3::zero());
        let template = PlaceableTemplate::fixed_cashier();
        let bp = NodeBlueprint::resolve(&entity, Some(&template));
        assert_eq!(bp.dimensions, Dimensions::new(1.2, 1.0, 0.8));
        assert_eq!(bp.type_name(), "cashier");

        let sized = entity.clone().with_dimensions(Dimensions::new(3.0, 2.0, 1.0));
        assert_eq!(
            NodeBlueprint::resolve(&sized, Some(&template)).dimensions,
            Dimensions::new(3.0, 2.0, 1.0)
        );

        let bare = NodeBlueprint::resolve(&entity, None);
        assert_eq!(bare.dimensions, FALLBACK_SIZE);
        assert_eq!(bare.type_name(), "furniture");
    }
}
