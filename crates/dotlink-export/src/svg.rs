//! SVG export serializer.
//!
//! Renders a [`RoundSnapshot`] into an SVG document using the [`svg`]
//! crate for document construction, XML escaping, and attribute
//! formatting. The coordinate space is the play area itself, so the
//! `viewBox` is `0 0 width height`.
//!
//! Layers, back to front:
//!
//! - `<g id="segments">`: one `<line>` per drawn segment.
//! - `<g id="nodes">`: one `<circle>` per node. Junctions are drawn
//!   smaller than original points.
//! - `<g id="preview">`: the dashed drag line, when a drag is in progress.
//!
//! Nodes and segments are colored by component so the player can see
//! which groups are already joined. Once the round is won everything is
//! drawn in [`WON_COLOR`].
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Circle, Description, Element, Group, Line, Rectangle, Title};
use svg::node::{Node, Text};

use dotlink_engine::{Bounds, DragPreview, EngineState, NodeKind, RoundSnapshot};

/// Component colors, cycled by component label.
pub const COMPONENT_COLORS: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#9467bd", "#d62728", "#8c564b", "#e377c2", "#17becf", "#bcbd22",
];

/// Color of every node and segment once the round is won.
pub const WON_COLOR: &str = "#2ca02c";

/// Junction radius as a fraction of the original node radius.
const JUNCTION_SCALE: f64 = 0.4;

/// Segment stroke width as a fraction of the node radius.
const STROKE_SCALE: f64 = 0.25;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. `title` and `description` become `<title>`
/// and `<desc>` right after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// The CLI puts the score summary here.
    pub description: Option<&'a str>,

    /// Serialized game configuration, emitted inside `<metadata>` wrapped
    /// in a namespaced `<dotlink:config>` element so exported rounds can
    /// be reproduced.
    pub config_json: Option<&'a str>,
}

/// Fill/stroke color for a component label in the given engine state.
#[must_use]
pub fn component_color(label: usize, state: EngineState) -> &'static str {
    if state == EngineState::Won {
        WON_COLOR
    } else {
        COMPONENT_COLORS[label % COMPONENT_COLORS.len()]
    }
}

/// Serialize a round snapshot into an SVG document string.
///
/// `node_radius` is the drawn radius of original nodes; junctions are
/// drawn at a fraction of it. `preview` adds the dashed drag line.
///
/// The root element carries `data-state` and `data-total-length`
/// attributes so tools can inspect a render without parsing geometry.
///
/// # Examples
///
/// ```
/// use dotlink_engine::{Bounds, Engine, Point, PointStore, RoundSnapshot, WinRule};
/// use dotlink_export::{SvgMetadata, to_svg};
/// use std::time::Duration;
///
/// let store = PointStore::with_originals([Point::new(10.0, 10.0), Point::new(90.0, 10.0)]);
/// let mut engine = Engine::new(store, 7.5, WinRule::OriginalNodes);
/// engine.add_segment(Point::new(10.0, 10.0), Point::new(90.0, 10.0)).unwrap();
/// let snapshot = RoundSnapshot::capture(&engine, Duration::from_secs(3));
///
/// let metadata = SvgMetadata {
///     title: Some("round 1"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&snapshot, Bounds::new(100.0, 50.0), 5.0, &metadata, None);
/// assert!(svg.contains("<title>round 1</title>"));
/// assert!(svg.contains(r#"data-state="won""#));
/// assert_eq!(svg.matches("<circle").count(), 2);
/// ```
#[must_use]
pub fn to_svg(
    snapshot: &RoundSnapshot,
    bounds: Bounds,
    node_radius: f64,
    metadata: &SvgMetadata<'_>,
    preview: Option<&DragPreview>,
) -> String {
    let mut doc = Document::new()
        .set("width", bounds.width)
        .set("height", bounds.height)
        .set("viewBox", (0.0, 0.0, bounds.width, bounds.height))
        .set("data-state", state_name(snapshot.state))
        .set("data-total-length", snapshot.total_length);

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("dotlink:config");
        config_el.assign("xmlns:dotlink", "urn:dotlink:1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    doc = doc.add(
        Rectangle::new()
            .set("width", bounds.width)
            .set("height", bounds.height)
            .set("fill", "white"),
    );

    let label_of = |id: dotlink_engine::NodeId| {
        snapshot
            .nodes
            .get(id.index())
            .map_or(0, |node| node.component)
    };

    let mut segments = Group::new()
        .set("id", "segments")
        .set("stroke-width", node_radius * STROKE_SCALE)
        .set("stroke-linecap", "round");
    for segment in &snapshot.segments {
        segments = segments.add(
            Line::new()
                .set("x1", segment.from.x)
                .set("y1", segment.from.y)
                .set("x2", segment.to.x)
                .set("y2", segment.to.y)
                .set("stroke", component_color(label_of(segment.start), snapshot.state)),
        );
    }
    doc = doc.add(segments);

    let mut nodes = Group::new().set("id", "nodes");
    for node in &snapshot.nodes {
        let r = match node.kind {
            NodeKind::Original => node_radius,
            NodeKind::Junction => node_radius * JUNCTION_SCALE,
        };
        nodes = nodes.add(
            Circle::new()
                .set("cx", node.position.x)
                .set("cy", node.position.y)
                .set("r", r)
                .set("fill", component_color(node.component, snapshot.state))
                .set("data-node", node.id.index())
                .set("data-kind", kind_name(node.kind)),
        );
    }
    doc = doc.add(nodes);

    if let Some(preview) = preview {
        doc = doc.add(
            Group::new().set("id", "preview").add(
                Line::new()
                    .set("x1", preview.from.x)
                    .set("y1", preview.from.y)
                    .set("x2", preview.to.x)
                    .set("y2", preview.to.y)
                    .set("stroke", "gray")
                    .set("stroke-width", node_radius * STROKE_SCALE)
                    .set("stroke-dasharray", "4 4"),
            ),
        );
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

const fn state_name(state: EngineState) -> &'static str {
    match state {
        EngineState::Idle => "idle",
        EngineState::InProgress => "in_progress",
        EngineState::Won => "won",
    }
}

const fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Original => "original",
        NodeKind::Junction => "junction",
    }
}
