use crate::controller::{TickStatus, ViewportController, wheel_zoom_factor};
use crate::settings::ViewSettings;
use crate::transform::{ViewportSize, ViewportTransform};
use clantree_core::{
    FocusError, Gender, HierarchyError, MemberId, MemberRecord, normalize_portrait_path,
};
use clantree_events::{Event, EventBus};
use clantree_graph::{
    EdgeRouter, HierarchyBuilder, HitTester, Layouter, PositionedTree, Rect, RoutedEdge,
    TidyTreeLayouter, Vec2,
};
use serde::Serialize;
use std::time::Duration;

/// Pointer input in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    Leave,
    Wheel { pos: Vec2, factor: f32 },
}

impl PointerEvent {
    /// Wheel event from a raw vertical scroll delta.
    pub fn wheel_delta(pos: Vec2, delta_y: f32) -> Self {
        PointerEvent::Wheel {
            pos,
            factor: wheel_zoom_factor(delta_y),
        }
    }
}

/// One node card ready to draw.
#[derive(Debug, Clone, Serialize)]
pub struct NodeCard<'a> {
    pub id: &'a MemberId,
    pub position: Vec2,
    pub name: &'a str,
    pub gender: Gender,
    pub generation: i32,
    pub generation_name: &'a str,
    pub spouse_name: Option<&'a str>,
    pub life_span: Option<String>,
    pub portrait: Option<String>,
    pub selected: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame<'a> {
    pub nodes: Vec<NodeCard<'a>>,
    pub edges: &'a [RoutedEdge],
    pub transform: ViewportTransform,
    pub card_size: Vec2,
}

/// The laid-out, routed and hit-testable form of one snapshot.
struct Scene {
    tree: PositionedTree,
    edges: Vec<RoutedEdge>,
    hit_tester: HitTester,
}

impl Scene {
    fn empty(card_size: Vec2) -> Self {
        Self {
            tree: PositionedTree::default(),
            edges: Vec::new(),
            hit_tester: HitTester::new(card_size),
        }
    }
}

/// Interactive family-tree diagram: snapshot in, render frame and events out.
///
/// A rejected snapshot never replaces the one on screen.
pub struct TreeView {
    settings: ViewSettings,
    layouter: TidyTreeLayouter,
    scene: Scene,
    controller: ViewportController,
    events: EventBus,
    pressed_node: Option<MemberId>,
    selected: Option<MemberId>,
}

impl TreeView {
    pub fn new(settings: ViewSettings, viewport: ViewportSize) -> Self {
        let settings = settings.sanitized();
        Self {
            layouter: settings.layouter(),
            scene: Scene::empty(settings.card_size()),
            controller: ViewportController::new(settings.controller_config(), viewport),
            events: EventBus::new(),
            pressed_node: None,
            selected: None,
            settings,
        }
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn tree(&self) -> &PositionedTree {
        &self.scene.tree
    }

    pub fn edges(&self) -> &[RoutedEdge] {
        &self.scene.edges
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewportController {
        &mut self.controller
    }

    pub fn transform(&self) -> ViewportTransform {
        self.controller.transform()
    }

    pub fn selected(&self) -> Option<&MemberId> {
        self.selected.as_ref()
    }

    /// Build, lay out and route a new snapshot, replacing the current one.
    ///
    /// On error the previous snapshot stays in place and a
    /// [`Event::SnapshotRejected`] is published.
    pub fn apply_snapshot(&mut self, records: &[MemberRecord]) -> Result<usize, HierarchyError> {
        let hierarchy = match HierarchyBuilder::build(records) {
            Ok(hierarchy) => hierarchy,
            Err(err) => {
                tracing::warn!("Rejected snapshot of {} records: {}", records.len(), err);
                self.events.publish(Event::SnapshotRejected {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let tree = self.layouter.execute(&hierarchy);
        let edges = EdgeRouter::route_all(&tree);
        let hit_tester = HitTester::from_tree(&tree, self.settings.card_size());
        self.scene = Scene {
            tree,
            edges,
            hit_tester,
        };
        let node_count = self.scene.tree.len();

        let tree = &self.scene.tree;
        if self
            .selected
            .as_ref()
            .is_some_and(|id| tree.get(id.as_str()).is_none())
        {
            self.selected = None;
        }
        self.pressed_node = None;
        self.controller.retarget(&self.scene.tree);

        tracing::info!("Applied snapshot with {} members", node_count);
        self.events.publish(Event::SnapshotApplied { node_count });
        Ok(node_count)
    }

    pub fn resize(&mut self, viewport: ViewportSize) {
        self.controller.resize(viewport);
    }

    /// Route one pointer event. Presses inside a node card are node clicks
    /// and never pan; everything else goes to the viewport controller.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(pos) => {
                self.pressed_node = self.node_at(pos);
                if self.pressed_node.is_none() {
                    self.controller.pointer_down(pos);
                }
            }
            PointerEvent::Move(pos) => {
                if self.pressed_node.is_none() {
                    self.controller.pointer_move(pos);
                }
            }
            PointerEvent::Up(pos) => match self.pressed_node.take() {
                Some(pressed) => {
                    if self.node_at(pos).as_ref() == Some(&pressed) {
                        self.selected = Some(pressed.clone());
                        self.events.publish(Event::NodeClicked { id: pressed });
                    }
                }
                None => {
                    if self.controller.pointer_up(pos) {
                        self.selected = None;
                        self.events.publish(Event::BackgroundClicked);
                    }
                }
            },
            PointerEvent::Leave => {
                self.pressed_node = None;
                self.controller.pointer_leave();
            }
            PointerEvent::Wheel { pos, factor } => self.controller.wheel(pos, factor),
        }
    }

    fn node_at(&self, screen: Vec2) -> Option<MemberId> {
        let layout_pos = self.transform().invert(screen);
        self.scene.hit_tester.hit_test_node(layout_pos).cloned()
    }

    pub fn focus_node(&mut self, id: &str) -> Result<(), FocusError> {
        match self.controller.focus_node(id, &self.scene.tree) {
            Ok(()) => {
                self.events.publish(Event::FocusStarted {
                    id: MemberId::from(id),
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Cannot focus: {}", err);
                self.events.publish(Event::FocusFailed {
                    id: MemberId::from(id),
                });
                Err(err)
            }
        }
    }

    pub fn tick(&mut self, dt: Duration) -> TickStatus {
        let status = self.controller.tick(dt);
        if let TickStatus::Finished(id) = &status {
            self.events.publish(Event::FocusCompleted { id: id.clone() });
        }
        status
    }

    pub fn reset_view(&mut self) {
        self.controller.reset();
    }

    pub fn zoom_in(&mut self) {
        self.controller.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.controller.zoom_out();
    }

    pub fn zoom_reset(&mut self) {
        self.controller.zoom_reset();
    }

    /// Fit the whole tree, cards included, into the viewport.
    pub fn zoom_to_fit(&mut self, padding: f32) {
        let Some(bounds) = self.scene.tree.bounds() else {
            return;
        };
        let card = self.settings.card_size();
        let bounds = Rect::from_min_max(
            bounds.min - card * 0.5,
            bounds.max + card * 0.5,
        );
        self.controller.zoom_to_fit(bounds, padding);
    }

    /// Set the selection directly. Unknown ids are rejected.
    pub fn select(&mut self, id: &str) -> Result<(), FocusError> {
        let node = self
            .scene
            .tree
            .get(id)
            .ok_or_else(|| FocusError::NodeNotFound(MemberId::from(id)))?;
        self.selected = Some(node.id().clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Members whose name contains `query`, ignoring case, in pre-order.
    pub fn search(&self, query: &str) -> Vec<MemberId> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.scene
            .tree
            .descendants()
            .filter(|node| node.record.name.to_lowercase().contains(&query))
            .map(|node| node.id().clone())
            .collect()
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        let nodes = self
            .scene
            .tree
            .descendants()
            .map(|node| {
                let record = &node.record;
                NodeCard {
                    id: &record.id,
                    position: node.position,
                    name: &record.name,
                    gender: record.gender,
                    generation: record.generation,
                    generation_name: &record.generation_name,
                    spouse_name: record.spouse_name.as_deref(),
                    life_span: record.life_span(),
                    portrait: record
                        .portrait_path
                        .as_deref()
                        .and_then(normalize_portrait_path),
                    selected: self.selected.as_ref() == Some(&record.id),
                }
            })
            .collect();

        RenderFrame {
            nodes,
            edges: &self.scene.edges,
            transform: self.transform(),
            card_size: self.settings.card_size(),
        }
    }
}
