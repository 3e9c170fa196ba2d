//! Boundary to the rendering layer.
//!
//! The engine never touches a visual tree directly. It hands markup to a
//! [`Surface`] and keeps the opaque [`ContainerId`] / [`ViewHandle`] values
//! it gets back. [`MemorySurface`] is an in-memory implementation used by
//! the binary and the tests.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::holder::HolderKey;

/// Opaque handle to a visual container that alerts are inserted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId(pub u64);

/// Opaque handle to one inserted alert view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViewHandle(pub u64);

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Rendering collaborator.
///
/// All calls happen on the engine's single thread of control. Removal
/// calls on a view that is already gone must be no-ops.
pub trait Surface {
    /// Existing alert containers inside `key`, in document order.
    fn find_containers(&self, key: &HolderKey) -> Vec<ContainerId>;

    /// Create an alert container inside `key`.
    fn create_container(&mut self, key: &HolderKey) -> ContainerId;

    /// Insert alert markup into a container with a fade-in.
    fn insert(&mut self, container: ContainerId, markup: &str, fade_in: Duration) -> ViewHandle;

    /// Fade the view out, then remove it.
    fn fade_out_and_remove(&mut self, view: ViewHandle, fade_out: Duration);

    /// Remove the view immediately.
    fn remove(&mut self, view: ViewHandle);

    /// Apply a class that the rendering layer drops again when its
    /// animation ends.
    fn apply_transient_class(&mut self, view: ViewHandle, class: &str);
}

/// Calls recorded by [`MemorySurface`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    ContainerCreated { container: ContainerId, key: String },
    Inserted { container: ContainerId, view: ViewHandle, fade_in_ms: u128 },
    FadedOut { view: ViewHandle, fade_out_ms: u128 },
    Removed { view: ViewHandle },
    TransientClass { view: ViewHandle, class: String },
}

#[derive(Debug, Clone)]
struct Node {
    view: ViewHandle,
    markup: String,
}

#[derive(Debug, Clone)]
struct Container {
    id: ContainerId,
    key: HolderKey,
    nodes: Vec<Node>,
}

/// In-memory visual tree.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next_id: u64,
    containers: Vec<Container>,
    events: Vec<SurfaceEvent>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a container that already exists in the page, without logging
    /// a creation event.
    pub fn seed_container(&mut self, key: HolderKey) -> ContainerId {
        let id = ContainerId(self.next());
        self.containers.push(Container {
            id,
            key,
            nodes: Vec::new(),
        });
        id
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Number of alert views currently in the tree.
    pub fn view_count(&self) -> usize {
        self.containers.iter().map(|c| c.nodes.len()).sum()
    }

    /// Markup of the views in one container, in insertion order.
    pub fn markup(&self, container: ContainerId) -> Vec<&str> {
        self.containers
            .iter()
            .find(|c| c.id == container)
            .map(|c| c.nodes.iter().map(|n| n.markup.as_str()).collect())
            .unwrap_or_default()
    }

    /// Markup of every container, keyed by the container's holder key.
    pub fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        self.containers
            .iter()
            .map(|c| {
                (
                    c.key.to_string(),
                    c.nodes.iter().map(|n| n.markup.clone()).collect(),
                )
            })
            .collect()
    }

    fn detach(&mut self, view: ViewHandle) -> bool {
        for container in &mut self.containers {
            if let Some(pos) = container.nodes.iter().position(|n| n.view == view) {
                container.nodes.remove(pos);
                return true;
            }
        }
        false
    }
}

impl Surface for MemorySurface {
    fn find_containers(&self, key: &HolderKey) -> Vec<ContainerId> {
        self.containers
            .iter()
            .filter(|c| &c.key == key)
            .map(|c| c.id)
            .collect()
    }

    fn create_container(&mut self, key: &HolderKey) -> ContainerId {
        let id = self.seed_container(key.clone());
        self.events.push(SurfaceEvent::ContainerCreated {
            container: id,
            key: key.to_string(),
        });
        id
    }

    fn insert(&mut self, container: ContainerId, markup: &str, fade_in: Duration) -> ViewHandle {
        let view = ViewHandle(self.next());
        match self.containers.iter_mut().find(|c| c.id == container) {
            Some(c) => c.nodes.push(Node {
                view,
                markup: markup.to_string(),
            }),
            None => {
                tracing::warn!(container = container.0, "Insert into unknown container ignored");
            }
        }
        self.events.push(SurfaceEvent::Inserted {
            container,
            view,
            fade_in_ms: fade_in.as_millis(),
        });
        view
    }

    fn fade_out_and_remove(&mut self, view: ViewHandle, fade_out: Duration) {
        if self.detach(view) {
            self.events.push(SurfaceEvent::FadedOut {
                view,
                fade_out_ms: fade_out.as_millis(),
            });
        }
    }

    fn remove(&mut self, view: ViewHandle) {
        if self.detach(view) {
            self.events.push(SurfaceEvent::Removed { view });
        }
    }

    fn apply_transient_class(&mut self, view: ViewHandle, class: &str) {
        self.events.push(SurfaceEvent::TransientClass {
            view,
            class: class.to_string(),
        });
    }
}
