use glam::DVec3;

use super::frame::{FramePhase, FrameTime};
use super::input::{ActionStates, InputAction};
use super::overlay::MinimapModel;
use crate::animation::RoomBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Reset,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    reset_pressed: bool,
    overlay_toggle_pressed: bool,
    actions: ActionStates,
    look_delta: f64,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        reset_pressed: bool,
        overlay_toggle_pressed: bool,
        actions: ActionStates,
        look_delta: f64,
    ) -> Self {
        Self {
            quit_requested,
            reset_pressed,
            overlay_toggle_pressed,
            actions,
            look_delta,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn reset_pressed(&self) -> bool {
        self.reset_pressed
    }

    pub fn overlay_toggle_pressed(&self) -> bool {
        self.overlay_toggle_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Horizontal look input in radians accumulated since the last frame.
    pub fn look_delta(&self) -> f64 {
        self.look_delta
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_reset_pressed(mut self, reset_pressed: bool) -> Self {
        self.reset_pressed = reset_pressed;
        self
    }

    pub fn with_overlay_toggle_pressed(mut self, pressed: bool) -> Self {
        self.overlay_toggle_pressed = pressed;
        self
    }

    pub fn with_look_delta(mut self, look_delta: f64) -> Self {
        self.look_delta = look_delta;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Handle to a named sub-part of one entity, captured when the entity is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub usize);

/// Handle to one material slot of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Position, Euler rotation (x = pitch, y = yaw, z = roll) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.rotation.y = yaw;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Visitor,
    Guard,
    Warden,
    Robot,
    SecurityCamera,
    Bird,
    Butterfly,
    Fish,
    Jellyfish,
    Sculpture,
    Exhibit,
    Artwork,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: &'static str,
    pub transform: Transform,
    pub visible: bool,
}

/// Per-material values fed to the host's shader program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderUniformState {
    pub time: f64,
    pub emissive_intensity: f64,
    pub opacity: f64,
    dirty: bool,
}

impl Default for ShaderUniformState {
    fn default() -> Self {
        Self {
            time: 0.0,
            emissive_intensity: 0.0,
            opacity: 1.0,
            dirty: false,
        }
    }
}

impl ShaderUniformState {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Host-side acknowledgement after uploading the values.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: &'static str,
    pub uniforms: ShaderUniformState,
}

/// Builder for an entity and its named parts and materials.
#[derive(Debug, Clone)]
pub struct EntityDesc {
    kind: EntityKind,
    debug_name: &'static str,
    transform: Transform,
    parts: Vec<Part>,
    materials: Vec<Material>,
}

impl EntityDesc {
    pub fn new(kind: EntityKind, debug_name: &'static str, transform: Transform) -> Self {
        Self {
            kind,
            debug_name,
            transform,
            parts: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn add_part(&mut self, name: &'static str, transform: Transform) -> PartId {
        self.parts.push(Part {
            name,
            transform,
            visible: true,
        });
        PartId(self.parts.len() - 1)
    }

    pub fn add_hidden_part(&mut self, name: &'static str, transform: Transform) -> PartId {
        let id = self.add_part(name, transform);
        self.parts[id.0].visible = false;
        id
    }

    pub fn add_material(&mut self, name: &'static str, uniforms: ShaderUniformState) -> MaterialId {
        self.materials.push(Material { name, uniforms });
        MaterialId(self.materials.len() - 1)
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub debug_name: &'static str,
    pub transform: Transform,
    pub visible: bool,
    parts: Vec<Part>,
    materials: Vec<Material>,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id.0)
    }

    pub fn find_part(&self, name: &str) -> Option<PartId> {
        self.parts.iter().position(|part| part.name == name).map(PartId)
    }

    pub fn set_part_rotation_x(&mut self, id: PartId, angle: f64) {
        if let Some(part) = self.part_mut(id) {
            part.transform.rotation.x = angle;
        }
    }

    pub fn set_part_rotation_y(&mut self, id: PartId, angle: f64) {
        if let Some(part) = self.part_mut(id) {
            part.transform.rotation.y = angle;
        }
    }

    pub fn set_part_rotation_z(&mut self, id: PartId, angle: f64) {
        if let Some(part) = self.part_mut(id) {
            part.transform.rotation.z = angle;
        }
    }

    pub fn set_part_visible(&mut self, id: PartId, visible: bool) {
        if let Some(part) = self.part_mut(id) {
            part.visible = visible;
        }
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

pub const PLAYER_EYE_HEIGHT: f64 = 1.6;

/// First-person viewpoint. AI and wildlife read it; only the camera phase
/// writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerCamera {
    pub position: DVec3,
    pub yaw: f64,
    pub velocity: DVec3,
}

impl Default for PlayerCamera {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, PLAYER_EYE_HEIGHT, 8.0),
            yaw: std::f64::consts::PI,
            velocity: DVec3::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    player: PlayerCamera,
    room: RoomBounds,
    minimap: MinimapModel,
}

impl SceneWorld {
    pub fn with_room(room: RoomBounds) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }

    /// Queues an entity; it becomes visible after the next [`Self::apply_pending`].
    pub fn spawn(&mut self, desc: EntityDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            kind: desc.kind,
            debug_name: desc.debug_name,
            transform: desc.transform,
            visible: true,
            parts: desc.parts,
            materials: desc.materials,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_spawns
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    /// Drops every entity and restores the player start. Room bounds and the
    /// id allocator survive, so stale ids never alias new entities.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.player = PlayerCamera::default();
        self.minimap.clear_markers();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |entity| entity.kind == kind)
    }

    pub fn player(&self) -> &PlayerCamera {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerCamera {
        &mut self.player
    }

    pub fn room(&self) -> RoomBounds {
        self.room
    }

    pub fn set_room(&mut self, room: RoomBounds) {
        self.room = room;
    }

    pub fn minimap(&self) -> &MinimapModel {
        &self.minimap
    }

    pub fn minimap_mut(&mut self) -> &mut MinimapModel {
        &mut self.minimap
    }

    /// Rebuilds the minimap markers from the current entities and player.
    pub fn refresh_minimap(&mut self) {
        self.minimap.refresh_from(&self.entities, &self.player, self.room);
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    /// Called once per phase per frame, in [`super::FRAME_PHASE_ORDER`].
    fn update_phase(
        &mut self,
        phase: FramePhase,
        frame: &FrameTime,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    );
    fn render(&mut self, _world: &SceneWorld) {}
    fn unload(&mut self, world: &mut SceneWorld);
    fn command(&mut self, input: &InputSnapshot, _world: &SceneWorld) -> SceneCommand {
        if input.quit_requested() {
            SceneCommand::Quit
        } else if input.reset_pressed() {
            SceneCommand::Reset
        } else {
            SceneCommand::None
        }
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>, world: SceneWorld) -> Self {
        Self {
            scene,
            world,
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub(crate) fn update_phase(
        &mut self,
        phase: FramePhase,
        frame: &FrameTime,
        input: &InputSnapshot,
    ) {
        self.scene
            .update_phase(phase, frame, input, &mut self.world);
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn render(&mut self) {
        self.scene.render(&self.world);
    }

    pub(crate) fn command(&mut self, input: &InputSnapshot) -> SceneCommand {
        self.scene.command(input, &self.world)
    }

    pub(crate) fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.is_loaded
    }
}
