struct GalleryScene {
    config: GalleryConfig,
    animator: Animator,
    handles: GalleryHandles,
}

impl GalleryScene {
    fn new(config: GalleryConfig) -> Self {
        let animator = Animator::new(config.seed);
        Self {
            config,
            animator,
            handles: GalleryHandles::default(),
        }
    }

    fn ai_state(&self, handle: Option<BehaviorHandle>) -> Option<AiState> {
        handle
            .and_then(|handle| self.animator.get(handle))
            .and_then(Behavior::ai_state)
    }
}

impl Scene for GalleryScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.animator.clear();
        world.set_room(self.config.room);
        *world.player_mut() = start_camera(self.config.room);

        match spawn_gallery(&self.config, world, &mut self.animator) {
            Ok(handles) => self.handles = handles,
            Err(err) => {
                error!(error = %err, "gallery_layout_failed");
                self.handles = GalleryHandles::default();
            }
        }

        info!(
            seed = self.animator.seed(),
            behaviors = self.animator.len(),
            "gallery_loaded"
        );
    }

    fn update_phase(
        &mut self,
        phase: FramePhase,
        frame: &FrameTime,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) {
        match phase {
            FramePhase::Camera => {
                let room = world.room();
                update_player(world.player_mut(), input, frame.delta_seconds, room);
            }
            FramePhase::Overlay => {
                if input.overlay_toggle_pressed() {
                    let visible = world.minimap_mut().toggle_visible();
                    debug!(visible, "minimap_toggled");
                }
                world.refresh_minimap();
            }
            FramePhase::Actors | FramePhase::Wildlife | FramePhase::Ai | FramePhase::Uniforms => {
                self.animator.run_phase(phase, frame, world);
            }
        }
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.animator.clear();
        self.handles = GalleryHandles::default();
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        Some(format!(
            "Gallery | guard: {} | warden: {} | greeter: {} | entities: {}",
            ai_state_label(self.ai_state(self.handles.guard)),
            ai_state_label(self.ai_state(self.handles.warden)),
            ai_state_label(self.ai_state(self.handles.greeter)),
            world.entity_count()
        ))
    }
}

fn ai_state_label(state: Option<AiState>) -> &'static str {
    match state {
        None => "-",
        Some(AiState::Idle) => "idle",
        Some(AiState::Walking) => "walking",
        Some(AiState::Observing) => "observing",
        Some(AiState::Fleeing) => "fleeing",
        Some(AiState::Patrol) => "patrol",
        Some(AiState::Alert) => "alert",
        Some(AiState::Chasing) => "chasing",
        Some(AiState::Warning) => "warning",
        Some(AiState::Conversing) => "conversing",
        Some(AiState::Waving) => "waving",
    }
}
