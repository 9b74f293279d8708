const PLAYER_MOVE_SPEED: f64 = 5.0;
const PLAYER_VELOCITY_DECAY: f64 = 10.0;
const PLAYER_TURN_SPEED: f64 = 2.0;
const PLAYER_WALL_MARGIN: f64 = 0.5;

/// Unit wish direction on the floor plane from the held movement keys.
fn movement_intent(input: &InputSnapshot, yaw: f64) -> DVec3 {
    let forward = forward_from_yaw(yaw);
    let right = DVec3::new(-forward.z, 0.0, forward.x);
    let mut intent = DVec3::ZERO;
    if input.is_down(InputAction::MoveForward) {
        intent += forward;
    }
    if input.is_down(InputAction::MoveBackward) {
        intent -= forward;
    }
    if input.is_down(InputAction::StrafeRight) {
        intent += right;
    }
    if input.is_down(InputAction::StrafeLeft) {
        intent -= right;
    }
    intent.normalize_or_zero()
}

fn turn_intent(input: &InputSnapshot) -> f64 {
    let mut turn = 0.0;
    if input.is_down(InputAction::TurnLeft) {
        turn += 1.0;
    }
    if input.is_down(InputAction::TurnRight) {
        turn -= 1.0;
    }
    turn
}

/// First-person walk: accelerate toward the wish direction, bleed velocity
/// off exponentially, keep the eye height fixed and stay inside the walls.
fn update_player(camera: &mut PlayerCamera, input: &InputSnapshot, dt: f64, room: RoomBounds) {
    if dt <= 0.0 {
        return;
    }

    camera.yaw += turn_intent(input) * PLAYER_TURN_SPEED * dt + input.look_delta();

    let acceleration =
        movement_intent(input, camera.yaw) * PLAYER_MOVE_SPEED * PLAYER_VELOCITY_DECAY;
    camera.velocity += acceleration * dt;
    camera.velocity *= (-PLAYER_VELOCITY_DECAY * dt).exp();
    camera.velocity.y = 0.0;

    let (limit_x, limit_z) = player_bounds(room);
    let next = camera.position + camera.velocity * dt;
    camera.position = DVec3::new(
        next.x.clamp(-limit_x, limit_x),
        PLAYER_EYE_HEIGHT,
        next.z.clamp(-limit_z, limit_z),
    );
}

/// Furthest the player may stand from the room centre on each floor axis.
fn player_bounds(room: RoomBounds) -> (f64, f64) {
    (
        (room.half_width() - PLAYER_WALL_MARGIN).max(0.0),
        (room.half_depth() - PLAYER_WALL_MARGIN).max(0.0),
    )
}

/// Default camera, pulled inside the walls of `room`.
fn start_camera(room: RoomBounds) -> PlayerCamera {
    let mut camera = PlayerCamera::default();
    let (limit_x, limit_z) = player_bounds(room);
    camera.position.x = camera.position.x.clamp(-limit_x, limit_x);
    camera.position.z = camera.position.z.clamp(-limit_z, limit_z);
    camera
}
