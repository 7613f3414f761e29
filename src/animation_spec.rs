use crate::models::AnimationType;

/// Default frame count and playback rate for an animation category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    pub total_frames: usize,
    pub fps: f64,
}

pub const DEFAULT_ANIMATION_TYPE: AnimationType = AnimationType::Idle;

pub fn resolve(kind: AnimationType) -> AnimationSpec {
    let (total_frames, fps) = match kind {
        AnimationType::Idle => (4, 4.0),
        AnimationType::Walk => (8, 8.0),
        AnimationType::Run => (8, 12.0),
        AnimationType::Jump => (6, 8.0),
        AnimationType::Attack => (6, 10.0),
        AnimationType::Spin => (8, 10.0),
        AnimationType::Bounce => (6, 8.0),
        AnimationType::Pulse => (6, 6.0),
        AnimationType::Wave => (6, 6.0),
    };
    AnimationSpec { total_frames, fps }
}
