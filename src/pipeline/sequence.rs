use crate::models::LoopMode;

/// Returns the frame order to encode for `loop_mode`.
///
/// Ping-pong appends the inner frames in reverse so the end frames are not held twice:
/// `[A, B, C, D]` becomes `[A, B, C, D, C, B]`. Lists of two or fewer frames are unchanged.
pub fn expand<T: Clone>(frames: Vec<T>, loop_mode: LoopMode) -> Vec<T> {
    match loop_mode {
        LoopMode::Pingpong if frames.len() > 2 => {
            let inner: Vec<T> = frames[1..frames.len() - 1].iter().rev().cloned().collect();
            let mut expanded = frames;
            expanded.extend(inner);
            expanded
        }
        _ => frames,
    }
}
