pub mod events;
pub mod frames;
pub mod gameplay;
pub mod judgment;
pub mod life;
pub mod note_lock;
pub mod state;
pub mod target;
pub mod target_index;
pub mod time_machine;
pub mod timing_stats;
pub mod timing_windows;
