pub mod viewer_state;
