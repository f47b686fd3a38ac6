use distance_tracker_lib::{providers::Renderer, status::StatusMessage, tracking_session::SessionSnapshot};
use yew::Callback;

/// Hands every update back to the component as a message, so it is applied
/// after the session method that produced it has finished.
pub struct CallbackRenderer {
    pub on_state: Callback<SessionSnapshot>,
    pub on_status: Callback<StatusMessage>,
}

impl Renderer for CallbackRenderer {
    fn render_state(&mut self, snapshot: SessionSnapshot) {
        self.on_state.emit(snapshot);
    }

    fn render_status_message(&mut self, message: StatusMessage) {
        self.on_status.emit(message);
    }
}
