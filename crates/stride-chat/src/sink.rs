use crate::phase::Effect;

/// Presentation side of the chat: a DOM widget, a terminal, a test recorder.
///
/// The state machine calls exactly these methods and nothing else. Every
/// hide call is preceded by the matching show call.
pub trait RenderSink: Send {
    fn render_user_message(&mut self, text: &str);

    fn show_loading(&mut self);

    fn hide_loading(&mut self);

    fn show_thinking(&mut self);

    fn hide_thinking(&mut self);

    /// Create the assistant message on first call, replace its content on
    /// later calls. `accumulated` only ever grows within one response.
    fn upsert_assistant_message(&mut self, accumulated: &str);

    fn render_error(&mut self, text: &str);

    /// Disable the send control while a request is in flight.
    /// Sinks without an input control ignore this.
    fn set_input_enabled(&mut self, _enabled: bool) {}
}

impl Effect {
    pub fn apply_to<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Effect::RenderUserMessage(text) => sink.render_user_message(text),
            Effect::ShowLoading => sink.show_loading(),
            Effect::HideLoading => sink.hide_loading(),
            Effect::ShowThinking => sink.show_thinking(),
            Effect::HideThinking => sink.hide_thinking(),
            Effect::UpsertAssistantMessage(text) => sink.upsert_assistant_message(text),
            Effect::RenderError(text) => sink.render_error(text),
        }
    }
}
