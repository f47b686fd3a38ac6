use distance_tracker_lib::{
    status::{Locale, StatusMessage, UiText},
    tracking_session::SessionSnapshot,
};
use yew::prelude::*;

#[derive(PartialEq, Properties, Clone)]
pub struct TrackerPanelProps {
    pub snapshot: SessionSnapshot,
    pub status: Option<StatusMessage>,
    pub locale: Locale,
    pub on_toggle: Callback<()>,
    pub on_reset: Callback<()>,
}

#[function_component]
pub fn TrackerPanel(props: &TrackerPanelProps) -> Html {
    let locale = props.locale;
    let snapshot = props.snapshot;

    let on_toggle = props.on_toggle.clone();
    let toggle = Callback::from(move |_: MouseEvent| on_toggle.emit(()));

    let on_reset = props.on_reset.clone();
    let reset = Callback::from(move |_: MouseEvent| on_reset.emit(()));

    let (toggle_label, toggle_class) = if snapshot.is_active() {
        (UiText::StopButton.text(locale), classes!("toggle-btn", "tracking"))
    } else {
        (UiText::StartButton.text(locale), classes!("toggle-btn"))
    };

    html! {
        <div class="tracker component-container">
            <div class="readout">
                <label>{UiText::DistanceLabel.text(locale)}</label>
                <span id="distance">{snapshot.distance_label()}</span>
            </div>
            <div class="readout">
                <label>{UiText::SpeedLabel.text(locale)}</label>
                <span id="speed">{snapshot.speed_kmh}</span>
            </div>
            <p id="status">{props.status.map(|message| message.text(locale)).unwrap_or_default()}</p>
            <div class="controls">
                <button id="toggleBtn" class={toggle_class} onclick={toggle}>{toggle_label}</button>
                <button id="resetBtn" class="reset-btn" onclick={reset}>{UiText::ResetButton.text(locale)}</button>
            </div>
        </div>
    }
}

#[derive(PartialEq, Properties, Clone)]
pub struct UnsupportedProps {
    pub locale: Locale,
}

#[function_component]
pub fn Unsupported(props: &UnsupportedProps) -> Html {
    html! {
        <div class="tracker component-container">
            <p id="status">{UiText::GeolocationUnsupported.text(props.locale)}</p>
        </div>
    }
}
