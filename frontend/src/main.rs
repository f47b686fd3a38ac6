use components::tracker_panel::{TrackerPanel, Unsupported};
use distance_tracker_lib::{
    config::TrackerConfig,
    providers::{LocationEvent, SubscriptionHandle},
    status::{Locale, StatusMessage, UiText},
    tracking_session::{Collaborators, SessionSnapshot, TrackingSession},
};
use gloo_console::{error, info};
use gloo_utils::window;
use yew::prelude::*;

use crate::{
    web_haptics::WebVibration, web_location::WebLocationProvider, web_renderer::CallbackRenderer,
    web_storage::LocalDistanceStore, web_wake_lock::WebWakeLock,
};

mod components;
mod web_haptics;
mod web_location;
mod web_renderer;
mod web_storage;
mod web_wake_lock;

enum MainMsg {
    Toggle,
    Reset,
    Location(SubscriptionHandle, LocationEvent),
    Render(SessionSnapshot),
    Status(StatusMessage),
}

struct Model {
    /// None when the browser can't provide locations at all.
    session: Option<TrackingSession>,
    snapshot: SessionSnapshot,
    status: Option<StatusMessage>,
    locale: Locale,
}

impl Component for Model {
    type Message = MainMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();

        let locale = window()
            .navigator()
            .language()
            .map(|tag| Locale::from_language_tag(&tag))
            .unwrap_or_default();
        let config = TrackerConfig::default().with_locale(locale);

        let on_location = link.callback(|(handle, event)| MainMsg::Location(handle, event));
        let session = match WebLocationProvider::new(on_location) {
            Some(location) => Some(TrackingSession::new(
                config,
                Collaborators {
                    location: Box::new(location),
                    store: Box::new(LocalDistanceStore::new()),
                    keep_awake: Box::new(WebWakeLock::new(link.callback(MainMsg::Status))),
                    haptics: Box::new(WebVibration),
                    renderer: Box::new(CallbackRenderer {
                        on_state: link.callback(MainMsg::Render),
                        on_status: link.callback(MainMsg::Status),
                    }),
                },
            )),
            None => {
                error!("Geolocation API not available");
                None
            }
        };

        let snapshot = session.as_ref().map(TrackingSession::snapshot).unwrap_or_default();

        Self {
            session,
            snapshot,
            status: None,
            locale,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match msg {
            MainMsg::Toggle => {
                session.toggle();
                false
            }
            MainMsg::Reset => {
                let confirmed = window()
                    .confirm_with_message(UiText::ConfirmReset.text(self.locale))
                    .unwrap_or(false);
                if confirmed {
                    info!("Resetting distance");
                    session.reset();
                }
                false
            }
            MainMsg::Location(handle, event) => {
                session.handle_event(handle, event);
                false
            }
            MainMsg::Render(snapshot) => {
                self.snapshot = snapshot;
                true
            }
            MainMsg::Status(message) => {
                self.status = Some(message);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.session.is_none() {
            return html! { <Unsupported locale={self.locale} /> };
        }

        let link = ctx.link();

        html! {
            <TrackerPanel
                snapshot={self.snapshot}
                status={self.status}
                locale={self.locale}
                on_toggle={link.callback(|()| MainMsg::Toggle)}
                on_reset={link.callback(|()| MainMsg::Reset)}
            />
        }
    }
}

fn main() {
    yew::Renderer::<Model>::new().render();
}
