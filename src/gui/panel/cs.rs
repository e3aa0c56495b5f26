use iced::{Alignment, Command, Element, Length};
use iced::theme;
use iced::widget::scrollable::{self, RelativeOffset};
use iced::widget::{button, column, row, text, toggler};
use log::{debug, error};

use crate::bridge::client::BackendClient;
use crate::gui::activity_log::{log_view, ActivityLog};
use crate::gui::strength_input::StrengthInput;
use crate::gui::types::{CsMessage, Message};

/**
 * Counter-Strike game state integration. The backend runs the actual
 * listener; this panel toggles it, mirrors the two strength settings, and
 * tails whatever the listener reports over the `cs-rust-event` channel.
 */
pub struct CsPanel {
    enabled: bool,
    shock_strength: StrengthInput,
    vibrate_strength: StrengthInput,
    log: ActivityLog,
    log_scroll: scrollable::Id,
}

impl CsPanel {
    pub fn new() -> CsPanel {
        CsPanel {
            enabled: false,
            shock_strength: StrengthInput::new(),
            vibrate_strength: StrengthInput::new(),
            log: ActivityLog::new(),
            log_scroll: scrollable::Id::unique(),
        }
    }

    /// Appends a line to the feed and snaps the scrollable to the newest
    /// entry. Called for every `cs-rust-event` the backend publishes.
    pub fn append_activity(&mut self, message: String) -> Command<Message> {
        self.log.append(message);
        scrollable::snap_to(self.log_scroll.clone(), RelativeOffset::END)
    }

    fn send_listener_toggle(&self, client: &BackendClient, start: bool) -> Command<Message> {
        let client = client.clone();

        let fut = async move {
            match client.start_cs_listener(start).await {
                Ok(()) => debug!("start_cs_listener({}) acknowledged", start),
                Err(err) => error!("start_cs_listener failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    fn send_create_config(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();

        let fut = async move {
            match client.create_cs_config().await {
                Ok(()) => debug!("create_cs_config acknowledged"),
                Err(err) => error!("create_cs_config failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    fn send_shock_strength(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();
        let strength = self.shock_strength.committed();

        let fut = async move {
            match client.set_shock_strength(strength).await {
                Ok(()) => debug!("set_shock_strength({}) acknowledged", strength),
                Err(err) => error!("set_shock_strength failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    fn send_vibrate_strength(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();
        let strength = self.vibrate_strength.committed();

        let fut = async move {
            match client.set_vibrate_strength(strength).await {
                Ok(()) => debug!("set_vibrate_strength({}) acknowledged", strength),
                Err(err) => error!("set_vibrate_strength failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    pub fn update(&mut self, message: CsMessage, client: Option<&BackendClient>) -> Command<Message> {
        match message {
            CsMessage::ListenerToggled(enabled) => {
                self.enabled = enabled;
                match client {
                    Some(client) => return self.send_listener_toggle(client, enabled),
                    None => error!("start_cs_listener({}) dropped, backend is not connected", enabled),
                }
            },
            CsMessage::SetupConfigPressed => {
                match client {
                    Some(client) => return self.send_create_config(client),
                    None => error!("create_cs_config dropped, backend is not connected"),
                }
            },
            CsMessage::ShockStrengthEdited(value) => {
                self.shock_strength.edit(value);
            },
            CsMessage::ShockStrengthCommitted => {
                // the commit is forwarded even when it reset to the default
                self.shock_strength.commit();
                match client {
                    Some(client) => return self.send_shock_strength(client),
                    None => error!("set_shock_strength dropped, backend is not connected"),
                }
            },
            CsMessage::VibrateStrengthEdited(value) => {
                self.vibrate_strength.edit(value);
            },
            CsMessage::VibrateStrengthCommitted => {
                self.vibrate_strength.commit();
                match client {
                    Some(client) => return self.send_vibrate_strength(client),
                    None => error!("set_vibrate_strength dropped, backend is not connected"),
                }
            },
        }

        Command::none()
    }

    pub fn view(&self, connected: bool) -> Element<CsMessage> {
        let mut setup_button = button(text("Create game state config")).style(theme::Button::Secondary);
        if connected {
            setup_button = setup_button.on_press(CsMessage::SetupConfigPressed);
        }

        column![
            toggler(
                Some("Listen for game events".to_string()),
                self.enabled,
                CsMessage::ListenerToggled,
            ).width(Length::Shrink),

            row![
                self.shock_strength.view(
                    "Shock strength",
                    connected,
                    CsMessage::ShockStrengthEdited,
                    CsMessage::ShockStrengthCommitted,
                ),
                self.vibrate_strength.view(
                    "Vibrate strength",
                    connected,
                    CsMessage::VibrateStrengthEdited,
                    CsMessage::VibrateStrengthCommitted,
                ),
            ].spacing(30),

            setup_button,

            log_view(&self.log, self.log_scroll.clone()),
        ]
        .align_items(Alignment::Center)
        .spacing(20)
        .width(Length::Fill)
        .into()
    }
}

impl Default for CsPanel {
    fn default() -> Self {
        CsPanel::new()
    }
}
