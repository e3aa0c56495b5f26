use iced::{Alignment, Command, Element, Length};
use iced::theme;
use iced::widget::{button, column, row, text};
use log::{debug, error};

use crate::bridge::client::BackendClient;
use crate::bridge::protocol::ShockerId;
use crate::gui::strength_input::StrengthInput;
use crate::gui::types::{ControlMessage, Message};

/**
 * Manual control: two strength fields and the three direct actions. Always
 * drives the first shocker of the device.
 *
 * Unlike the cs and vrc panels, committing a strength here changes nothing
 * on the backend; the committed value is read at the moment an action
 * button is pressed.
 */
pub struct ControlPanel {
    shock_strength: StrengthInput,
    vibrate_strength: StrengthInput,
}

impl ControlPanel {
    pub fn new() -> ControlPanel {
        ControlPanel {
            shock_strength: StrengthInput::new(),
            vibrate_strength: StrengthInput::new(),
        }
    }

    fn send_shock(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();
        let strength = self.shock_strength.committed();

        let fut = async move {
            match client.shock(ShockerId::FIRST, strength).await {
                Ok(status) => debug!("shock: {}", status),
                Err(err) => error!("shock failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    fn send_vibrate(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();
        let strength = self.vibrate_strength.committed();

        let fut = async move {
            match client.vibrate(ShockerId::FIRST, strength).await {
                Ok(status) => debug!("vibrate: {}", status),
                Err(err) => error!("vibrate failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    fn send_beep(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();

        let fut = async move {
            match client.beep(ShockerId::FIRST).await {
                Ok(status) => debug!("beep: {}", status),
                Err(err) => error!("beep failed: {}", err),
            }
        };

        Command::perform(fut, Message::InvokeComplete)
    }

    pub fn update(&mut self, message: ControlMessage, client: Option<&BackendClient>) -> Command<Message> {
        match message {
            ControlMessage::ShockStrengthEdited(value) => {
                self.shock_strength.edit(value);
            },
            ControlMessage::ShockStrengthCommitted => {
                self.shock_strength.commit();
            },
            ControlMessage::VibrateStrengthEdited(value) => {
                self.vibrate_strength.edit(value);
            },
            ControlMessage::VibrateStrengthCommitted => {
                self.vibrate_strength.commit();
            },
            ControlMessage::ShockPressed => {
                match client {
                    Some(client) => return self.send_shock(client),
                    None => error!("shock dropped, backend is not connected"),
                }
            },
            ControlMessage::VibratePressed => {
                match client {
                    Some(client) => return self.send_vibrate(client),
                    None => error!("vibrate dropped, backend is not connected"),
                }
            },
            ControlMessage::BeepPressed => {
                match client {
                    Some(client) => return self.send_beep(client),
                    None => error!("beep dropped, backend is not connected"),
                }
            },
        }

        Command::none()
    }

    pub fn view(&self, connected: bool) -> Element<ControlMessage> {
        let action = |label: &'static str, style: theme::Button, message: ControlMessage| -> Element<ControlMessage> {
            let mut button = button(text(label)).style(style);
            if connected {
                button = button.on_press(message);
            }
            button.into()
        };

        column![
            self.shock_strength.view(
                "Shock strength",
                connected,
                ControlMessage::ShockStrengthEdited,
                ControlMessage::ShockStrengthCommitted,
            ),
            self.vibrate_strength.view(
                "Vibrate strength",
                connected,
                ControlMessage::VibrateStrengthEdited,
                ControlMessage::VibrateStrengthCommitted,
            ),

            row![
                action("Shock", theme::Button::Destructive, ControlMessage::ShockPressed),
                action("Vibrate", theme::Button::Primary, ControlMessage::VibratePressed),
                action("Beep", theme::Button::Secondary, ControlMessage::BeepPressed),
            ].spacing(20),
        ]
        .align_items(Alignment::Center)
        .spacing(20)
        .width(Length::Fill)
        .into()
    }
}

impl Default for ControlPanel {
    fn default() -> Self {
        ControlPanel::new()
    }
}
