use iced::{Alignment, Command, Element, Length};
use iced::widget::scrollable::{self, RelativeOffset};
use iced::widget::{column, row, toggler};
use log::{debug, error};

use crate::bridge::client::BackendClient;
use crate::gui::activity_log::{log_view, ActivityLog};
use crate::gui::strength_input::StrengthInput;
use crate::gui::types::{Message, VrcMessage};

/**
 * VRChat OSC integration. Same shape as the cs panel: a toggle, the two
 * strength settings, and a feed of `vrc-osc-event` lines. The toggle
 * additionally writes its own ON/OFF line into the feed, the backend does
 * not echo that.
 */
pub struct VrcPanel {
    enabled: bool,
    shock_strength: StrengthInput,
    vibrate_strength: StrengthInput,
    log: ActivityLog,
    log_scroll: scrollable::Id,
}

impl VrcPanel {
    pub fn new() -> VrcPanel {
        VrcPanel {
            enabled: false,
            shock_strength: StrengthInput::new(),
            vibrate_strength: StrengthInput::new(),
            log: ActivityLog::new(),
            log_scroll: scrollable::Id::unique(),
        }
    }

    pub fn append_activity(&mut self, message: String) -> Command<Message> {
        self.log.append(message);
        scrollable::snap_to(self.log_scroll.clone(), RelativeOffset::END)
    }

    fn send_osc_toggle(&self, client: &BackendClient, start: bool) -> Command<Message> {
        let client = client.clone();

        let fut = async move {
            match client.start_vrc_osc(start).await {
                Ok(()) => debug!("start_vrc_osc({}) acknowledged", start),
                Err(err) => error!("start_vrc_osc failed: {}", err),
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

    pub fn update(&mut self, message: VrcMessage, client: Option<&BackendClient>) -> Command<Message> {
        match message {
            VrcMessage::OscToggled(enabled) => {
                self.enabled = enabled;

                let line = format!("Toggled VRChat integration {}", if enabled { "ON" } else { "OFF" });
                let snap = self.append_activity(line);

                let invoke = match client {
                    Some(client) => self.send_osc_toggle(client, enabled),
                    None => {
                        error!("start_vrc_osc({}) dropped, backend is not connected", enabled);
                        Command::none()
                    },
                };

                return Command::batch(vec![snap, invoke]);
            },
            VrcMessage::ShockStrengthEdited(value) => {
                self.shock_strength.edit(value);
            },
            VrcMessage::ShockStrengthCommitted => {
                self.shock_strength.commit();
                match client {
                    Some(client) => return self.send_shock_strength(client),
                    None => error!("set_shock_strength dropped, backend is not connected"),
                }
            },
            VrcMessage::VibrateStrengthEdited(value) => {
                self.vibrate_strength.edit(value);
            },
            VrcMessage::VibrateStrengthCommitted => {
                self.vibrate_strength.commit();
                match client {
                    Some(client) => return self.send_vibrate_strength(client),
                    None => error!("set_vibrate_strength dropped, backend is not connected"),
                }
            },
        }

        Command::none()
    }

    pub fn view(&self, connected: bool) -> Element<VrcMessage> {
        column![
            toggler(
                Some("Mirror avatar parameters".to_string()),
                self.enabled,
                VrcMessage::OscToggled,
            ).width(Length::Shrink),

            row![
                self.shock_strength.view(
                    "Shock strength",
                    connected,
                    VrcMessage::ShockStrengthEdited,
                    VrcMessage::ShockStrengthCommitted,
                ),
                self.vibrate_strength.view(
                    "Vibrate strength",
                    connected,
                    VrcMessage::VibrateStrengthEdited,
                    VrcMessage::VibrateStrengthCommitted,
                ),
            ].spacing(30),

            log_view(&self.log, self.log_scroll.clone()),
        ]
        .align_items(Alignment::Center)
        .spacing(20)
        .width(Length::Fill)
        .into()
    }
}

impl Default for VrcPanel {
    fn default() -> Self {
        VrcPanel::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_writes_its_own_feed_line() {
        let mut panel = VrcPanel::new();

        let _ = panel.update(VrcMessage::OscToggled(true), None);
        let _ = panel.update(VrcMessage::OscToggled(false), None);

        let lines: Vec<&str> = panel.log.iter().collect();
        assert_eq!(lines, vec![
            "Toggled VRChat integration ON",
            "Toggled VRChat integration OFF",
        ]);
    }
}
