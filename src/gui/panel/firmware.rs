use iced::{Alignment, Command, Element, Length};
use iced::theme;
use iced::widget::{Row, button, column, progress_bar, radio, row, text, PickList};
use log::{debug, error};

use crate::bridge::client::BackendClient;
use crate::bridge::protocol::{FlashSource, ProgressPayload};
use crate::gui::types::{FirmwareMessage, Message};

// status strings from the backend carry color markup meant for the old web
// view, for example "<g>Successfully flashed firmware!</g>"
const COLOR_TAGS: [&str; 8] = ["<y>", "</y>", "<bl>", "</bl>", "<g>", "</g>", "<r>", "</r>"];

fn strip_color_tags(message: &str) -> String {
    let mut message = message.to_string();
    for tag in COLOR_TAGS {
        message = message.replace(tag, "");
    }
    message
}

/**
 * The firmware flasher. Serial devices are listed on demand, the selected
 * port is persisted (see [crate::settings::types::Settings]), and a flash or
 * factory reset renders `update-progress-text` events until the final
 * status string of the operation arrives.
 */
pub struct FirmwarePanel {
    devices: Vec<String>,
    selected: Option<String>,
    source: FlashSource,
    status: String,
    progress: u8,
}

impl FirmwarePanel {
    pub fn new() -> FirmwarePanel {
        FirmwarePanel {
            devices: Vec::new(),
            selected: None,
            source: FlashSource::Server,
            status: String::new(),
            progress: 0,
        }
    }

    pub fn selected_device(&self) -> Option<String> {
        self.selected.clone()
    }

    /// Puts the selection persisted by an earlier run back in place. Runs
    /// before the first device refresh, so a still-attached device wins
    /// over the plain first-in-list fallback.
    pub fn restore_selection(&mut self, port: Option<String>) {
        if let Some(port) = port {
            self.selected = Some(port);
        }
    }

    pub fn apply_progress(&mut self, payload: ProgressPayload) {
        self.status = strip_color_tags(&payload.message);
        self.progress = payload.progress;
    }

    fn refresh_devices(&self, client: &BackendClient) -> Command<Message> {
        let client = client.clone();

        let fut = async move {
            client.get_available_serial_devices().await.map_err(|err| err.to_string())
        };

        Command::perform(fut, |result| Message::Firmware(FirmwareMessage::DevicesLoaded(result)))
    }

    fn flash(&self, client: &BackendClient) -> Command<Message> {
        let Some(port) = self.selected.clone() else {
            return Command::none();
        };
        let client = client.clone();
        let source = self.source;

        let fut = async move {
            client.flash_device_firmware(port, source).await.map_err(|err| err.to_string())
        };

        Command::perform(fut, |result| Message::Firmware(FirmwareMessage::OpFinished(result)))
    }

    fn factory_reset(&self, client: &BackendClient) -> Command<Message> {
        let Some(port) = self.selected.clone() else {
            return Command::none();
        };
        let client = client.clone();

        let fut = async move {
            client.factory_reset_device(port).await.map_err(|err| err.to_string())
        };

        Command::perform(fut, |result| Message::Firmware(FirmwareMessage::OpFinished(result)))
    }

    pub fn update(&mut self, message: FirmwareMessage, client: Option<&BackendClient>) -> Command<Message> {
        match message {
            FirmwareMessage::RefreshPressed => {
                if let Some(client) = client {
                    return self.refresh_devices(client);
                }
            },
            FirmwareMessage::DevicesLoaded(Ok(devices)) => {
                debug!("Found {} serial devices", devices.len());
                self.devices = devices;

                // an empty list leaves the selection (and therefore the
                // persisted port) alone
                if !self.devices.is_empty() {
                    let keep = self.selected.as_ref().is_some_and(|port| self.devices.contains(port));
                    if !keep {
                        self.selected = self.devices.first().cloned();
                    }
                }
            },
            FirmwareMessage::DevicesLoaded(Err(message)) => {
                error!("Refreshing serial devices failed: {}", message);
            },
            FirmwareMessage::DeviceSelected(port) => {
                self.selected = Some(port);
            },
            FirmwareMessage::SourceChosen(source) => {
                self.source = source;
            },
            FirmwareMessage::FlashPressed => {
                if let Some(client) = client {
                    return self.flash(client);
                }
            },
            FirmwareMessage::FactoryResetPressed => {
                if let Some(client) = client {
                    return self.factory_reset(client);
                }
            },
            FirmwareMessage::OpFinished(Ok(status)) => {
                self.status = strip_color_tags(&status);
            },
            FirmwareMessage::OpFinished(Err(message)) => {
                error!("Firmware operation failed: {}", message);
            },
        }

        Command::none()
    }

    pub fn view(&self, connected: bool) -> Element<FirmwareMessage> {
        let selected_is_listed = self.selected.as_ref().is_some_and(|port| self.devices.contains(port));

        let mut refresh_button = button(text("Refresh")).style(theme::Button::Secondary);
        if connected {
            refresh_button = refresh_button.on_press(FirmwareMessage::RefreshPressed);
        }

        let mut flash_button = button(text("Flash firmware")).style(theme::Button::Primary);
        if connected && selected_is_listed {
            flash_button = flash_button.on_press(FirmwareMessage::FlashPressed);
        }

        let mut reset_button = button(text("Factory reset")).style(theme::Button::Destructive);
        if connected && selected_is_listed {
            reset_button = reset_button.on_press(FirmwareMessage::FactoryResetPressed);
        }

        column![
            row![
                PickList::new(
                    self.devices.clone(),
                    self.selected.clone(),
                    FirmwareMessage::DeviceSelected,
                )
                    .placeholder("No devices found")
                    .width(260),

                refresh_button,
            ].align_items(Alignment::Center).spacing(10),

            Row::with_children(
                FlashSource::ALL.iter().copied().map(|source| {
                    radio(
                        source.to_string(),
                        source,
                        Some(self.source),
                        FirmwareMessage::SourceChosen,
                    ).into()
                })
            ).spacing(20),

            row![flash_button, reset_button].spacing(20),

            row![
                progress_bar(0.0..=100.0, self.progress as f32).height(14),
                text(format!("{}%", self.progress)).size(14),
            ].align_items(Alignment::Center).spacing(10),

            text(self.status.as_str()).size(14),
        ]
        .align_items(Alignment::Center)
        .spacing(20)
        .width(Length::Fill)
        .into()
    }
}

impl Default for FirmwarePanel {
    fn default() -> Self {
        FirmwarePanel::new()
    }
}
