use iced::{Alignment, Application, Command, Element, Length, Settings as IcedSettings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::executor;
use iced::time::{every as iced_time_every};
use iced::theme::{self, Theme};
use iced::widget::{Row, button, column, container, horizontal_rule, row, text};
use std::path::PathBuf;
use std::time::{Duration};
use log::{error, info};
use tokio_util::sync::{CancellationToken};

use crate::bridge::address::Reachability;
use crate::bridge::client::BackendClient;
use crate::bridge::connection::{bridge_subscription, BridgeEvent, BridgeState};
use crate::bridge::protocol::BackendEvent;
use crate::error::AppRunError;
use crate::gui::open::open_link;
use crate::gui::panel::changelog::ChangelogPanel;
use crate::gui::panel::control::ControlPanel;
use crate::gui::panel::cs::CsPanel;
use crate::gui::panel::firmware::FirmwarePanel;
use crate::gui::panel::vrc::VrcPanel;
use crate::gui::style::{TextButtonStyleSheet};
use crate::gui::types::{FirmwareMessage, Message, Tab};
use crate::resources::{WEBSITE_LABEL, WEBSITE_URL};
use crate::settings::io::{SettingsIO};
use crate::settings::types::{Settings};

pub struct ApplicationFlags {
    settings_io: SettingsIO,
    backend_path: PathBuf,
}

pub struct MyApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    // current settings, might not be saved to disk yet
    settings_io: SettingsIO,
    settings: Settings,
    settings_dirty: bool,
    // the panels may not touch the settings until the load completed,
    // otherwise a slow disk would get its stored device overwritten
    settings_loaded: bool,
    // this flag is used to make sure that a user is not spammed with save settings errors
    displayed_settings_save_error: bool,

    // where the backend process lives and how to talk to it
    backend_path: PathBuf,
    client: Option<BackendClient>,
    bridge_state: BridgeState,

    active_tab: Tab,
    // result of the last reachability check, None while one is underway
    gate: Option<Reachability>,

    control: ControlPanel,
    cs: CsPanel,
    vrc: VrcPanel,
    firmware: FirmwarePanel,
    changelog: ChangelogPanel,
}

impl MyApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn load_settings(&self) -> Command<Message> {
        let settings_io = self.settings_io.clone();

        let fut = async move {
            match settings_io.read().await {
                Ok(settings) => (settings, None),
                Err(err) => {
                    let mut error_message: Option<String> = None;

                    if err.is_file_not_found_error() {
                        // this is probably the first start of the app
                        info!("Settings file not found, using defaults");
                    } else {
                        error!("Failed to load settings: {:?}", &err);
                        error_message = Some(format!("Failed to load settings: {}", &err));
                    }
                    (Settings::default(), error_message)
                }
            }
        };

        Command::perform(fut, Message::SettingsLoadComplete)
    }

    fn save_settings(&self) -> Command<Message> {
        let settings = self.settings.clone();
        let settings_io = self.settings_io.clone();

        let fut = async move {
            match settings_io.save(settings).await {
                Ok(_) => None,
                Err(err) => {
                    error!("Failed to save settings: {:?}", &err);
                    return Some(format!("Failed to save settings: {}", &err));
                },
            }
        };

        return Command::perform(fut, Message::SettingsSaveComplete);
    }

    /// Asks the backend where the device is. The panels that control a
    /// device stay locked until the answer looks like an address.
    fn check_gate(&self) -> Command<Message> {
        let Some(client) = self.client.clone() else {
            return Command::none();
        };

        let fut = async move {
            match client.load_local_ip().await {
                Ok(reply) => Reachability::from_reply(reply),
                Err(err) => {
                    error!("Reachability check failed: {:?}", &err);
                    Reachability::Unreachable(format!("Backend unavailable: {}", err))
                },
            }
        };

        Command::perform(fut, Message::GateChecked)
    }

    fn open_link(&self, url: String) -> Command<Message> {
        let fut = async move {
            match open_link(&url).await {
                Ok(_) => true,
                Err(err) => {
                    error!("Failed to open link: {:?}", &err);
                    false
                },
            }
        };

        return Command::perform(fut, Message::LinkOpened)
    }

    fn tab_view(&self, connected: bool) -> Element<Message> {
        match self.active_tab {
            Tab::Control => self.control.view(connected).map(Message::Control),
            Tab::Cs => self.cs.view(connected).map(Message::Cs),
            Tab::Vrc => self.vrc.view(connected).map(Message::Vrc),
            Tab::Firmware => self.firmware.view(connected).map(Message::Firmware),
        }
    }
}

impl Application for MyApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (MyApplication, Command<Self::Message>) {
        let app_cancel = CancellationToken::new();
        let notices: Vec<String> = Vec::new();

        let app = MyApplication {
            app_cancel,
            notices,
            settings_io: flags.settings_io,
            settings: Settings::default(),
            settings_dirty: false,
            settings_loaded: false,
            displayed_settings_save_error: false,
            backend_path: flags.backend_path,
            client: None,
            bridge_state: BridgeState::Starting,
            active_tab: Tab::Control,
            gate: None,
            control: ControlPanel::new(),
            cs: CsPanel::new(),
            vrc: VrcPanel::new(),
            firmware: FirmwarePanel::new(),
            changelog: ChangelogPanel::new(),
        };

        let command = app.load_settings();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("QTShock Desktop ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::SettingsLoadComplete((settings, error_message)) => {
                info!("Settings load complete");
                self.settings = settings;
                self.settings_loaded = true;
                self.firmware.restore_selection(self.settings.selected_device.clone());

                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }

                if self.client.is_some() {
                    return self.firmware.update(FirmwareMessage::RefreshPressed, self.client.as_ref());
                }
            },
            Message::ApplyDirtySettings => {
                if self.settings_dirty {
                    self.settings_dirty = false;
                    return self.save_settings();
                }
            },
            Message::SettingsSaveComplete(error_message) => {
                if !self.displayed_settings_save_error {
                    if let Some(error_message) = error_message {
                        self.displayed_settings_save_error = true;
                        self.notices.push(error_message);
                    }
                }
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::LinkPress(url) => {
                return self.open_link(url);
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },

            Message::Bridge(BridgeEvent::Ready(client)) => {
                info!("Backend client ready");
                self.client = Some(client);

                let mut commands = vec![self.check_gate()];
                if self.settings_loaded {
                    commands.push(self.firmware.update(FirmwareMessage::RefreshPressed, self.client.as_ref()));
                }
                return Command::batch(commands);
            },
            Message::Bridge(BridgeEvent::StateChange(state)) => {
                let running = matches!(state, BridgeState::Running);
                self.bridge_state = state;

                if running {
                    // a fresh backend does a fresh network search
                    return self.check_gate();
                }

                // a gone backend cannot vouch for the device either; the
                // gated tabs lock again until a fresh check passes
                self.gate = None;
            },
            Message::Bridge(BridgeEvent::Backend(BackendEvent::CsActivity(payload))) => {
                return self.cs.append_activity(payload.message);
            },
            Message::Bridge(BridgeEvent::Backend(BackendEvent::VrcOsc(payload))) => {
                return self.vrc.append_activity(payload.message);
            },
            Message::Bridge(BridgeEvent::Backend(BackendEvent::FlashProgress(payload))) => {
                self.firmware.apply_progress(payload);
            },

            Message::TabSelected(tab) => {
                self.active_tab = tab;

                if tab.requires_device() {
                    self.gate = None;
                    return self.check_gate();
                }
            },
            Message::GateChecked(reachability) => {
                self.gate = Some(reachability);
            },
            Message::ToggleChangelog => {
                self.changelog.toggle();
            },

            Message::Control(message) => {
                return self.control.update(message, self.client.as_ref());
            },
            Message::Cs(message) => {
                return self.cs.update(message, self.client.as_ref());
            },
            Message::Vrc(message) => {
                return self.vrc.update(message, self.client.as_ref());
            },
            Message::Firmware(message) => {
                let command = self.firmware.update(message, self.client.as_ref());

                // keep the stored device in sync with the panel
                if self.settings_loaded && self.settings.selected_device != self.firmware.selected_device() {
                    self.settings.selected_device = self.firmware.selected_device();
                    self.settings_dirty = true;
                }
                return command;
            },

            _ => {}
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            iced_time_every(Duration::from_secs(1)).map(|_| Message::ApplyDirtySettings),
            bridge_subscription(
                self.app_cancel.clone(),
                self.backend_path.clone(),
            ).map(Message::Bridge),
        ])
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let connected = self.client.is_some() && self.bridge_state == BridgeState::Running;

        let bridge_status = match &self.bridge_state {
            BridgeState::Starting => "Starting backend…".to_string(),
            BridgeState::Running => "".to_string(),
            BridgeState::Lost { detail } => format!("Backend stopped: {}", detail),
        };

        let tab_button = |tab: Tab| -> Element<Message> {
            button(text(tab.label()).size(14))
                .style(if tab == self.active_tab { theme::Button::Primary } else { theme::Button::Secondary })
                .on_press(Message::TabSelected(tab))
                .into()
        };

        let tabs = Row::with_children(
            Tab::ALL.iter().copied().map(tab_button)
        ).spacing(10);

        let content: Element<Message> = if !self.active_tab.requires_device() {
            self.tab_view(connected)
        }
        else {
            match &self.gate {
                None => text("Looking for your QTShock on the network…").into(),
                Some(Reachability::Unreachable(detail)) => {
                    column![
                        text("QTShock not reachable"),
                        text(detail).size(14),
                    ].align_items(Alignment::Center).spacing(10).into()
                },
                Some(Reachability::Reachable(address)) => {
                    column![
                        text(format!("QTShock found at {}", address)).size(14),
                        self.tab_view(connected),
                    ].align_items(Alignment::Center).spacing(20).width(Length::Fill).into()
                },
            }
        };

        let whats_new_label = if self.changelog.visible() { "Hide what's new" } else { "What's new?" };

        let mut footer = column![
            row![
                button(text(whats_new_label).size(14))
                    .style(theme::Button::Custom(Box::new(TextButtonStyleSheet)))
                    .on_press(Message::ToggleChangelog),

                button(text(WEBSITE_LABEL).size(14))
                    .style(theme::Button::Custom(Box::new(TextButtonStyleSheet)))
                    .on_press(Message::LinkPress(WEBSITE_URL.to_string())),
            ].spacing(20),
        ].align_items(Alignment::Center).spacing(10).width(Length::Fill);

        if self.changelog.visible() {
            footer = footer.push(self.changelog.view());
        }

        container(
            column![
                column![
                    tabs,

                    horizontal_rule(10),

                    text(bridge_status).size(14),

                    content,
                ]
                    .spacing(20)
                    .width(Length::Fill)
                    .align_items(Alignment::Center)
                    .height(Length::Fill),

                footer,
            ].align_items(Alignment::Center),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn test_app(dir: &TempDir) -> MyApplication {
        let settings_io = SettingsIO::open_sync(dir.path().join("qtshock-desktop.json")).unwrap();
        let flags = ApplicationFlags {
            settings_io,
            backend_path: PathBuf::from("qtshock-backend"),
        };
        MyApplication::new(flags).0
    }

    #[test]
    fn losing_the_backend_locks_the_gated_tabs_again() {
        let dir = tempdir().unwrap();
        let mut app = test_app(&dir);

        let _ = app.update(Message::GateChecked(Reachability::Reachable("192.168.1.10".to_string())));
        assert_eq!(app.gate, Some(Reachability::Reachable("192.168.1.10".to_string())));

        let _ = app.update(Message::Bridge(BridgeEvent::StateChange(BridgeState::Lost {
            detail: "backend closed its output".to_string(),
        })));
        assert_eq!(app.gate, None);

        // still locked while the next backend is starting up
        let _ = app.update(Message::Bridge(BridgeEvent::StateChange(BridgeState::Starting)));
        assert_eq!(app.gate, None);
    }
}

pub fn run_application(backend_path: PathBuf) -> Result<(), AppRunError> {
    let mut settings_io = SettingsIO::new_sync()?;
    let mut settings_locker = settings_io.locker()?;
    let _lock_guard = settings_locker.lock()?;

    let flags = ApplicationFlags { settings_io, backend_path };
    let mut settings = IcedSettings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("qtshock-desktop".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(680.0, 640.0);
    settings.window.resizable = false;

    // this function will call process::exit() unless there was a startup error
    MyApplication::run(settings)?;
    Ok(())
}
