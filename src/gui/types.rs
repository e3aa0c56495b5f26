use iced::Event;

use crate::bridge::address::Reachability;
use crate::bridge::connection::BridgeEvent;
use crate::bridge::protocol::FlashSource;
use crate::settings::types::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Control,
    Cs,
    Vrc,
    Firmware,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Control, Tab::Cs, Tab::Vrc, Tab::Firmware];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Control => "Manual",
            Tab::Cs => "CS Integration",
            Tab::Vrc => "VRChat OSC",
            Tab::Firmware => "Firmware",
        }
    }

    /// Tabs whose controls only work with a reachable device. Entering one
    /// re-runs the reachability check.
    pub fn requires_device(self) -> bool {
        !matches!(self, Tab::Firmware)
    }
}

#[derive(Debug, Clone)]
pub enum ControlMessage {
    ShockStrengthEdited(String),
    ShockStrengthCommitted,
    VibrateStrengthEdited(String),
    VibrateStrengthCommitted,
    ShockPressed,
    VibratePressed,
    BeepPressed,
}

#[derive(Debug, Clone)]
pub enum CsMessage {
    ListenerToggled(bool),
    SetupConfigPressed,
    ShockStrengthEdited(String),
    ShockStrengthCommitted,
    VibrateStrengthEdited(String),
    VibrateStrengthCommitted,
}

#[derive(Debug, Clone)]
pub enum VrcMessage {
    OscToggled(bool),
    ShockStrengthEdited(String),
    ShockStrengthCommitted,
    VibrateStrengthEdited(String),
    VibrateStrengthCommitted,
}

#[derive(Debug, Clone)]
pub enum FirmwareMessage {
    RefreshPressed,
    DevicesLoaded(Result<Vec<String>, String>),
    DeviceSelected(String),
    SourceChosen(FlashSource),
    FlashPressed,
    FactoryResetPressed,
    OpFinished(Result<String, String>),
}

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    Bridge(BridgeEvent),
    TabSelected(Tab),
    GateChecked(Reachability),
    ApplyDirtySettings,
    InvokeComplete(()),
    SettingsLoadComplete((Settings, Option<String>)),
    SettingsSaveComplete(Option<String>),
    NoticeConfirmed,
    LinkPress(String),
    LinkOpened(bool),
    ToggleChangelog,
    Control(ControlMessage),
    Cs(CsMessage),
    Vrc(VrcMessage),
    Firmware(FirmwareMessage),
}
