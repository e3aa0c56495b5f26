use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/**
 * A frame sent to the backend process. Every frame is serialized as a single
 * line of JSON, terminated by a newline.
 *
 * `id` correlates the invocation with the matching `Incoming::Result` frame.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outgoing {
    Invoke { id: u64, op: String, args: Value },
}

/**
 * A frame received from the backend process, one JSON object per line.
 *
 * A `Result` frame carries either `ok` (any JSON value, possibly null) or
 * `err` (a human readable message). An `Event` frame is unsolicited and is
 * routed by its channel name.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Incoming {
    Result {
        id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ok: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        err: Option<String>,
    },
    Event {
        channel: String,
        payload: Value,
    },
}

/**
 * The event channels the backend may publish on. Anything else on the wire
 * is dropped (and logged) by the connection worker.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    CsActivity,
    VrcOsc,
    FlashProgress,
}

impl EventChannel {
    pub const ALL: [EventChannel; 3] = [
        EventChannel::CsActivity,
        EventChannel::VrcOsc,
        EventChannel::FlashProgress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventChannel::CsActivity => "cs-rust-event",
            EventChannel::VrcOsc => "vrc-osc-event",
            EventChannel::FlashProgress => "update-progress-text",
        }
    }
}

impl FromStr for EventChannel {
    type Err = ();

    fn from_str(input: &str) -> Result<EventChannel, Self::Err> {
        match input {
            "cs-rust-event" => Ok(EventChannel::CsActivity),
            "vrc-osc-event" => Ok(EventChannel::VrcOsc),
            "update-progress-text" => Ok(EventChannel::FlashProgress),
            _ => Err(()),
        }
    }
}

/// Payload of the `cs-rust-event` and `vrc-osc-event` channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub message: String,
}

/// Payload of the `update-progress-text` channel. `progress` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub message: String,
    pub progress: u8,
}

/**
 * A backend event with its payload already decoded for the channel it
 * arrived on.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    CsActivity(ActivityPayload),
    VrcOsc(ActivityPayload),
    FlashProgress(ProgressPayload),
}

impl BackendEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            BackendEvent::CsActivity(_) => EventChannel::CsActivity,
            BackendEvent::VrcOsc(_) => EventChannel::VrcOsc,
            BackendEvent::FlashProgress(_) => EventChannel::FlashProgress,
        }
    }

    pub fn decode(channel: EventChannel, payload: Value) -> Result<BackendEvent, serde_json::Error> {
        Ok(match channel {
            EventChannel::CsActivity => BackendEvent::CsActivity(serde_json::from_value(payload)?),
            EventChannel::VrcOsc => BackendEvent::VrcOsc(serde_json::from_value(payload)?),
            EventChannel::FlashProgress => BackendEvent::FlashProgress(serde_json::from_value(payload)?),
        })
    }
}

/**
 * A stimulation strength in the range 1..=99.
 *
 * Text typed by the user goes through [Strength::parse]; a commit that does
 * not parse to an in-range integer falls back to [Strength::DEFAULT].
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strength(u8);

impl Strength {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 99;
    pub const DEFAULT: Strength = Strength(24);

    /// Strict parse of a committed input field. Whitespace is tolerated,
    /// anything non-numeric or out of range is not.
    pub fn parse(input: &str) -> Option<Strength> {
        match input.trim().parse::<i64>() {
            Ok(value) if value >= Strength::MIN as i64 && value <= Strength::MAX as i64 => {
                Some(Strength(value as u8))
            }
            _ => None,
        }
    }

    /// The value a committed input field ends up as: the parsed strength, or
    /// the default when the text is out of range or not a number.
    pub fn from_committed_input(input: &str) -> Strength {
        Strength::parse(input).unwrap_or(Strength::DEFAULT)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
 * Which shocker of the device an action is aimed at. The manual panel always
 * drives the first one.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShockerId(pub u8);

impl ShockerId {
    pub const FIRST: ShockerId = ShockerId(0);
}

/// Where the firmware flasher takes its image from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashSource {
    Server,
    Local,
}

impl FlashSource {
    pub const ALL: [FlashSource; 2] = [FlashSource::Server, FlashSource::Local];
}

impl fmt::Display for FlashSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlashSource::Server => "Latest release",
            FlashSource::Local => "Local file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerArgs {
    pub shocker: ShockerId,
    pub strength: Strength,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeepArgs {
    pub shocker: ShockerId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthArgs {
    pub strength: Strength,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartArgs {
    pub start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashArgs {
    pub port_str: String,
    pub source: FlashSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryResetArgs {
    pub port_str: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invoke_frame_shape() {
        let frame = Outgoing::Invoke {
            id: 7,
            op: "set_shock_strength".to_string(),
            args: serde_json::to_value(StrengthArgs { strength: Strength::DEFAULT }).unwrap(),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({"type": "invoke", "id": 7, "op": "set_shock_strength", "args": {"strength": 24}})
        );
    }

    #[test]
    fn result_frame_ok_and_err() {
        let ok: Incoming = serde_json::from_str(r#"{"type":"result","id":3,"ok":"192.168.1.10"}"#).unwrap();
        assert_eq!(
            ok,
            Incoming::Result { id: 3, ok: Some(json!("192.168.1.10")), err: None }
        );

        let err: Incoming = serde_json::from_str(r#"{"type":"result","id":4,"err":"no such port"}"#).unwrap();
        assert_eq!(
            err,
            Incoming::Result { id: 4, ok: None, err: Some("no such port".to_string()) }
        );
    }

    #[test]
    fn event_frame_decodes_by_channel() {
        let incoming: Incoming = serde_json::from_str(
            r#"{"type":"event","channel":"update-progress-text","payload":{"message":"Writing at 0x00010000","progress":42}}"#,
        )
        .unwrap();
        let Incoming::Event { channel, payload } = incoming else {
            panic!("expected an event frame");
        };
        let channel: EventChannel = channel.parse().unwrap();
        let event = BackendEvent::decode(channel, payload).unwrap();
        assert_eq!(event.channel(), EventChannel::FlashProgress);
        assert_eq!(
            event,
            BackendEvent::FlashProgress(ProgressPayload {
                message: "Writing at 0x00010000".to_string(),
                progress: 42,
            })
        );
    }

    #[test]
    fn channel_names_round_trip() {
        for channel in EventChannel::ALL {
            assert_eq!(channel.name().parse::<EventChannel>(), Ok(channel));
        }
        assert_eq!("mystery-channel".parse::<EventChannel>(), Err(()));
    }

    #[test]
    fn strength_commit_rules() {
        assert_eq!(Strength::from_committed_input("40"), Strength::parse("40").unwrap());
        assert_eq!(Strength::from_committed_input(" 40 ").get(), 40);
        assert_eq!(Strength::from_committed_input("1").get(), 1);
        assert_eq!(Strength::from_committed_input("99").get(), 99);

        // out of range or malformed falls back to the default
        assert_eq!(Strength::from_committed_input("150"), Strength::DEFAULT);
        assert_eq!(Strength::from_committed_input("0"), Strength::DEFAULT);
        assert_eq!(Strength::from_committed_input("100"), Strength::DEFAULT);
        assert_eq!(Strength::from_committed_input("-3"), Strength::DEFAULT);
        assert_eq!(Strength::from_committed_input("abc"), Strength::DEFAULT);
        assert_eq!(Strength::from_committed_input(""), Strength::DEFAULT);
    }

    #[test]
    fn flash_args_use_wire_names() {
        let args = FlashArgs { port_str: "/dev/ttyUSB0".to_string(), source: FlashSource::Server };
        assert_eq!(
            serde_json::to_value(args).unwrap(),
            json!({"portStr": "/dev/ttyUSB0", "source": "server"})
        );
    }
}
