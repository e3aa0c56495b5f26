use futures::channel::{mpsc, oneshot};
use futures::SinkExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::bridge::protocol::{
    BeepArgs, FactoryResetArgs, FlashArgs, FlashSource, ShockerId, StartArgs, Strength,
    StrengthArgs, TriggerArgs,
};
use crate::error::BridgeError;

/**
 * One queued invocation on its way to the connection worker: the operation
 * name, its arguments, and the slot the worker answers into.
 */
#[derive(Debug)]
pub struct Invocation {
    pub op: &'static str,
    pub args: Value,
    pub reply: oneshot::Sender<Result<Value, BridgeError>>,
}

/**
 * Cloneable handle for talking to the backend process. Each operation the
 * backend exposes has its own method here; panels never touch operation
 * names or raw JSON themselves.
 *
 * The handle stays valid across backend restarts. Invocations made while the
 * backend is down fail with [BridgeError::Disconnected].
 */
#[derive(Debug, Clone)]
pub struct BackendClient {
    invoke_tx: mpsc::Sender<Invocation>,
}

impl BackendClient {
    pub(crate) fn new(invoke_tx: mpsc::Sender<Invocation>) -> BackendClient {
        BackendClient { invoke_tx }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: &'static str,
        args: impl Serialize,
    ) -> Result<T, BridgeError> {
        let args = serde_json::to_value(args)?;
        let (reply_tx, reply_rx) = oneshot::channel();

        let mut invoke_tx = self.invoke_tx.clone();
        invoke_tx
            .send(Invocation { op, args, reply: reply_tx })
            .await
            .map_err(|_| BridgeError::NotRunning)?;

        let value = reply_rx.await.map_err(|_| BridgeError::NotRunning)??;
        Ok(serde_json::from_value(value)?)
    }

    /// Asks the backend to find the device on the local network. The reply
    /// is either an address literal or a failure message, see
    /// [crate::bridge::address::Reachability].
    pub async fn load_local_ip(&self) -> Result<String, BridgeError> {
        self.call("load_local_ip", json!({})).await
    }

    pub async fn shock(&self, shocker: ShockerId, strength: Strength) -> Result<String, BridgeError> {
        self.call("shock", TriggerArgs { shocker, strength }).await
    }

    pub async fn vibrate(&self, shocker: ShockerId, strength: Strength) -> Result<String, BridgeError> {
        self.call("vibrate", TriggerArgs { shocker, strength }).await
    }

    pub async fn beep(&self, shocker: ShockerId) -> Result<String, BridgeError> {
        self.call("beep", BeepArgs { shocker }).await
    }

    pub async fn set_shock_strength(&self, strength: Strength) -> Result<(), BridgeError> {
        self.call("set_shock_strength", StrengthArgs { strength }).await
    }

    pub async fn set_vibrate_strength(&self, strength: Strength) -> Result<(), BridgeError> {
        self.call("set_vibrate_strength", StrengthArgs { strength }).await
    }

    pub async fn start_cs_listener(&self, start: bool) -> Result<(), BridgeError> {
        self.call("start_cs_listener", StartArgs { start }).await
    }

    pub async fn start_vrc_osc(&self, start: bool) -> Result<(), BridgeError> {
        self.call("start_vrc_osc", StartArgs { start }).await
    }

    /// Walks the user through creating a game integration config. Progress
    /// is reported over the `cs-rust-event` channel, not in the reply.
    pub async fn create_cs_config(&self) -> Result<(), BridgeError> {
        self.call("create_cs_config", json!({})).await
    }

    pub async fn get_available_serial_devices(&self) -> Result<Vec<String>, BridgeError> {
        self.call("get_available_serial_devices", json!({})).await
    }

    /// Flashes the device on the given serial port. Progress is reported
    /// over the `update-progress-text` channel; the reply is the final
    /// status line.
    pub async fn flash_device_firmware(
        &self,
        port: String,
        source: FlashSource,
    ) -> Result<String, BridgeError> {
        self.call("flash_device_firmware", FlashArgs { port_str: port, source }).await
    }

    /// Erases the stored configuration of the device on the given serial
    /// port and reboots it.
    pub async fn factory_reset_device(&self, port: String) -> Result<String, BridgeError> {
        self.call("factory_reset_device", FactoryResetArgs { port_str: port }).await
    }
}
