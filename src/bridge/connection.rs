use std::any::TypeId;
use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use iced::subscription::{self, Subscription};
use futures::{StreamExt, SinkExt};
use futures::channel::mpsc::{self, Receiver, Sender};
use futures::channel::oneshot;
use indexmap::IndexMap;
use log::{info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tokio::time::{sleep, Duration};

use crate::bridge::client::{BackendClient, Invocation};
use crate::bridge::constants::{EVENT_QUEUE, INVOKE_QUEUE, RELAUNCH_DELAY};
use crate::bridge::protocol::{BackendEvent, EventChannel, Incoming, Outgoing};
use crate::error::BridgeError;

/**
 * Lifecycle of the backend process, as shown in the gui status line.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Starting,
    Running,
    Lost { detail: String },
}

/**
 * What the connection worker reports to its listeners.
 *
 * `Ready` is always the first event and hands out the client handle that the
 * rest of the application invokes operations through. The handle stays the
 * same across backend restarts.
 */
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready(BackendClient),
    StateChange(BridgeState),
    Backend(BackendEvent),
}

type PendingReplies = IndexMap<u64, oneshot::Sender<Result<Value, BridgeError>>>;

async fn broadcast(senders: &mut Vec<Sender<BridgeEvent>>, event: BridgeEvent) {
    for sender in senders {
        // a listener that dropped its receiver is shutting down
        if sender.send(event.clone()).await.is_err() {
            warn!("Dropping bridge event for a gone listener");
        }
    }
}

/**
 * The pause before the next backend launch. Invocations that arrive while
 * no session is running are answered with [BridgeError::Disconnected] right
 * away; holding them for the next backend would deliver stale commands to
 * the device.
 */
async fn pause_between_sessions(invoke_rx: &mut Receiver<Invocation>, millis: u64) {
    let delay = sleep(Duration::from_millis(millis));
    tokio::pin!(delay);

    loop {
        tokio::select! {
            _ = &mut delay => break,
            invocation = invoke_rx.next() => match invocation {
                Some(Invocation { reply, .. }) => {
                    let _ = reply.send(Err(BridgeError::Disconnected));
                },
                // every client handle is gone, just finish the pause
                None => {
                    delay.as_mut().await;
                    break;
                },
            },
        }
    }
}

fn spawn_backend(backend: &Path) -> io::Result<Child> {
    Command::new(backend)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Outgoing) -> io::Result<()> {
    let mut line = serde_json::to_vec(frame)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    line.push(b'\n');

    writer.write_all(&line).await?;
    writer.flush().await
}

async fn handle_line(line: &str, pending: &mut PendingReplies, senders: &mut Vec<Sender<BridgeEvent>>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let incoming: Incoming = match serde_json::from_str(line) {
        Ok(incoming) => incoming,
        Err(err) => {
            warn!("Discarding malformed backend frame: {}", err);
            return;
        },
    };

    match incoming {
        Incoming::Result { id, ok, err } => {
            let Some(reply) = pending.shift_remove(&id) else {
                warn!("Backend answered unknown invocation {}", id);
                return;
            };

            let outcome = match err {
                Some(message) => Err(BridgeError::Backend(message)),
                None => Ok(ok.unwrap_or(Value::Null)),
            };

            // the caller may have given up on the reply in the meantime
            let _ = reply.send(outcome);
        },
        Incoming::Event { channel, payload } => {
            let Ok(channel) = channel.parse::<EventChannel>() else {
                warn!("Dropping backend event on unknown channel {:?}", channel);
                return;
            };

            match BackendEvent::decode(channel, payload) {
                Ok(event) => broadcast(senders, BridgeEvent::Backend(event)).await,
                Err(err) => warn!("Dropping undecodable {:?} event: {}", channel, err),
            }
        },
    }
}

/**
 * Pumps one backend session: queued invocations are written out as frames,
 * result frames complete their pending reply slot, event frames are decoded
 * and fanned out to every listener in arrival order.
 *
 * Returns a human readable reason once the session cannot continue. Replies
 * that are still pending at that point fail with [BridgeError::Disconnected],
 * oldest invocation first.
 */
async fn drive_session<R, W>(
    cancel: &CancellationToken,
    reader: R,
    mut writer: W,
    invoke_rx: &mut Receiver<Invocation>,
    senders: &mut Vec<Sender<BridgeEvent>>,
) -> String
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut pending: PendingReplies = IndexMap::new();
    let mut next_id: u64 = 1;
    let mut lines = reader.lines();

    let detail = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break String::from("shutting down");
            },
            result = lines.next_line() => match result {
                Ok(Some(line)) => handle_line(&line, &mut pending, senders).await,
                Ok(None) => break String::from("backend closed its output"),
                Err(err) => break format!("reading from backend failed: {}", err),
            },
            invocation = invoke_rx.next() => match invocation {
                None => break String::from("client handle dropped"),
                Some(Invocation { op, args, reply }) => {
                    let id = next_id;
                    next_id += 1;

                    let frame = Outgoing::Invoke { id, op: op.to_string(), args };
                    match write_frame(&mut writer, &frame).await {
                        Ok(()) => {
                            pending.insert(id, reply);
                        },
                        Err(err) => {
                            let _ = reply.send(Err(BridgeError::Disconnected));
                            break format!("writing to backend failed: {}", err);
                        },
                    }
                },
            },
        }
    };

    for (_, reply) in pending.drain(..) {
        let _ = reply.send(Err(BridgeError::Disconnected));
    }

    detail
}

async fn run_bridge(cancel: CancellationToken, backend: PathBuf, mut senders: Vec<Sender<BridgeEvent>>) -> Infallible {
    let (invoke_tx, mut invoke_rx) = mpsc::channel(INVOKE_QUEUE);
    broadcast(&mut senders, BridgeEvent::Ready(BackendClient::new(invoke_tx))).await;

    let mut retry = false;

    // note: subscription::channel expects the future to never resolve (Infallible),
    // so once a close request cancels the token this parks instead of returning.
    loop {
        if cancel.is_cancelled() {
            futures::future::pending::<()>().await;
        }

        if retry {
            pause_between_sessions(&mut invoke_rx, RELAUNCH_DELAY).await;
        }
        retry = true;

        broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Starting)).await;

        let mut child = match spawn_backend(&backend) {
            Ok(child) => child,
            Err(err) => {
                warn!("Failed to spawn backend {:?}: {}", backend, err);
                let detail = format!("failed to spawn {}: {}", backend.display(), err);
                broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Lost { detail })).await;
                continue;
            },
        };

        let stdin = child.stdin.take().expect("Failed to open stdin pipe to backend");
        let stdout = child.stdout.take().expect("Failed to open stdout pipe to backend");
        info!("Backend {:?} running as pid {:?}", backend, child.id());

        broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Running)).await;

        let detail = drive_session(&cancel, BufReader::new(stdout), stdin, &mut invoke_rx, &mut senders).await;
        warn!("Backend session ended: {}", detail);

        // kill_on_drop cleans the child up if it is still around
        drop(child);

        broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Lost { detail })).await;
    }
}

pub fn bridge_subscription(cancel: CancellationToken, backend: PathBuf) -> Subscription<BridgeEvent> {
    struct Bridge;

    subscription::channel(
        TypeId::of::<Bridge>(),
        EVENT_QUEUE,
        move |subscription_sender| {
            let cancel2 = cancel.clone();
            let backend2 = backend.clone();
            let senders2 = vec![subscription_sender];

            async move {
                run_bridge(cancel2, backend2, senders2).await
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{duplex, split};

    use crate::bridge::protocol::{ShockerId, Strength};

    #[tokio::test]
    async fn invoke_round_trip_and_backend_error() {
        let cancel = CancellationToken::new();
        let (invoke_tx, mut invoke_rx) = mpsc::channel(INVOKE_QUEUE);
        let client = BackendClient::new(invoke_tx);
        let mut senders = Vec::new();

        let (ui_io, backend_io) = duplex(4096);
        let (ui_read, ui_write) = split(ui_io);
        let (backend_read, mut backend_write) = split(backend_io);

        let session = drive_session(&cancel, BufReader::new(ui_read), ui_write, &mut invoke_rx, &mut senders);

        let calls = async move {
            let status = client
                .shock(ShockerId::FIRST, Strength::from_committed_input("40"))
                .await
                .unwrap();
            assert_eq!(status, "Shock sent");

            let err = client.beep(ShockerId::FIRST).await.unwrap_err();
            assert!(matches!(err, BridgeError::Backend(message) if message == "device did not answer"));

            // dropping the only client closes the invocation channel
        };

        let script = async move {
            let mut lines = BufReader::new(backend_read).lines();

            let line = lines.next_line().await.unwrap().unwrap();
            let frame: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(frame["type"], "invoke");
            assert_eq!(frame["op"], "shock");
            assert_eq!(frame["args"], json!({"shocker": 0, "strength": 40}));
            let id = frame["id"].as_u64().unwrap();
            let reply = format!("{}\n", json!({"type": "result", "id": id, "ok": "Shock sent"}));
            backend_write.write_all(reply.as_bytes()).await.unwrap();

            let line = lines.next_line().await.unwrap().unwrap();
            let frame: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(frame["op"], "beep");
            assert_eq!(frame["args"], json!({"shocker": 0}));
            let id = frame["id"].as_u64().unwrap();
            let reply = format!("{}\n", json!({"type": "result", "id": id, "err": "device did not answer"}));
            backend_write.write_all(reply.as_bytes()).await.unwrap();

            // keep the pipe open so the session only ends through the client drop
            (lines, backend_write)
        };

        let (detail, (), _pipe) = tokio::join!(session, calls, script);
        assert_eq!(detail, "client handle dropped");
    }

    #[tokio::test]
    async fn out_of_range_commit_reaches_wire_as_default() {
        let cancel = CancellationToken::new();
        let (invoke_tx, mut invoke_rx) = mpsc::channel(INVOKE_QUEUE);
        let client = BackendClient::new(invoke_tx);
        let mut senders = Vec::new();

        let (ui_io, backend_io) = duplex(4096);
        let (ui_read, ui_write) = split(ui_io);
        let (backend_read, mut backend_write) = split(backend_io);

        let session = drive_session(&cancel, BufReader::new(ui_read), ui_write, &mut invoke_rx, &mut senders);

        let calls = async move {
            client.set_vibrate_strength(Strength::from_committed_input("150")).await.unwrap();
            client.set_vibrate_strength(Strength::from_committed_input("40")).await.unwrap();
        };

        let script = async move {
            let mut lines = BufReader::new(backend_read).lines();

            for expected in [24, 40] {
                let line = lines.next_line().await.unwrap().unwrap();
                let frame: Value = serde_json::from_str(&line).unwrap();
                assert_eq!(frame["op"], "set_vibrate_strength");
                assert_eq!(frame["args"]["strength"], expected);
                let id = frame["id"].as_u64().unwrap();
                let reply = format!("{}\n", json!({"type": "result", "id": id, "ok": null}));
                backend_write.write_all(reply.as_bytes()).await.unwrap();
            }

            // keep the pipe open so the session only ends through the client drop
            (lines, backend_write)
        };

        let (detail, (), _pipe) = tokio::join!(session, calls, script);
        assert_eq!(detail, "client handle dropped");
    }

    #[tokio::test]
    async fn events_fan_out_to_all_listeners() {
        let cancel = CancellationToken::new();
        let (_invoke_tx, mut invoke_rx) = mpsc::channel::<Invocation>(INVOKE_QUEUE);
        let (gui_tx, mut gui_rx) = mpsc::channel(EVENT_QUEUE);
        let (log_tx, mut log_rx) = mpsc::channel(EVENT_QUEUE);
        let mut senders = vec![gui_tx, log_tx];

        let (ui_io, mut backend_io) = duplex(4096);
        let (ui_read, ui_write) = split(ui_io);

        let session = drive_session(&cancel, BufReader::new(ui_read), ui_write, &mut invoke_rx, &mut senders);

        let script = async move {
            backend_io
                .write_all(
                    concat!(
                        r#"{"type":"event","channel":"cs-rust-event","payload":{"message":"Got hit for 34 damage"}}"#, "\n",
                        r#"{"type":"event","channel":"mystery-channel","payload":{"message":"ignored"}}"#, "\n",
                        r#"{"type":"event","channel":"update-progress-text","payload":{"message":"Erasing flash","progress":10}}"#, "\n",
                    )
                    .as_bytes(),
                )
                .await
                .unwrap();

            // dropping the backend end of the pipe ends the session
        };

        let (detail, ()) = tokio::join!(session, script);
        assert_eq!(detail, "backend closed its output");

        for receiver in [&mut gui_rx, &mut log_rx] {
            let Some(BridgeEvent::Backend(BackendEvent::CsActivity(payload))) = receiver.next().await else {
                panic!("expected the cs activity event first");
            };
            assert_eq!(payload.message, "Got hit for 34 damage");

            let Some(BridgeEvent::Backend(BackendEvent::FlashProgress(payload))) = receiver.next().await else {
                panic!("expected the flash progress event second");
            };
            assert_eq!(payload.message, "Erasing flash");
            assert_eq!(payload.progress, 10);
        }

        // the unknown channel was dropped, nothing else arrives
        drop(senders);
        assert!(gui_rx.next().await.is_none());
        assert!(log_rx.next().await.is_none());
    }

    #[tokio::test]
    async fn invocations_while_the_backend_is_down_fail_fast() {
        let (invoke_tx, mut invoke_rx) = mpsc::channel(INVOKE_QUEUE);
        let client = BackendClient::new(invoke_tx);

        let pause = pause_between_sessions(&mut invoke_rx, 50);

        let calls = async move {
            // nothing is queued for the next backend, the call fails now
            let err = client
                .shock(ShockerId::FIRST, Strength::from_committed_input("40"))
                .await
                .unwrap_err();
            assert!(matches!(err, BridgeError::Disconnected));

            let err = client.load_local_ip().await.unwrap_err();
            assert!(matches!(err, BridgeError::Disconnected));
        };

        let ((), ()) = tokio::join!(pause, calls);
    }

    #[tokio::test]
    async fn a_gone_listener_does_not_panic_the_worker() {
        let (gui_tx, gui_rx) = mpsc::channel(EVENT_QUEUE);
        drop(gui_rx);

        let mut senders = vec![gui_tx];
        broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Starting)).await;
        broadcast(&mut senders, BridgeEvent::StateChange(BridgeState::Running)).await;
    }

    #[tokio::test]
    async fn lost_backend_fails_pending_invocations() {
        let cancel = CancellationToken::new();
        let (invoke_tx, mut invoke_rx) = mpsc::channel(INVOKE_QUEUE);
        let client = BackendClient::new(invoke_tx);
        let mut senders = Vec::new();

        let (ui_io, backend_io) = duplex(4096);
        let (ui_read, ui_write) = split(ui_io);
        let (backend_read, backend_write) = split(backend_io);

        let session = drive_session(&cancel, BufReader::new(ui_read), ui_write, &mut invoke_rx, &mut senders);

        let calls = async move {
            let err = client.load_local_ip().await.unwrap_err();
            assert!(matches!(err, BridgeError::Disconnected));
        };

        let script = async move {
            let mut lines = BufReader::new(backend_read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let frame: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(frame["op"], "load_local_ip");

            // exit without answering
            drop(lines);
            drop(backend_write);
        };

        let (detail, (), ()) = tokio::join!(session, calls, script);
        assert_eq!(detail, "backend closed its output");
    }
}
