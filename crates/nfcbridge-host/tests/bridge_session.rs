#![cfg(unix)]

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nfcbridge_frame::{FrameReader, FrameWriter};
use nfcbridge_host::{run_bridge, BridgeConfig, DispatcherConfig, SessionSummary, WatchConfig};
use nfcbridge_reader::MockReaderAccess;
use serde_json::{json, Value};

struct Client {
    frames: FrameReader<UnixStream>,
    writer: FrameWriter<UnixStream>,
}

impl Client {
    fn send(&mut self, command: Value) {
        self.writer
            .send(&command.to_string())
            .expect("command should be written");
    }

    fn recv(&mut self) -> Value {
        let raw = self
            .frames
            .read_message()
            .expect("frame should decode")
            .expect("bridge should still be open");
        serde_json::from_str(&raw).expect("payload should be JSON")
    }
}

fn spawn_bridge(
    mock: Arc<MockReaderAccess>,
) -> (Client, thread::JoinHandle<nfcbridge_host::Result<SessionSummary>>) {
    let (client_end, host_end) = UnixStream::pair().expect("socket pair should be creatable");
    client_end
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should be settable");

    let host_in = host_end.try_clone().expect("host end should clone");
    let config = BridgeConfig {
        dispatcher: DispatcherConfig {
            watch: WatchConfig {
                presence_timeout: Duration::from_millis(10),
                idle_delay: Duration::from_millis(5),
                settle_delay: Duration::from_millis(1),
                retry_delay: Duration::from_millis(1),
                ..WatchConfig::default()
            },
            ..DispatcherConfig::default()
        },
        ..BridgeConfig::default()
    };
    let bridge = thread::spawn(move || run_bridge(host_in, host_end, mock, config));

    let client = Client {
        frames: FrameReader::new(client_end.try_clone().expect("client end should clone")),
        writer: FrameWriter::new(client_end),
    };
    (client, bridge)
}

#[test]
fn events_share_the_stream_with_responses() {
    let mock = Arc::new(MockReaderAccess::with_readers(["ACR122U"]));
    let (mut client, bridge) = spawn_bridge(mock.clone());

    client.send(json!({"action": "get-version"}));
    assert_eq!(
        client.recv(),
        json!({"success": true, "version": nfcbridge_host::VERSION})
    );

    client.send(json!({"action": "start-listening", "readerIndex": 0}));
    assert_eq!(client.recv()["readerName"], "ACR122U");

    mock.place_card("04A1B2C3D4E5F6");
    assert_eq!(
        client.recv(),
        json!({
            "event": "card-detected",
            "uid": "04A1B2C3D4E5F6",
            "uidType": "Double size UID (7 bytes)"
        })
    );

    client.send(json!({"action": "get-status"}));
    assert_eq!(
        client.recv(),
        json!({"success": true, "listening": true, "cardPresent": true})
    );

    client.send(json!({"action": "stop-listening"}));
    assert_eq!(client.recv()["message"], "Stopped listening");

    client
        .writer
        .get_ref()
        .shutdown(std::net::Shutdown::Write)
        .expect("write half should shut down");
    let summary = bridge
        .join()
        .expect("bridge thread should not panic")
        .expect("bridge should exit cleanly");
    assert_eq!(summary.commands, 4);
}

#[test]
fn closing_input_while_listening_stops_the_loop() {
    let mock = Arc::new(MockReaderAccess::with_readers(["ACR122U"]));
    let (mut client, bridge) = spawn_bridge(mock.clone());

    client.send(json!({"action": "start-listening", "readerIndex": 0}));
    assert_eq!(client.recv()["success"], true);

    client
        .writer
        .get_ref()
        .shutdown(std::net::Shutdown::Write)
        .expect("write half should shut down");
    bridge
        .join()
        .expect("bridge thread should not panic")
        .expect("bridge should exit cleanly");

    mock.place_card("04A1B2C3");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(mock.read_count(), 0);
}

#[test]
fn truncated_frame_is_a_session_error() {
    let mock = Arc::new(MockReaderAccess::new());
    let (client, bridge) = spawn_bridge(mock);

    let mut raw = client.writer.into_inner();
    raw.write_all(&[0x20, 0x00, 0x00, 0x00, b'{'])
        .expect("partial frame should be written");
    raw.shutdown(std::net::Shutdown::Write)
        .expect("write half should shut down");

    let err = bridge
        .join()
        .expect("bridge thread should not panic")
        .expect_err("truncated frame should fail the session");
    assert!(err.to_string().contains("frame error"));
}
