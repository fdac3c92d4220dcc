//! Shared test helpers: a scripted Marionette server on an ephemeral port.

#![allow(dead_code)]

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use marionette::protocol::{read_frame, write_frame};
use serde_json::{json, Value};

pub const GREETING: &str = r#"{"applicationType":"gecko","marionetteProtocol":3}"#;

/// A command as seen by the stub server
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub id: u64,
    pub name: String,
    pub params: Value,
}

/// Server thread accepting a single connection
pub struct StubServer {
    pub addr: String,
    handle: JoinHandle<Vec<Received>>,
}

impl StubServer {
    /// Run `script` against the first accepted connection
    pub fn spawn<F>(script: F) -> Self
    where
        F: FnOnce(&mut TcpStream) -> Vec<Received> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            script(&mut stream)
        });

        Self { addr, handle }
    }

    /// Greet with protocol 3, then answer every command with `handler`
    /// until the client disconnects. `Err` values are sent as error objects.
    pub fn serve<F>(mut handler: F) -> Self
    where
        F: FnMut(&Received) -> Result<Value, Value> + Send + 'static,
    {
        Self::spawn(move |stream| {
            write_frame(stream, GREETING.as_bytes()).unwrap();
            let mut received = Vec::new();
            while let Some(command) = try_read_command(stream) {
                let reply = match handler(&command) {
                    Ok(value) => json!([1, command.id, null, value]),
                    Err(error) => json!([1, command.id, error, null]),
                };
                send_json(stream, &reply);
                received.push(command);
            }
            received
        })
    }

    /// Wait for the server thread and return the commands it saw
    pub fn join(self) -> Vec<Received> {
        self.handle.join().unwrap()
    }
}

pub fn send_json(stream: &mut TcpStream, value: &Value) {
    write_frame(stream, value.to_string().as_bytes()).unwrap();
}

pub fn send_raw(stream: &mut TcpStream, bytes: &[u8]) {
    stream.write_all(bytes).unwrap();
    stream.flush().unwrap();
}

/// Read one command frame, or None once the client has gone away
pub fn try_read_command(stream: &mut TcpStream) -> Option<Received> {
    let payload = read_frame(stream).ok()?;
    let tuple: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(tuple[0], json!(0), "command frames are tagged 0");
    Some(Received {
        id: tuple[1].as_u64().unwrap(),
        name: tuple[2].as_str().unwrap().to_string(),
        params: tuple[3].clone(),
    })
}

pub fn read_command(stream: &mut TcpStream) -> Received {
    try_read_command(stream).expect("client closed before sending a command")
}

/// An address nothing is listening on
pub fn closed_port_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}
