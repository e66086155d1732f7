//! Client network loop: one task owning the socket, stdin and the view.
//!
//! Receiving and presenting both happen on the same `select!` loop, so
//! there is no shared drawable state to race on.

use crate::game::ClientGameState;
use log::{error, info, warn};
use shared::{
    decode_server_packet, encode_challenge, encode_create_room, encode_join, encode_move,
    encode_quit, ServerEvent, BUFFER_SIZE, CELL_COUNT,
};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    state: ClientGameState,
}

impl Client {
    pub async fn new(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            state: ClientGameState::new(),
        })
    }

    /// Runs until the user quits or stdin closes. An optional name sends
    /// the join immediately instead of waiting for a typed command.
    pub async fn run(&mut self, name: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(name) = name {
            self.send_join(&name).await;
        }
        print_help();

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        None => break,
                        Some(line) => {
                            if self.handle_command(line.trim()).await {
                                break;
                            }
                        }
                    }
                }
                received = self.socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((len, from)) => self.handle_packet(&buffer[..len], from),
                        Err(error) => error!("error receiving packet: {error}"),
                    }
                }
            }
        }

        Ok(())
    }

    /// Parses one typed line and forwards the intent. Returns true when
    /// the session is over.
    async fn handle_command(&mut self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        let verb = match words.next() {
            None => return false,
            Some(verb) => verb,
        };

        match (verb, words.next()) {
            ("join", Some(name)) => self.send_join(name).await,
            ("join", None) => println!("usage: join <name>"),
            ("create", _) => self.send(&encode_create_room(0)).await,
            ("challenge", Some(id)) => match id.parse::<u32>() {
                Ok(room_id) => self.send(&encode_challenge(0, room_id)).await,
                Err(_) => println!("usage: challenge <room id>"),
            },
            ("challenge", None) => println!("usage: challenge <room id>"),
            ("move", Some(cell)) => match cell.parse::<usize>() {
                Ok(cell) if cell < CELL_COUNT => self.send(&encode_move(0, cell)).await,
                _ => println!("usage: move <cell 0-8>"),
            },
            ("move", None) => println!("usage: move <cell 0-8>"),
            ("quit", _) => {
                self.send(&encode_quit(0)).await;
                info!("left the server");
                return true;
            }
            ("rooms", _) => self.print_rooms(),
            ("board", _) => println!("{}", self.state.render_board()),
            ("help", _) => print_help(),
            _ => println!("unknown command, try \"help\""),
        }

        false
    }

    fn handle_packet(&mut self, buffer: &[u8], from: SocketAddr) {
        if from != self.server_addr {
            warn!("ignoring packet from unexpected peer {from}");
            return;
        }

        let event = match decode_server_packet(buffer) {
            Ok((_, event)) => event,
            Err(error) => {
                warn!("dropping {}-byte packet: {}", buffer.len(), error);
                return;
            }
        };

        self.state.apply(&event);
        match event {
            ServerEvent::AnnounceRoom { room_id } => {
                println!("room {room_id} is open for challenge");
            }
            ServerEvent::StartGame => {
                println!("game started!");
                println!("{}", self.state.render_board());
            }
            ServerEvent::UpdateField { .. } => {
                println!("{}", self.state.render_board());
            }
            ServerEvent::ResetClient => {
                println!("returned to the lobby");
            }
        }
    }

    async fn send_join(&self, name: &str) {
        match encode_join(0, name) {
            Ok(packet) => self.send(&packet).await,
            Err(error) => println!("{error}"),
        }
    }

    async fn send(&self, packet: &[u8]) {
        if let Err(error) = self.socket.send_to(packet, self.server_addr).await {
            error!("failed to send packet: {error}");
        }
    }

    fn print_rooms(&self) {
        let rooms: Vec<u32> = self.state.open_rooms().collect();
        if rooms.is_empty() {
            println!("no rooms announced yet");
        } else {
            for room_id in rooms {
                println!("room {room_id} is open for challenge");
            }
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  join <name>       join the server (name up to 20 bytes)");
    println!("  create            open a room and wait for a challenger");
    println!("  challenge <id>    take the empty seat of an open room");
    println!("  move <cell>       claim a cell, numbered 0-8 row by row");
    println!("  rooms             list rooms announced as open");
    println!("  board             redraw the board");
    println!("  quit              leave the server");
}
