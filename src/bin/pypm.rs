//! Thin client example binary: `pypm <host:port> <verb> [args...]`. Not a
//! polished CLI — a minimal exerciser for the `Client` library.

use std::net::SocketAddr;

use pypm::client::Client;
use pypm::wire::Frame;

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let Some(addr_arg) = args.next() else {
        eprintln!("usage: pypm <host:port> <verb> [args...]");
        std::process::exit(2);
    };

    let addr: SocketAddr = match addr_arg.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid address '{}': {}", addr_arg, e);
            std::process::exit(2);
        }
    };

    let Some(verb) = args.next() else {
        eprintln!("usage: pypm <host:port> <verb> [args...]");
        std::process::exit(2);
    };

    let rest: Vec<String> = args.collect();
    let line = std::iter::once(verb).chain(rest).collect::<Vec<_>>().join(" ");

    let client = Client::new(addr);
    match client.request(&line).await {
        Ok(Frame::Msg(msg)) => println!("{}", msg),
        Ok(Frame::Data(payload)) => {
            println!("<{} bytes of data>", payload.len());
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
